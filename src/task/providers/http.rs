//! Task server client over plain JSON HTTP.
//!
//! - `POST {base}/message` with an [`OutboundMessage`] body
//! - `POST {base}/live_update` with a [`LiveUpdate`] body
//!
//! A 2xx response may carry `{"messages": [...]}`; those messages are pushed
//! into the session's update channel (appended for sends, replacing the last
//! message for regenerations). An empty body is a plain acknowledgement.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc::Sender;

use crate::task::{LiveUpdate, Message, OutboundMessage, StreamUpdate, TaskApi, TaskApiError};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize, Debug, Default)]
struct TaskResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

pub struct HttpTaskApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TaskApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TaskApiError::Config(format!(
                "task endpoint must be an http(s) URL, got '{}'",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TaskApiError::Config(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    async fn post<T: serde::Serialize + Sync>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<TaskResponse, TaskApiError> {
        let url = format!("{}/{}", self.base_url, route);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TaskApiError::Network(e.to_string()))?;

        debug!("Task server {} status: {}", route, response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Task server error on {}: {} - {}", route, status, message);
            return Err(TaskApiError::Api { status, message });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TaskApiError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(TaskResponse::default());
        }
        serde_json::from_str(&text).map_err(|e| TaskApiError::Parse(e.to_string()))
    }
}

async fn forward(
    messages: Vec<Message>,
    updates: &Sender<StreamUpdate>,
    wrap: fn(Message) -> StreamUpdate,
) -> Result<(), TaskApiError> {
    for message in messages {
        updates
            .send(wrap(message))
            .await
            .map_err(|_| TaskApiError::ChannelClosed)?;
    }
    Ok(())
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    fn name(&self) -> &str {
        "http"
    }

    async fn on_message_send(
        &self,
        message: OutboundMessage,
        updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError> {
        info!("Sending message to task server ({} chars)", message.text.len());
        let response = self.post("message", &message).await?;
        debug!("Task server returned {} messages", response.messages.len());
        forward(response.messages, &updates, StreamUpdate::Append).await
    }

    async fn send_live_update(
        &self,
        update: LiveUpdate,
        updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError> {
        info!(
            "Requesting regeneration of update_id={} (reason: {:?})",
            update.update_id, update.reason
        );
        let response = self.post("live_update", &update).await?;
        forward(response.messages, &updates, StreamUpdate::ReplaceLast).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_endpoint() {
        let result = HttpTaskApi::new("ftp://example.com", DEFAULT_REQUEST_TIMEOUT);
        assert!(matches!(result, Err(TaskApiError::Config(_))));
    }

    #[test]
    fn trims_trailing_slash() {
        let api = HttpTaskApi::new("http://localhost:3000/", DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(api.base_url, "http://localhost:3000");
    }
}
