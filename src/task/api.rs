use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::types::{LiveUpdate, OutboundMessage, StreamUpdate};

/// Errors from the task server collaborator.
/// Every variant is recoverable: the UI re-arms its controls and the worker may retry.
#[derive(Debug)]
pub enum TaskApiError {
    /// Endpoint misconfigured (bad URL). Not retryable until fixed.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Server answered with a non-success status.
    Api { status: u16, message: String },
    /// Server response could not be parsed.
    Parse(String),
    /// The server (or local agent) declined the request.
    Rejected(String),
    /// The session dropped the update receiver.
    ChannelClosed,
}

impl fmt::Display for TaskApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskApiError::Config(msg) => write!(f, "config error: {msg}"),
            TaskApiError::Network(msg) => write!(f, "network error: {msg}"),
            TaskApiError::Api { status, message } => {
                write!(f, "task server error (HTTP {status}): {message}")
            }
            TaskApiError::Parse(msg) => write!(f, "parse error: {msg}"),
            TaskApiError::Rejected(msg) => write!(f, "rejected: {msg}"),
            TaskApiError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TaskApiError {}

/// The two async contracts the chat session depends on.
///
/// Both resolve once the request is accepted (or rejected). Any messages the
/// server produces in response are pushed through `updates`.
#[async_trait]
pub trait TaskApi: Send + Sync {
    fn name(&self) -> &str;

    async fn on_message_send(
        &self,
        message: OutboundMessage,
        updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError>;

    async fn send_live_update(
        &self,
        update: LiveUpdate,
        updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError>;
}
