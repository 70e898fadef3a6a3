//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

use crate::core::annotation::GatingPolicy;
use crate::core::state::App;
use crate::core::stream::AgentContext;
use crate::task::{LiveUpdate, OutboundMessage, StreamUpdate, TaskApi, TaskApiError};

/// A task API that accepts everything and never answers.
pub struct NoopTaskApi;

#[async_trait]
impl TaskApi for NoopTaskApi {
    fn name(&self) -> &str {
        "noop"
    }

    async fn on_message_send(
        &self,
        _message: OutboundMessage,
        _updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError> {
        Ok(())
    }

    async fn send_live_update(
        &self,
        _update: LiveUpdate,
        _updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError> {
        Ok(())
    }
}

/// Creates a test App for agent `worker` with the default gating policy.
pub fn test_app() -> App {
    App::new(
        Arc::new(NoopTaskApi),
        AgentContext::new("worker"),
        GatingPolicy::PreviousMessage,
    )
}
