use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key in a message's `task_data` that carries retrieved documents.
pub const RETRIEVED_DOCUMENTS_KEY: &str = "retrieved_documents";

/// `task_data` flag the agent sets on its final message.
pub const TASK_DONE_KEY: &str = "task_done";

/// One entry in the conversation stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender's agent id.
    pub id: String,
    #[serde(default)]
    pub update_id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub task_data: Map<String, Value>,
}

impl Message {
    pub fn new(id: impl Into<String>, update_id: u64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            update_id,
            text: text.into(),
            task_data: Map::new(),
        }
    }

    pub fn with_task_data(mut self, key: &str, value: Value) -> Self {
        self.task_data.insert(key.to_string(), value);
        self
    }

    /// Stable key for this message at `index` in the stream.
    pub fn render_key(&self, index: usize) -> String {
        format!("{}-{}", self.update_id, index)
    }

    pub fn retrieved_documents(&self) -> Option<&Value> {
        self.task_data.get(RETRIEVED_DOCUMENTS_KEY)
    }
}

/// A worker message on its way to the task server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(default)]
    pub task_data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            task_data: Map::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Request to replace the last agent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub regenerate: bool,
    pub reason: String,
    /// `update_id` of the message being replaced.
    pub update_id: u64,
    pub timestamp: DateTime<Utc>,
}

impl LiveUpdate {
    pub fn regenerate(update_id: u64, reason: impl Into<String>) -> Self {
        Self {
            regenerate: true,
            reason: reason.into(),
            update_id,
            timestamp: Utc::now(),
        }
    }
}

/// How an incoming message changes the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    Append(Message),
    /// A regenerated message superseding the current last one.
    ReplaceLast(Message),
}
