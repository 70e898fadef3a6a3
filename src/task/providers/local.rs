//! Offline scripted agent.
//!
//! Stands in for the task server when no endpoint is configured. Every worker
//! message gets a reply with a few retrieved documents attached; regenerate
//! requests get an alternative phrasing of the same reply. After
//! `max_turns` replies the agent marks the task done.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde_json::{Value, json};
use tokio::sync::mpsc::Sender;

use crate::task::{
    LiveUpdate, Message, OutboundMessage, RETRIEVED_DOCUMENTS_KEY, StreamUpdate, TASK_DONE_KEY,
    TaskApi, TaskApiError,
};

pub const LOCAL_AGENT_ID: &str = "model";

const PHRASINGS: &[&str] = &[
    "Here is what I found about",
    "Based on the retrieved sources, a short answer on",
    "Let me try again. Summarizing the documents about",
];

pub struct LocalAgent {
    reply_delay: Duration,
    max_turns: u32,
    next_update_id: AtomicU64,
    turns: AtomicU64,
    /// Last worker text, reused when regenerating.
    last_prompt: Mutex<String>,
    regenerations: AtomicU64,
}

impl LocalAgent {
    pub fn new(reply_delay: Duration, max_turns: u32) -> Self {
        Self {
            reply_delay,
            max_turns,
            next_update_id: AtomicU64::new(1_000),
            turns: AtomicU64::new(0),
            last_prompt: Mutex::new(String::new()),
            regenerations: AtomicU64::new(0),
        }
    }

    /// Opening message shown before the worker types anything.
    pub fn greeting(&self) -> Message {
        Message::new(
            LOCAL_AGENT_ID,
            self.next_update_id.fetch_add(1, Ordering::Relaxed),
            "Hi! Ask me anything. Please rate each of my answers before replying.",
        )
    }

    fn reply(&self, prompt: &str, phrasing: usize, final_turn: bool) -> Message {
        let topic = prompt.trim();
        let text = format!("{} \"{}\".", PHRASINGS[phrasing % PHRASINGS.len()], topic);
        let mut message = Message::new(
            LOCAL_AGENT_ID,
            self.next_update_id.fetch_add(1, Ordering::Relaxed),
            text,
        )
        .with_task_data(RETRIEVED_DOCUMENTS_KEY, sample_documents(topic));
        if final_turn {
            message = message.with_task_data(TASK_DONE_KEY, Value::Bool(true));
        }
        message
    }

    fn remember(&self, prompt: &str) {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = prompt.to_string();
        }
    }

    fn last_prompt(&self) -> String {
        self.last_prompt
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

fn sample_documents(topic: &str) -> Value {
    let words: Vec<&str> = topic.split_whitespace().take(3).collect();
    let documents: Vec<Value> = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            json!({
                "id": i + 1,
                "title": format!("On {}", word),
                "text": format!("Reference material mentioning '{}'.", word),
                "score": 1.0 / (i as f64 + 1.0),
                "source": format!("https://example.org/docs/{}", word.to_lowercase()),
            })
        })
        .collect();
    Value::Array(documents)
}

#[async_trait]
impl TaskApi for LocalAgent {
    fn name(&self) -> &str {
        "local"
    }

    async fn on_message_send(
        &self,
        message: OutboundMessage,
        updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError> {
        if message.text.trim().is_empty() {
            return Err(TaskApiError::Rejected("empty message".into()));
        }
        self.remember(&message.text);
        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let final_turn = turn >= u64::from(self.max_turns);
        info!("Local agent replying (turn {}, final={})", turn, final_turn);

        tokio::time::sleep(self.reply_delay).await;
        let reply = self.reply(&message.text, 0, final_turn);
        updates
            .send(StreamUpdate::Append(reply))
            .await
            .map_err(|_| TaskApiError::ChannelClosed)
    }

    async fn send_live_update(
        &self,
        update: LiveUpdate,
        updates: Sender<StreamUpdate>,
    ) -> Result<(), TaskApiError> {
        if !update.regenerate {
            debug!("Local agent ignoring non-regenerate live update");
            return Ok(());
        }
        let prompt = self.last_prompt();
        if prompt.is_empty() {
            return Err(TaskApiError::Rejected(
                "nothing to regenerate yet".into(),
            ));
        }
        let n = self.regenerations.fetch_add(1, Ordering::Relaxed) as usize + 1;
        info!(
            "Local agent regenerating update_id={} (reason: {:?})",
            update.update_id, update.reason
        );

        tokio::time::sleep(self.reply_delay).await;
        let final_turn = self.turns.load(Ordering::Relaxed) >= u64::from(self.max_turns);
        let reply = self.reply(&prompt, n, final_turn);
        updates
            .send(StreamUpdate::ReplaceLast(reply))
            .await
            .map_err(|_| TaskApiError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn agent() -> LocalAgent {
        LocalAgent::new(Duration::ZERO, 2)
    }

    #[tokio::test]
    async fn replies_with_documents() {
        let agent = agent();
        let (tx, mut rx) = mpsc::channel(4);
        agent
            .on_message_send(OutboundMessage::new("rust borrow checker"), tx)
            .await
            .unwrap();
        match rx.recv().await {
            Some(StreamUpdate::Append(m)) => {
                assert_eq!(m.id, LOCAL_AGENT_ID);
                assert!(m.text.contains("rust borrow checker"));
                assert_eq!(m.retrieved_documents().unwrap().as_array().unwrap().len(), 3);
                assert!(m.task_data.get(TASK_DONE_KEY).is_none());
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn regenerate_before_any_message_is_rejected() {
        let agent = agent();
        let (tx, _rx) = mpsc::channel(4);
        let result = agent
            .send_live_update(LiveUpdate::regenerate(1, "Relevance"), tx)
            .await;
        assert!(matches!(result, Err(TaskApiError::Rejected(_))));
    }

    #[tokio::test]
    async fn regenerate_replaces_last() {
        let agent = agent();
        let (tx, mut rx) = mpsc::channel(4);
        agent
            .on_message_send(OutboundMessage::new("weather"), tx.clone())
            .await
            .unwrap();
        let first = rx.recv().await;
        agent
            .send_live_update(LiveUpdate::regenerate(1, "Helpfulness"), tx)
            .await
            .unwrap();
        match (first, rx.recv().await) {
            (Some(StreamUpdate::Append(a)), Some(StreamUpdate::ReplaceLast(b))) => {
                assert_ne!(a.text, b.text);
                assert_ne!(a.update_id, b.update_id);
            }
            other => panic!("unexpected updates: {:?}", other),
        }
    }

    #[tokio::test]
    async fn final_turn_marks_task_done() {
        let agent = agent();
        let (tx, mut rx) = mpsc::channel(4);
        for text in ["one", "two"] {
            agent
                .on_message_send(OutboundMessage::new(text), tx.clone())
                .await
                .unwrap();
        }
        rx.recv().await;
        match rx.recv().await {
            Some(StreamUpdate::Append(m)) => {
                assert_eq!(m.task_data.get(TASK_DONE_KEY), Some(&Value::Bool(true)));
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[test]
    fn empty_message_is_rejected() {
        let agent = agent();
        let (tx, _rx) = mpsc::channel(1);
        let result = tokio_test::block_on(agent.on_message_send(OutboundMessage::new("  "), tx));
        assert!(matches!(result, Err(TaskApiError::Rejected(_))));
    }
}
