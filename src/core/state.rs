//! # Application State
//!
//! Core session state for one chat-review task. No TUI types here;
//! presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── task_api: Arc<dyn TaskApi>        // task server collaborator
//! ├── session_id: String                // log correlation
//! ├── agents: AgentContext              // who "we" are
//! ├── policy: GatingPolicy              // annotation gating rule
//! ├── annotation_options: Vec<String>   // radio choices
//! ├── messages: Vec<Message>            // the conversation stream
//! ├── annotations: AnnotationStore      // written only by update()
//! ├── composer: Composer                // outgoing text
//! ├── regeneration: RegenerationController
//! ├── statements: StatementPane         // retrieved documents
//! ├── input_mode: InputMode             // task-level input availability
//! └── status_message: String            // status bar text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::core::annotation::{AnnotationStore, GatingPolicy};
use crate::core::composer::Composer;
use crate::core::config::ResolvedConfig;
use crate::core::regenerate::RegenerationController;
use crate::core::statements::StatementPane;
use crate::core::stream::{self, AgentContext, MessageView, StreamProps};
use crate::task::{Message, TaskApi};

pub const ANNOTATE_FIRST_HINT: &str = "Please annotate the last message before you can continue";
pub const REGENERATING_HINT: &str = "Waiting for the regenerated message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    ReadyForInput,
    /// Waiting on the other side of the conversation.
    Waiting,
    /// The task is over; only "done" remains.
    Done,
}

pub struct App {
    pub task_api: Arc<dyn TaskApi>,
    pub session_id: String,
    pub agents: AgentContext,
    pub policy: GatingPolicy,
    pub annotation_options: Vec<String>,
    pub messages: Vec<Message>,
    pub(super) annotations: AnnotationStore,
    pub composer: Composer,
    pub regeneration: RegenerationController,
    pub statements: StatementPane,
    pub input_mode: InputMode,
    pub status_message: String,
    /// Update ids handed to the worker's own messages.
    pub(super) next_local_update_id: u64,
}

impl App {
    pub fn new(task_api: Arc<dyn TaskApi>, agents: AgentContext, policy: GatingPolicy) -> Self {
        Self {
            task_api,
            session_id: uuid::Uuid::new_v4().to_string(),
            agents,
            policy,
            annotation_options: Vec::new(),
            messages: Vec::new(),
            annotations: AnnotationStore::new(),
            composer: Composer::new(),
            regeneration: RegenerationController::new(),
            statements: StatementPane::new(),
            input_mode: InputMode::ReadyForInput,
            status_message: String::from("Welcome! Read the task description, then chat."),
            next_local_update_id: 1,
        }
    }

    pub fn from_config(task_api: Arc<dyn TaskApi>, config: &ResolvedConfig) -> Self {
        let agents = AgentContext::new(config.agent_id.clone())
            .with_name(config.agent_id.clone(), config.agent_name.clone());
        let mut app = Self::new(task_api, agents, config.gating);
        app.annotation_options = config.annotation_options.clone();
        app
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn views(&self) -> Vec<MessageView<'_>> {
        stream::render_stream(&StreamProps {
            messages: &self.messages,
            agents: &self.agents,
            annotations: &self.annotations,
            policy: self.policy,
            regenerate: self.regeneration.state(),
        })
    }

    /// Gate for a new message at the end of the stream.
    fn next_message_gate_open(&self) -> bool {
        stream::gate_open(
            &self.messages,
            self.messages.len(),
            &self.annotations,
            self.policy,
            &self.agents,
        )
    }

    pub fn can_send(&self) -> bool {
        self.input_mode == InputMode::ReadyForInput
            && !self.composer.is_sending()
            && !self.regeneration.in_flight()
            && self.next_message_gate_open()
    }

    /// A regenerate request is out and its replacement hasn't landed.
    pub fn regenerating(&self) -> bool {
        self.regeneration.in_flight()
    }

    /// The worker must judge something before sending.
    pub fn annotation_needed(&self) -> bool {
        self.input_mode == InputMode::ReadyForInput && !self.next_message_gate_open()
    }

    /// Annotation of the newest message, if it has one.
    pub fn last_annotation(&self) -> Option<&str> {
        let last = self.messages.len().checked_sub(1)?;
        self.annotations.get(last).flatten()
    }

    pub fn last_message(&self) -> Option<(usize, &Message)> {
        self.messages.iter().enumerate().last()
    }

    /// Whether the last message currently offers a usable regenerate control.
    pub fn can_regenerate(&self) -> bool {
        let Some((index, last)) = self.last_message() else {
            return false;
        };
        !last.text.is_empty()
            && !self.agents.is_self(&last.id)
            && !self.composer.is_sending()
            && stream::gate_open(
                &self.messages,
                index,
                &self.annotations,
                self.policy,
                &self.agents,
            )
    }

    /// Re-derive state that depends on the stream's tail.
    pub(super) fn sync_derived(&mut self) {
        let target = self
            .last_message()
            .filter(|(_, m)| !m.text.is_empty() && !self.agents.is_self(&m.id))
            .map(|(i, m)| m.render_key(i));
        self.regeneration.attach(target);
        self.statements.sync(&self.messages);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert!(app.messages.is_empty());
        assert!(app.annotations().is_empty());
        assert!(app.can_send());
        assert!(!app.annotation_needed());
        assert!(!app.can_regenerate());
        assert_eq!(app.session_id.len(), 36);
    }
}
