//! # Message Stream
//!
//! Derives per-message views from the ordered message sequence. The
//! renderer (TUI or otherwise) draws [`MessageView`]s and never inspects
//! the raw stream or the annotation map directly.
//!
//! Two facts are derived independently for every message and combined by one
//! rule:
//!
//! - `is_last`: `index == len - 1`
//! - `gate_open`: the [`GatingPolicy`] check at `index`
//!
//! Only the last message gets [`Controls`]; whether they can be used is the
//! gate.

use std::collections::HashMap;

use crate::core::annotation::{AnnotationStore, GatingPolicy};
use crate::core::regenerate::RegenerateState;
use crate::task::Message;

/// Who "we" are in the conversation.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub agent_id: String,
    /// Known agent ids mapped to display names. Every id listed here belongs
    /// to the worker's side of the conversation.
    pub agent_names: HashMap<String, String>,
}

impl AgentContext {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_names: HashMap::new(),
        }
    }

    pub fn with_name(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.agent_names.insert(id.into(), name.into());
        self
    }

    pub fn is_self(&self, sender: &str) -> bool {
        sender == self.agent_id || self.agent_names.contains_key(sender)
    }

    pub fn display_name<'a>(&'a self, sender: &'a str) -> &'a str {
        self.agent_names
            .get(sender)
            .map(String::as_str)
            .unwrap_or(sender)
    }
}

/// Whether the worker is asked to judge this message.
pub fn needs_annotation(message: &Message, agents: &AgentContext) -> bool {
    !message.text.is_empty() && !agents.is_self(&message.id)
}

/// Whether acting at `position` (an index, or `len` for a new message) is allowed.
pub fn gate_open(
    messages: &[Message],
    position: usize,
    store: &AnnotationStore,
    policy: GatingPolicy,
    agents: &AgentContext,
) -> bool {
    policy.gate_open(position, store, |i| {
        messages
            .get(i)
            .is_some_and(|m| needs_annotation(m, agents))
    })
}

/// Interactive affordances attached to the last message.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    /// Show the annotation prompt (agent messages only).
    pub annotation_prompt: bool,
    /// Regenerate state (agent messages only).
    pub regenerate: Option<RegenerateState>,
    /// Earlier messages are judged as the policy requires.
    pub gate_open: bool,
    /// Current annotation for this message, if any.
    pub annotation: Option<Option<String>>,
}

impl Controls {
    pub fn actionable(&self) -> bool {
        self.gate_open
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageView<'a> {
    pub index: usize,
    pub key: String,
    pub is_self: bool,
    pub display_name: &'a str,
    pub text: &'a str,
    pub is_last: bool,
    /// Annotation recorded for this message (shown read-only on older messages).
    pub annotation: Option<Option<&'a str>>,
    pub controls: Option<Controls>,
}

pub struct StreamProps<'a> {
    pub messages: &'a [Message],
    pub agents: &'a AgentContext,
    pub annotations: &'a AnnotationStore,
    pub policy: GatingPolicy,
    /// Regenerate state of the last message's controller.
    pub regenerate: RegenerateState,
}

/// Build views for every visible message. Empty-text messages produce none.
pub fn render_stream<'a>(props: &StreamProps<'a>) -> Vec<MessageView<'a>> {
    let len = props.messages.len();
    props
        .messages
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.text.is_empty())
        .map(|(index, message)| {
            let is_self = props.agents.is_self(&message.id);
            let is_last = index + 1 == len;
            let controls = is_last.then(|| Controls {
                annotation_prompt: !is_self,
                regenerate: (!is_self).then_some(props.regenerate),
                gate_open: gate_open(
                    props.messages,
                    index,
                    props.annotations,
                    props.policy,
                    props.agents,
                ),
                annotation: props
                    .annotations
                    .get(index)
                    .map(|v| v.map(str::to_string)),
            });
            MessageView {
                index,
                key: message.render_key(index),
                is_self,
                display_name: props.agents.display_name(&message.id),
                text: &message.text,
                is_last,
                annotation: props.annotations.get(index),
                controls,
            }
        })
        .collect()
}
