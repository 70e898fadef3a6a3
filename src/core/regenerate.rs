//! # Regeneration Controller
//!
//! One-shot "replace this answer" control attached to the last agent message.
//!
//! ```text
//! Active ──fire()──▶ Disabled ──fail()──▶ Active
//!                       │
//!                       └──succeed()──▶ Disabled until the replacement arrives
//! ```
//!
//! The control is disabled synchronously in `fire()`, before any request is
//! spawned, so a second press while the first is in flight does nothing.
//! While a request is in flight the session also refuses to send, so the
//! message a replacement targets is still the last one when it lands.

use std::fmt;

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegenerateState {
    #[default]
    Active,
    /// Request in flight (or succeeded and waiting to be superseded).
    Disabled,
}

/// Preset reasons offered next to the free-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackReason {
    Understanding,
    Helpfulness,
    Relevance,
}

impl FeedbackReason {
    pub const ALL: [FeedbackReason; 3] = [
        FeedbackReason::Understanding,
        FeedbackReason::Helpfulness,
        FeedbackReason::Relevance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeedbackReason::Understanding => "Understanding",
            FeedbackReason::Helpfulness => "Helpfulness",
            FeedbackReason::Relevance => "Relevance",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            FeedbackReason::Understanding => "This message was informative or enlightening.",
            FeedbackReason::Helpfulness => "This message was helpful.",
            FeedbackReason::Relevance => "This message was relevant to my query.",
        }
    }
}

impl fmt::Display for FeedbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A regenerate request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateRequest {
    /// Render key of the message being replaced.
    pub target: String,
    pub reason: String,
}

/// Where the controller is in its request cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    /// Request sent, no outcome yet. `replaced` once the replacement arrived.
    InFlight { target: String, replaced: bool },
    /// Server accepted the request; the replacement has not arrived.
    Accepted { target: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationController {
    phase: Phase,
    /// Render key of the message this controller is attached to.
    target: Option<String>,
}

impl RegenerationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RegenerateState {
        match self.phase {
            Phase::Idle => RegenerateState::Active,
            Phase::InFlight { .. } | Phase::Accepted { .. } => RegenerateState::Disabled,
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// A request has been fired and its outcome is still unknown.
    pub fn in_flight(&self) -> bool {
        matches!(self.phase, Phase::InFlight { .. })
    }

    /// Render key of the message a replacement is expected for, if any.
    pub fn awaiting(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::InFlight { target, .. } | Phase::Accepted { target } => Some(target),
        }
    }

    /// Point the controller at the current last message. A different message
    /// than before supersedes an accepted request, so the control re-arms.
    /// A request still in flight keeps the control disabled.
    pub fn attach(&mut self, key: Option<String>) {
        if self.target != key {
            self.target = key;
            if matches!(self.phase, Phase::Accepted { .. }) {
                self.phase = Phase::Idle;
            }
        }
    }

    /// The replacement for the awaited message arrived, whatever its key.
    pub fn superseded(&mut self) {
        if let Phase::InFlight { replaced, .. } = &mut self.phase {
            *replaced = true;
        } else {
            self.phase = Phase::Idle;
        }
    }

    /// Disable and return the request to issue, or `None` if already in
    /// flight or not attached to any message.
    pub fn fire(&mut self, reason: impl Into<String>) -> Option<RegenerateRequest> {
        if self.phase != Phase::Idle {
            info!("Regenerate ignored: request already in flight");
            return None;
        }
        let target = self.target.clone()?;
        self.phase = Phase::InFlight {
            target: target.clone(),
            replaced: false,
        };
        let reason = reason.into();
        info!("Regenerate requested for {} (reason: {:?})", target, reason);
        Some(RegenerateRequest { target, reason })
    }

    pub fn fail(&mut self, error: &str) {
        warn!("Regeneration failed: {}", error);
        self.phase = Phase::Idle;
    }

    /// Re-arms if the replacement already arrived; otherwise stays disabled
    /// until it does.
    pub fn succeed(&mut self) {
        match std::mem::take(&mut self.phase) {
            Phase::InFlight { replaced: true, .. } => {
                info!("Regeneration complete");
            }
            Phase::InFlight { target, replaced: false } => {
                info!("Regeneration accepted, waiting for replacement of {}", target);
                self.phase = Phase::Accepted { target };
            }
            other => self.phase = other,
        }
    }
}
