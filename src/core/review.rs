//! # Review Data Loader
//!
//! Both ends of the review-frame relationship:
//!
//! - [`ReviewLoader`] lives in the child. It waits for one `REVIEW_DATA`
//!   envelope and hands the payload to the renderer. Nothing is sent back.
//! - [`ParentFrame`] lives in the host. It owns the canonical payload, posts it
//!   to the child and keeps the most recent height the child reported.
//!
//! ```text
//! AwaitingData ──REVIEW_DATA──▶ Loaded ──REVIEW_DATA──▶ Loaded (replaced)
//! ```

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::frame::{Envelope, FrameError, FrameMessenger, SizeReport};

/// Task inputs and worker outputs, both opaque to this crate.
///
/// Missing fields decode as JSON `null`; shape problems only show up as gaps
/// in the rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub inputs: serde_json::Value,
    #[serde(default)]
    pub outputs: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReviewLoader {
    #[default]
    AwaitingData,
    Loaded(ReviewPayload),
}

impl ReviewLoader {
    pub fn new() -> Self {
        Self::AwaitingData
    }

    /// Apply an incoming envelope. Returns true if the rendered data changed.
    pub fn apply(&mut self, envelope: Envelope) -> bool {
        match envelope {
            Envelope::ReviewData(payload) => {
                if matches!(self, ReviewLoader::Loaded(_)) {
                    info!("Replacing previously loaded review data");
                } else {
                    info!("Review data loaded");
                }
                *self = ReviewLoader::Loaded(payload);
                true
            }
            Envelope::IframeData(report) => {
                debug!("Child ignoring IFRAME_DATA (height={})", report.height);
                false
            }
        }
    }

    pub fn payload(&self) -> Option<&ReviewPayload> {
        match self {
            ReviewLoader::AwaitingData => None,
            ReviewLoader::Loaded(payload) => Some(payload),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ReviewLoader::Loaded(_))
    }
}

/// Host-side view of an embedded review frame.
pub struct ParentFrame {
    messenger: FrameMessenger,
    payload: ReviewPayload,
    child_height: Option<u32>,
}

impl ParentFrame {
    pub fn new(messenger: FrameMessenger, payload: ReviewPayload) -> Self {
        Self {
            messenger,
            payload,
            child_height: None,
        }
    }

    /// Post the canonical payload to the child.
    pub fn open(&self) -> Result<(), FrameError> {
        self.messenger
            .send(&Envelope::ReviewData(self.payload.clone()))
    }

    /// Apply an envelope from the child. Heights are re-applied as-is, so
    /// redundant reports are harmless.
    pub fn apply(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::IframeData(SizeReport { height }) => {
                if self.child_height != Some(height) {
                    debug!("Child frame height now {}", height);
                }
                self.child_height = Some(height);
            }
            Envelope::ReviewData(_) => {
                warn!("Parent received REVIEW_DATA from child; ignoring");
            }
        }
    }

    pub fn child_height(&self) -> Option<u32> {
        self.child_height
    }

    pub fn payload(&self) -> &ReviewPayload {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame;
    use serde_json::json;

    fn payload(tag: &str) -> ReviewPayload {
        ReviewPayload {
            inputs: json!({"prompt": tag}),
            outputs: json!({"answer": tag}),
        }
    }

    #[test]
    fn loader_starts_awaiting() {
        let loader = ReviewLoader::new();
        assert!(!loader.is_loaded());
        assert!(loader.payload().is_none());
    }

    #[test]
    fn second_payload_replaces_first() {
        let mut loader = ReviewLoader::new();
        assert!(loader.apply(Envelope::ReviewData(payload("first"))));
        assert!(loader.apply(Envelope::ReviewData(payload("second"))));
        assert_eq!(loader.payload(), Some(&payload("second")));
    }

    #[test]
    fn loader_ignores_size_reports() {
        let mut loader = ReviewLoader::new();
        assert!(!loader.apply(Envelope::IframeData(SizeReport { height: 10 })));
        assert!(!loader.is_loaded());
    }

    #[test]
    fn parent_open_reaches_child() {
        let (parent_end, mut child_end) = frame::channel();
        let parent = ParentFrame::new(parent_end.messenger, payload("task-1"));
        parent.open().unwrap();

        let mut loader = ReviewLoader::new();
        for envelope in child_end.inbox.drain() {
            loader.apply(envelope);
        }
        assert_eq!(loader.payload(), Some(&payload("task-1")));
    }

    #[test]
    fn parent_keeps_latest_height() {
        let (parent_end, _child_end) = frame::channel();
        let mut parent = ParentFrame::new(parent_end.messenger, payload("p"));
        assert_eq!(parent.child_height(), None);
        parent.apply(Envelope::IframeData(SizeReport { height: 40 }));
        parent.apply(Envelope::IframeData(SizeReport { height: 40 }));
        parent.apply(Envelope::IframeData(SizeReport { height: 55 }));
        assert_eq!(parent.child_height(), Some(55));
    }

    #[test]
    fn parent_ignores_review_data_echo() {
        let (parent_end, _child_end) = frame::channel();
        let mut parent = ParentFrame::new(parent_end.messenger, payload("p"));
        parent.apply(Envelope::ReviewData(payload("other")));
        assert_eq!(parent.payload(), &payload("p"));
        assert_eq!(parent.child_height(), None);
    }
}
