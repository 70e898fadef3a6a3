//! # Frame Messenger
//!
//! Carries JSON envelopes across the boundary between a host (parent) and
//! the task frame it embeds (child). Every logical event is exactly one
//! stringified envelope; the receiving side validates the tag before anything
//! else sees the payload.
//!
//! ```text
//!   parent                                   child
//!   ┌──────────────┐   {"REVIEW_DATA":..}    ┌──────────────┐
//!   │ FrameEndpoint│ ──────────────────────▶ │ FrameEndpoint│
//!   │   (Inbox)    │ ◀────────────────────── │   (Inbox)    │
//!   └──────────────┘   {"IFRAME_DATA":..}    └──────────────┘
//! ```
//!
//! The transport is a [`FramePort`]. [`channel`] wires two endpoints together
//! in-process over unbounded tokio channels (FIFO per direction).

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize, de};
use serde_json::{Map, Value};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::core::review::ReviewPayload;

/// Rendered height reported by a child frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeReport {
    pub height: u32,
}

/// The only two shapes allowed across the frame boundary.
///
/// Serialized externally tagged, so the wire form is a single top-level key:
/// `{"REVIEW_DATA": {...}}` or `{"IFRAME_DATA": {"height": 120}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope {
    #[serde(rename = "REVIEW_DATA")]
    ReviewData(ReviewPayload),
    #[serde(rename = "IFRAME_DATA")]
    IframeData(SizeReport),
}

const REVIEW_DATA_TAG: &str = "REVIEW_DATA";
const IFRAME_DATA_TAG: &str = "IFRAME_DATA";

impl Envelope {
    pub fn tag(&self) -> &'static str {
        match self {
            Envelope::ReviewData(_) => REVIEW_DATA_TAG,
            Envelope::IframeData(_) => IFRAME_DATA_TAG,
        }
    }
}

#[derive(Debug)]
pub enum FrameError {
    /// Envelope could not be serialized.
    Encode(serde_json::Error),
    /// Incoming data was not valid JSON or carried an unknown tag.
    Decode(serde_json::Error),
    /// The other side of the port is gone.
    Closed,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Encode(e) => write!(f, "envelope encode error: {e}"),
            FrameError::Decode(e) => write!(f, "envelope decode error: {e}"),
            FrameError::Closed => write!(f, "frame port closed"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Serialize an envelope to its wire string.
pub fn encode(envelope: &Envelope) -> Result<String, FrameError> {
    serde_json::to_string(envelope).map_err(FrameError::Encode)
}

/// Parse a wire string into an envelope.
///
/// The data must be a JSON object carrying one of the known tags. Other keys
/// next to the tag are ignored, so a sender may attach extra fields. If both
/// tags are present, `REVIEW_DATA` wins.
pub fn decode(raw: &str) -> Result<Envelope, FrameError> {
    let mut object: Map<String, Value> = serde_json::from_str(raw).map_err(FrameError::Decode)?;
    let (tag, payload) = [REVIEW_DATA_TAG, IFRAME_DATA_TAG]
        .into_iter()
        .find_map(|tag| object.remove(tag).map(|payload| (tag, payload)))
        .ok_or_else(|| {
            FrameError::Decode(<serde_json::Error as de::Error>::custom("no known envelope tag"))
        })?;
    if !object.is_empty() {
        debug!("Ignoring {} extra keys beside {}", object.len(), tag);
    }
    let tagged = Map::from_iter([(tag.to_string(), payload)]);
    serde_json::from_value(Value::Object(tagged)).map_err(FrameError::Decode)
}

/// Something a frame can post a string to (the other window).
pub trait FramePort: Send + Sync {
    fn post_message(&self, data: String) -> Result<(), FrameError>;
}

/// [`FramePort`] backed by an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelPort {
    tx: UnboundedSender<String>,
}

impl FramePort for ChannelPort {
    fn post_message(&self, data: String) -> Result<(), FrameError> {
        self.tx.send(data).map_err(|_| FrameError::Closed)
    }
}

/// Outbound half: encodes and posts envelopes.
pub struct FrameMessenger {
    port: Box<dyn FramePort>,
}

impl FrameMessenger {
    pub fn new(port: Box<dyn FramePort>) -> Self {
        Self { port }
    }

    pub fn send(&self, envelope: &Envelope) -> Result<(), FrameError> {
        let data = encode(envelope)?;
        debug!("Posting {} envelope ({} bytes)", envelope.tag(), data.len());
        self.port.post_message(data)
    }
}

/// Inbound half: the single listener of a frame.
///
/// Whoever holds the `Inbox` is the registered listener. Dropping it (when
/// the hosting component unmounts) closes the receiving side, after which
/// posts from the other frame fail with [`FrameError::Closed`].
pub struct Inbox {
    rx: UnboundedReceiver<String>,
}

impl Inbox {
    /// Drain everything currently queued, in arrival order.
    /// Malformed payloads are logged and skipped.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut envelopes = Vec::new();
        while let Ok(raw) = self.rx.try_recv() {
            if let Some(envelope) = accept(&raw) {
                envelopes.push(envelope);
            }
        }
        envelopes
    }

    /// Wait for the next well-formed envelope. `None` once the port closed.
    pub async fn next(&mut self) -> Option<Envelope> {
        while let Some(raw) = self.rx.recv().await {
            if let Some(envelope) = accept(&raw) {
                return Some(envelope);
            }
        }
        None
    }
}

fn accept(raw: &str) -> Option<Envelope> {
    match decode(raw) {
        Ok(envelope) => {
            debug!("Received {} envelope", envelope.tag());
            Some(envelope)
        }
        Err(e) => {
            warn!("Dropping malformed frame message: {}", e);
            None
        }
    }
}

/// One side of a frame boundary.
pub struct FrameEndpoint {
    pub messenger: FrameMessenger,
    pub inbox: Inbox,
}

/// Create a connected (parent, child) pair of endpoints.
pub fn channel() -> (FrameEndpoint, FrameEndpoint) {
    let (to_child, child_rx) = unbounded_channel();
    let (to_parent, parent_rx) = unbounded_channel();

    let parent = FrameEndpoint {
        messenger: FrameMessenger::new(Box::new(ChannelPort { tx: to_child })),
        inbox: Inbox { rx: parent_rx },
    };
    let child = FrameEndpoint {
        messenger: FrameMessenger::new(Box::new(ChannelPort { tx: to_parent })),
        inbox: Inbox { rx: child_rx },
    };
    (parent, child)
}
