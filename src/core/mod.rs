//! # Core Application Logic
//!
//! Session logic for chat review. It knows nothing about any specific UI
//! technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (session data) │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Frame envelopes      │
//!                    │                         │
//!                    │  No I/O. No UI.         │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  Review    │      │  Task API  │
//!     │  Adapter   │      │  frames    │      │  (task/)   │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, one chat-review session
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`annotation`]: Per-message judgments and the gating policy
//! - [`stream`]: Turning messages into renderable views
//! - [`regenerate`], [`composer`]: Small state machines for the last message
//!   and the outgoing text
//! - [`statements`]: Documents retrieved for the latest message
//! - [`frame`], [`review`], [`size`]: The cross-frame envelope channel
//! - [`config`]: Layered configuration

pub mod action;
pub mod annotation;
pub mod composer;
pub mod config;
pub mod frame;
pub mod regenerate;
pub mod review;
pub mod size;
pub mod state;
pub mod statements;
pub mod stream;
