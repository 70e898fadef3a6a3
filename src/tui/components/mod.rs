//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Receive everything they draw as props:
//! - `TitleBar`: Top status line
//! - `MessageBubble`: One chat message
//! - `StatementPane`: Retrieved documents for the latest message
//! - `ReviewView`: Host page with the embedded task frame
//!
//! ### Stateful Components (Event-Driven)
//!
//! Keep presentation state between frames and emit high-level events:
//! - `InputBox`: Mirror of the composer text
//! - `MessageList`: Scrollable conversation with a height cache
//! - `ControlsBar`: Annotation options and the regenerate prompt
//!
//! Components get their data as props, never by reaching into `App`:
//!
//! ```rust,ignore
//! // Dependencies are explicit
//! StatementPane { documents: app.statements.documents() }.render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs            (this file)
//! ├── title_bar.rs      (Top status line)
//! ├── message.rs        (Single message bubble)
//! ├── message_list.rs   (Scrollable message container)
//! ├── controls.rs       (Annotation + regenerate controls)
//! ├── statement_pane.rs (Retrieved documents)
//! ├── review_view.rs    (Review frame screen)
//! └── input_box/        (Composer text entry)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod controls;
pub mod input_box;
pub mod message;
pub mod message_list;
pub mod review_view;
pub mod statement_pane;

pub use controls::{ControlEvent, ControlsBar, ControlsState};
pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use review_view::ReviewView;
pub use statement_pane::StatementPane;
