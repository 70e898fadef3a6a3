//! # InputBox Component
//!
//! Text entry for the worker's next message.
//!
//! The core [`Composer`](crate::core::composer::Composer) owns the text; the
//! box keeps a mirror (`sync` once per tick) and reports edits back as
//! [`InputEvent::Changed`]. Edits are append-only at the end of the buffer.
//!
//! While the composer is gated the hint replaces the title.

mod text_wrap;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use text_wrap::{
    MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width, prev_char_boundary, wrapped_lines,
};

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// New buffer content
    Changed(String),
    /// Enter pressed
    Submit,
}

pub struct InputBox {
    /// Mirror of the composer text
    pub buffer: String,
    /// Shown dimmed in place of an empty buffer (prop)
    pub placeholder: String,
    /// Gate hint; replaces the title when set (prop)
    pub blocked_hint: Option<String>,
    /// Whether keystrokes go here (prop)
    pub focused: bool,
    /// A send is in flight (prop)
    pub sending: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            placeholder: String::from("Type your message…"),
            blocked_hint: None,
            focused: true,
            sending: false,
        }
    }

    pub fn sync(&mut self, text: &str) {
        if self.buffer != text {
            self.buffer = text.to_string();
        }
    }

    /// Height for the current buffer, between 1 and MAX_VISIBLE_LINES content rows.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let lines = wrapped_lines(&self.buffer, inner_width(width)).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn title(&self) -> String {
        match (&self.blocked_hint, self.sending) {
            (_, true) => "Sending…".to_string(),
            (Some(hint), false) => hint.clone(),
            (None, false) => "Message (Enter to send, Tab for controls)".to_string(),
        }
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        let lines = wrapped_lines(&self.buffer, width);
        // Keep the tail (where the cursor is) in view
        let skip = lines.len().saturating_sub(MAX_VISIBLE_LINES as usize);
        let visible = &lines[skip..];

        let border_style = match (self.focused, &self.blocked_hint) {
            (_, Some(_)) => Style::default().fg(Color::Yellow),
            (true, None) => Style::default().fg(Color::Green),
            (false, None) => Style::default().fg(Color::Green).add_modifier(Modifier::DIM),
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title())
            .padding(Padding::horizontal(1));

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(self.placeholder.as_str())
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
        } else {
            Paragraph::new(visible.join("\n")).style(Style::default().fg(Color::Green))
        };
        frame.render_widget(paragraph.block(block), area);

        if self.focused && !self.sending {
            let last = visible.last().map(String::as_str).unwrap_or("");
            let col = unicode_width::UnicodeWidthStr::width(last) as u16;
            let row = visible.len().saturating_sub(1) as u16;
            // 1 border + 1 padding on the left, 1 border on top
            let x = (area.x + 2 + col).min(area.right().saturating_sub(2));
            frame.set_cursor_position((x, area.y + 1 + row));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                Some(InputEvent::Changed(self.buffer.clone()))
            }
            TuiEvent::Paste(text) => {
                self.buffer.push_str(text);
                Some(InputEvent::Changed(self.buffer.clone()))
            }
            TuiEvent::Backspace => {
                if self.buffer.is_empty() {
                    return None;
                }
                let prev = prev_char_boundary(&self.buffer, self.buffer.len());
                self.buffer.truncate(prev);
                Some(InputEvent::Changed(self.buffer.clone()))
            }
            TuiEvent::Submit => Some(InputEvent::Submit),
            _ => None,
        }
    }
}
