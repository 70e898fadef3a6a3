//! # TitleBar Component
//!
//! Top status line: who the worker is, the gating policy in force, the
//! latest status message, and a "↓ New" marker when messages sit below the
//! scroll position.
//!
//! Stateless; every field is a prop.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

pub struct TitleBar<'a> {
    pub agent_name: &'a str,
    pub gating: &'a str,
    pub status_message: &'a str,
    pub has_unseen_content: bool,
}

impl TitleBar<'_> {
    fn text(&self) -> String {
        let mut text = format!(
            "Chat Review ({} | gating: {})",
            self.agent_name, self.gating
        );
        if !self.status_message.is_empty() {
            text.push_str(" | ");
            text.push_str(self.status_message);
        }
        if self.has_unseen_content {
            text.push_str(" | ↓ New");
        }
        text
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let line = Line::from(Span::styled(self.text(), Style::default().fg(Color::White)));
        frame.render_widget(line, area);
    }
}
