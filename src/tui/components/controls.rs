//! # Controls Component
//!
//! Annotation radio options and the regenerate control for the last message.
//!
//! Keys while the controls have focus:
//!
//! - `1`..`9` pick an annotation option
//! - `r` opens the regenerate prompt; there `1`..`3` send a preset reason,
//!   typing writes a free-text reason sent with Enter, Esc cancels
//! - `d` finishes the task once the conversation is over
//!
//! The gate only blocks *acting*: the bar still renders when closed, with a
//! hint pointing at the message that needs a judgment first.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};

use crate::core::regenerate::{FeedbackReason, RegenerateState};
use crate::core::stream::Controls;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Index into the annotation options
    Annotate(usize),
    Regenerate(String),
    Done,
}

/// Own messages get no controls worth drawing.
pub fn shows_controls(controls: &Controls) -> bool {
    controls.annotation_prompt || controls.regenerate.is_some()
}

/// Persistent state for the controls bar.
#[derive(Debug, Default)]
pub struct ControlsState {
    /// Free-text reason being typed; `Some` while the prompt is open
    pub reason_draft: Option<String>,
    /// Number of annotation options (prop)
    pub option_count: usize,
}

impl ControlsState {
    pub fn new(option_count: usize) -> Self {
        Self {
            reason_draft: None,
            option_count,
        }
    }

    pub fn prompt_open(&self) -> bool {
        self.reason_draft.is_some()
    }

    /// Rows the bar needs for the given props.
    pub fn calculate_height(&self, controls: Option<&Controls>) -> u16 {
        match controls {
            Some(c) if shows_controls(c) => {
                let prompt_rows = if self.prompt_open() {
                    FeedbackReason::ALL.len() as u16 + 1
                } else {
                    0
                };
                2 + 2 + prompt_rows
            }
            _ => 0,
        }
    }

    fn handle_prompt(&mut self, event: &TuiEvent) -> Option<ControlEvent> {
        let draft = self.reason_draft.as_mut()?;
        match event {
            TuiEvent::Escape => {
                self.reason_draft = None;
                None
            }
            TuiEvent::InputChar(c) if draft.is_empty() && c.is_ascii_digit() => {
                let n = c.to_digit(10).unwrap_or(0) as usize;
                let reason = FeedbackReason::ALL.get(n.checked_sub(1)?)?;
                self.reason_draft = None;
                Some(ControlEvent::Regenerate(reason.label().to_string()))
            }
            TuiEvent::InputChar(c) => {
                draft.push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                draft.push_str(text);
                None
            }
            TuiEvent::Backspace => {
                draft.pop();
                None
            }
            TuiEvent::Submit if !draft.trim().is_empty() => {
                let reason = draft.trim().to_string();
                self.reason_draft = None;
                Some(ControlEvent::Regenerate(reason))
            }
            _ => None,
        }
    }
}

impl EventHandler for ControlsState {
    type Event = ControlEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.prompt_open() {
            return self.handle_prompt(event);
        }
        match event {
            TuiEvent::InputChar('r') => {
                self.reason_draft = Some(String::new());
                None
            }
            TuiEvent::InputChar('d') => Some(ControlEvent::Done),
            TuiEvent::InputChar(c) => {
                let n = c.to_digit(10)? as usize;
                (1..=self.option_count)
                    .contains(&n)
                    .then(|| ControlEvent::Annotate(n - 1))
            }
            _ => None,
        }
    }
}

/// Transient view over [`ControlsState`] plus the last message's [`Controls`].
pub struct ControlsBar<'a> {
    pub state: &'a ControlsState,
    pub controls: &'a Controls,
    pub options: &'a [String],
    pub focused: bool,
}

impl ControlsBar<'_> {
    fn option_spans(&self) -> Vec<Span<'static>> {
        let current = self.controls.annotation.as_ref().and_then(|a| a.as_deref());
        let mut spans = vec![Span::raw("Rate: ")];
        for (i, option) in self.options.iter().enumerate() {
            let chosen = current == Some(option.as_str());
            let mark = if chosen { "◉" } else { "○" };
            let style = if chosen {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!("[{}] {} {}  ", i + 1, mark, option), style));
        }
        spans
    }

    fn regenerate_span(&self) -> Option<Span<'static>> {
        match self.controls.regenerate? {
            RegenerateState::Active => Some(Span::styled(
                "[r] Regenerate",
                Style::default().fg(Color::Magenta),
            )),
            RegenerateState::Disabled => Some(Span::styled(
                "Regenerating…",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if self.controls.annotation_prompt {
            lines.push(Line::from(self.option_spans()));
        }
        let mut second = Vec::new();
        if let Some(span) = self.regenerate_span() {
            second.push(span);
        }
        if !self.controls.gate_open {
            second.push(Span::styled(
                "  Rate the previous answer first",
                Style::default().fg(Color::Yellow),
            ));
        }
        if !second.is_empty() {
            lines.push(Line::from(second));
        }

        if let Some(draft) = &self.state.reason_draft {
            for (i, reason) in FeedbackReason::ALL.iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  [{}] {}", i + 1, reason.label()), Style::default().fg(Color::Magenta)),
                    Span::styled(format!("  {}", reason.hint()), Style::default().fg(Color::DarkGray)),
                ]));
            }
            lines.push(Line::from(vec![
                Span::raw("  Reason: "),
                Span::styled(draft.clone(), Style::default().fg(Color::White)),
            ]));
        }
        lines
    }
}

impl Component for ControlsBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title("Controls (Tab)");
        let style = if self.controls.actionable() {
            Style::default()
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let paragraph = Paragraph::new(self.lines())
            .style(style)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}
