//! # Review View
//!
//! The review screen shows a host page with one embedded task frame:
//!
//! ```text
//! ┌ Host ─────────────────────────────┐
//! │ child reported height: 12 rows    │
//! │ ╭ Task frame ───────────────────╮ │
//! │ │ Inputs / Outputs              │ │   ← sized by the last IFRAME_DATA
//! │ ╰───────────────────────────────╯ │
//! └───────────────────────────────────┘
//! ```
//!
//! The frame's content is what the child renders from its `ReviewLoader`;
//! its measured height is what the child's `SizeReporter` posts upward.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Paragraph, Wrap};
use serde_json::Value;

use crate::core::review::ReviewLoader;
use crate::tui::component::Component;

const LOADING_TEXT: &str = "Loading...";

/// Borders around the task frame.
const FRAME_OVERHEAD: u16 = 2;

fn section(title: &str, value: &Value) -> Vec<Line<'static>> {
    let heading = Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    let body = match value {
        Value::Null => vec![Line::from(Span::styled(
            "(none)",
            Style::default().fg(Color::DarkGray),
        ))],
        Value::String(s) => s.lines().map(|l| Line::from(l.to_string())).collect(),
        other => serde_json::to_string_pretty(other)
            .unwrap_or_default()
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect(),
    };
    std::iter::once(heading).chain(body).collect()
}

/// What the child frame draws for its current loader state.
pub fn frame_content(loader: &ReviewLoader) -> Paragraph<'static> {
    let text = match loader.payload() {
        None => Text::from(Span::styled(
            LOADING_TEXT,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Some(payload) => {
            let mut lines = section("Inputs", &payload.inputs);
            lines.push(Line::default());
            lines.extend(section("Outputs", &payload.outputs));
            Text::from(lines)
        }
    };
    Paragraph::new(text).wrap(Wrap { trim: false })
}

/// Rendered height of the child's content at `width`, borders included.
pub fn content_height(loader: &ReviewLoader, width: u16) -> Option<u32> {
    let inner = width.checked_sub(FRAME_OVERHEAD).filter(|w| *w > 0)?;
    Some(frame_content(loader).line_count(inner) as u32 + u32::from(FRAME_OVERHEAD))
}

pub struct ReviewView<'a> {
    /// Child-side state
    pub loader: &'a ReviewLoader,
    /// Height last reported to the parent, `None` before the first report
    pub reported_height: Option<u32>,
    /// Pending catch-all report, for the footer
    pub catch_all_pending: bool,
}

impl Component for ReviewView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let host = Block::bordered()
            .title("Host page")
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = host.inner(area);
        frame.render_widget(host, area);

        let [info_area, frame_area, _rest, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(self.frame_rows(area.height)),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        let info = match self.reported_height {
            Some(h) => format!("child reported height: {} rows", h),
            None => "waiting for the child to report its size".to_string(),
        };
        frame.render_widget(Line::from(info), info_area);

        let child = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Green))
            .title("Task frame");
        frame.render_widget(frame_content(self.loader).block(child), frame_area);

        let footer = if self.catch_all_pending {
            "q: quit   (deferred size report pending)"
        } else {
            "q: quit"
        };
        frame.render_widget(
            Line::from(Span::styled(footer, Style::default().fg(Color::DarkGray))),
            footer_area,
        );
    }
}

impl ReviewView<'_> {
    /// The parent sizes the frame from the child's report, not from its own
    /// measurement; before any report the frame gets a minimal box.
    fn frame_rows(&self, available: u16) -> u16 {
        let wanted = self.reported_height.unwrap_or(u32::from(FRAME_OVERHEAD) + 1);
        u16::try_from(wanted)
            .unwrap_or(u16::MAX)
            .min(available.saturating_sub(4))
    }
}
