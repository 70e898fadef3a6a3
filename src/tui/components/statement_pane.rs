//! # StatementPane Component
//!
//! Side panel listing the documents retrieved for the latest message.
//! Stateless: the document list comes from `core::statements`.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::statements::Document;
use crate::tui::component::Component;

/// Background for every other document.
const SHADED_BG: Color = Color::Rgb(32, 32, 40);

pub struct StatementPane<'a> {
    pub documents: &'a [Document],
}

/// Cut `text` to at most `max` display columns, ending in `…` when cut.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn document_lines(doc: &Document, width: usize, shaded: bool) -> Vec<Line<'static>> {
    let bg = if shaded { SHADED_BG } else { Color::Reset };
    let score = format!(" {:>3.0}%", doc.score * 100.0);
    let title_width = width.saturating_sub(score.width());

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{:<w$}", truncate_to_width(&doc.title, title_width), w = title_width),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(score, Style::default().fg(Color::Yellow)),
        ]),
        Line::from(Span::raw(truncate_to_width(&doc.text, width))),
    ];
    if let Some(source) = &doc.source {
        lines.push(Line::from(Span::styled(
            truncate_to_width(source, width),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::UNDERLINED),
        )));
    }
    lines
        .into_iter()
        .map(|line| line.style(Style::default().bg(bg)))
        .collect()
}

impl Component for StatementPane<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!("Statements ({})", self.documents.len()));
        let width = block.inner(area).width as usize;

        let lines: Vec<Line<'static>> = if self.documents.is_empty() {
            vec![Line::from(Span::styled(
                "No documents for this message",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))]
        } else {
            self.documents
                .iter()
                .enumerate()
                .flat_map(|(i, doc)| document_lines(doc, width, i % 2 == 1))
                .collect()
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn doc(id: &str, title: &str, source: Option<&str>) -> Document {
        Document {
            id: id.into(),
            title: title.into(),
            text: "body text".into(),
            score: 0.5,
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_to_width("short", 10), "short");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn truncate_counts_wide_chars() {
        // Each CJK char is two columns wide
        let cut = truncate_to_width("日本語テキスト", 7);
        assert!(cut.width() <= 7);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn source_line_only_when_present() {
        assert_eq!(document_lines(&doc("1", "A", None), 30, false).len(), 2);
        assert_eq!(document_lines(&doc("1", "A", Some("http://x")), 30, false).len(), 3);
    }

    #[test]
    fn alternate_documents_are_shaded() {
        let lines = document_lines(&doc("2", "B", None), 30, true);
        assert_eq!(lines[0].style.bg, Some(SHADED_BG));
    }

    #[test]
    fn render_lists_titles_and_scores() {
        let docs = vec![doc("1", "First", None), doc("2", "Second", None)];
        let mut terminal = Terminal::new(TestBackend::new(30, 8)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                StatementPane { documents: &docs }.render(f, area);
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Statements (2)"));
        assert!(text.contains("First"));
        assert!(text.contains("Second"));
        assert!(text.contains("50%"));
    }
}
