use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::regenerate::RegenerateState;
use crate::core::stream::MessageView;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;
/// The worker's own bubbles are indented by 1/SELF_INDENT_DIVISOR of the width.
const SELF_INDENT_DIVISOR: u16 = 5;

/// One chat bubble.
///
/// Transient: built fresh each frame from a [`MessageView`]. The worker's own
/// messages sit to the right in green; everyone else's sit left in blue. An
/// annotation already recorded for the message shows as a badge in the
/// bottom border. While the last message is being regenerated its border
/// dims and the title says so.
#[derive(Clone, Copy)]
pub struct MessageBubble<'a> {
    pub view: &'a MessageView<'a>,
    pub is_selected: bool,
}

impl<'a> MessageBubble<'a> {
    pub fn new(view: &'a MessageView<'a>, is_selected: bool) -> Self {
        Self { view, is_selected }
    }

    /// Area the bubble occupies inside a row of `area`.
    fn bubble_area(is_self: bool, area: Rect) -> Rect {
        if !is_self {
            return area;
        }
        let indent = area.width / SELF_INDENT_DIVISOR;
        Rect {
            x: area.x + indent,
            width: area.width - indent,
            ..area
        }
    }

    fn body(view: &MessageView<'_>) -> Paragraph<'static> {
        let fg = if view.is_self { Color::Green } else { Color::Blue };
        Paragraph::new(markdown::render(view.text.trim(), fg)).wrap(Wrap { trim: false })
    }

    /// Rows needed to draw `view` in a row of the given width.
    pub fn calculate_height(view: &MessageView<'_>, width: u16) -> u16 {
        let bubble_width = Self::bubble_area(view.is_self, Rect::new(0, 0, width, 1)).width;
        let content_width = bubble_width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = Self::body(view).line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }

    fn regenerating(&self) -> bool {
        self.view
            .controls
            .as_ref()
            .is_some_and(|c| c.regenerate == Some(RegenerateState::Disabled))
    }
}

impl Widget for MessageBubble<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.view;
        let color = if view.is_self { Color::Green } else { Color::Blue };

        let mut border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };
        let title = if self.regenerating() {
            border_style = border_style.add_modifier(Modifier::ITALIC);
            format!("{} (regenerating…)", view.display_name)
        } else {
            view.display_name.to_string()
        };

        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Line::from(Span::styled(title, border_style)))
            .padding(Padding::horizontal(CONTENT_PAD_H));
        if view.is_self {
            block = block.title_alignment(ratatui::layout::Alignment::Right);
        }
        if let Some(annotation) = view.annotation {
            let badge = format!(" {} ", annotation.unwrap_or("✓"));
            block = block.title_bottom(
                Line::from(Span::styled(badge, Style::default().fg(Color::Yellow))).right_aligned(),
            );
        }

        let bubble = Self::bubble_area(view.is_self, area);
        let inner = block.inner(bubble);
        block.render(bubble, buf);
        Self::body(view).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn view<'a>(text: &'a str, is_self: bool) -> MessageView<'a> {
        MessageView {
            index: 0,
            key: "1-0".into(),
            is_self,
            display_name: if is_self { "You" } else { "model" },
            text,
            is_last: false,
            annotation: None,
            controls: None,
        }
    }

    #[test]
    fn calculate_height_single_line() {
        assert_eq!(
            MessageBubble::calculate_height(&view("Hello", false), 80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        assert_eq!(MessageBubble::calculate_height(&view("Hello", false), 0), 1);
    }

    #[test]
    fn calculate_height_wraps() {
        // width 9 → content width 5: "abcde" | "fghij"
        assert_eq!(
            MessageBubble::calculate_height(&view("abcdefghij", false), 9),
            2 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn self_bubbles_are_narrower() {
        let text = "one two three four five six seven eight nine ten";
        let other = MessageBubble::calculate_height(&view(text, false), 24);
        let own = MessageBubble::calculate_height(&view(text, true), 24);
        assert!(own >= other);
    }

    #[test]
    fn render_shows_name_and_annotation_badge() {
        let backend = TestBackend::new(40, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut v = view("Hi there", false);
        v.annotation = Some(Some("good"));

        terminal
            .draw(|f| {
                f.render_widget(MessageBubble::new(&v, false), f.area());
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("model"));
        assert!(text.contains("Hi there"));
        assert!(text.contains("good"));
    }
}
