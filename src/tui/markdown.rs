//! Markdown → ratatui `Text` for message bodies.
//!
//! Agent replies often carry light markdown (emphasis, lists, inline code,
//! links, fenced code). Anything fancier is flattened to plain text.
//! Code blocks that name a known language are highlighted with syntect.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_GUTTER: &str = "▏ ";
const CODE_THEME: &str = "base16-ocean.dark";

/// Render `content` with `base_fg` as the default text color.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut builder = TextBuilder::new(base_fg);
    for event in Parser::new_ext(content, Options::ENABLE_STRIKETHROUGH) {
        builder.handle(event);
    }
    builder.text
}

struct TextBuilder {
    text: Text<'static>,
    base: Style,
    styles: Vec<Style>,
    /// `None` for bullets, `Some(n)` for the next ordered number.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    highlighter: Option<HighlightLines<'static>>,
    link_url: Option<String>,
    /// A block just ended; the next block starts after a blank line.
    block_gap: bool,
}

impl TextBuilder {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base: Style::default().fg(base_fg),
            styles: Vec::new(),
            lists: Vec::new(),
            in_code_block: false,
            highlighter: None,
            link_url: None,
            block_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn new_line(&mut self) {
        self.text.lines.push(Line::default());
    }

    fn start_block(&mut self) {
        if self.block_gap && !self.text.lines.is_empty() {
            self.new_line();
        }
        self.block_gap = false;
        self.new_line();
    }

    fn push_span(&mut self, span: Span<'static>) {
        match self.text.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.text.lines.push(Line::from(span)),
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.push_span(Span::styled(code.to_string(), style));
            }
            Event::SoftBreak => self.push_span(Span::raw(" ")),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.start_block();
                self.push_span(Span::styled("─".repeat(20), Style::default().fg(Color::DarkGray)));
                self.block_gap = true;
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // Paragraphs inside list items continue the item line
                if self.lists.is_empty() {
                    self.start_block();
                }
            }
            Tag::Heading { .. } => {
                self.start_block();
                self.push_style(Style::default().add_modifier(Modifier::BOLD));
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                self.text.lines.pop();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                    && let Some(syntax) = SYNTAX_SET.find_syntax_by_token(&lang)
                    && let Some(theme) = THEME_SET.themes.get(CODE_THEME)
                {
                    self.highlighter = Some(HighlightLines::new(syntax, theme));
                }
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                    self.text.lines.pop();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.new_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(Style::default().add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.block_gap = self.lists.is_empty(),
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.block_gap = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.highlighter = None;
                self.block_gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.block_gap = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::styled(
                        format!(" <{url}>"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        // ratatui renders \t as zero-width
        let text = raw.replace('\t', "    ");
        if self.in_code_block {
            let gutter = Span::styled(CODE_GUTTER, Style::default().fg(Color::DarkGray));
            match self.highlighter.as_mut() {
                Some(highlighter) => {
                    for line in LinesWithEndings::from(text.as_str()) {
                        let mut spans = vec![gutter.clone()];
                        match highlighter.highlight_line(line, &SYNTAX_SET) {
                            Ok(ranges) => spans.extend(ranges.into_iter().filter_map(
                                |(style, fragment)| {
                                    let content = fragment.trim_end_matches('\n');
                                    (!content.is_empty()).then(|| {
                                        let fg = style.foreground;
                                        Span::styled(
                                            content.to_owned(),
                                            Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                                        )
                                    })
                                },
                            )),
                            Err(_) => spans.push(Span::raw(line.trim_end_matches('\n').to_owned())),
                        }
                        self.text.lines.push(Line::from(spans));
                    }
                }
                None => {
                    let code = Style::default().fg(Color::White);
                    for line in text.lines() {
                        self.text.lines.push(Line::from(vec![
                            gutter.clone(),
                            Span::styled(line.to_owned(), code),
                        ]));
                    }
                }
            }
            return;
        }
        let style = self.style();
        self.push_span(Span::styled(text, style));
    }
}
