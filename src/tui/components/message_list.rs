//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Lay out one [`MessageBubble`] per visible message
//! - Keep scroll position, pinned to the bottom until the worker scrolls up
//! - Cache bubble heights per render key so only new or replaced messages
//!   are measured again
//!
//! `MessageList` is created every frame around `&mut MessageListState`
//! (persistent) and the message views (props).

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::stream::MessageView;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageBubble;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout
            .total_height()
            .saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Re-engage auto-scroll once the worker scrolls back to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Whether messages exist below the viewport.
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.scroll_state.offset().y < self.max_offset()
    }
}

pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub views: &'a [MessageView<'a>],
    /// Index (into `views`) highlighted as the message the controls act on.
    pub selected: Option<usize>,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        views: &'a [MessageView<'a>],
        selected: Option<usize>,
    ) -> Self {
        Self {
            state,
            views,
            selected,
        }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        // 1. Refresh layout cache
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.views, content_width);
        layout.heights.truncate(reusable);
        layout.keys.truncate(reusable);
        for view in self.views.iter().skip(reusable) {
            layout
                .heights
                .push(MessageBubble::calculate_height(view, content_width));
            layout.keys.push(view.key.clone());
        }
        layout.content_width = content_width;
        layout.rebuild_prefix_heights();

        // 2. Clamp
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let total_height = self.state.layout.total_height();
        let scroll_offset = self.state.scroll_state.offset().y;
        let visible = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible bubbles into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset = match visible.start {
            0 => 0,
            start => self.state.layout.prefix_heights[start - 1],
        };
        for i in visible {
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, y_offset, content_width, height);
            let bubble = MessageBubble::new(&self.views[i], self.selected == Some(i));
            scroll_view.render_widget(bubble, rect);
            y_offset += height;
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                self.scroll_state.scroll_to_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Bubble heights, keyed by render key.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    keys: Vec<String>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            keys: Vec::new(),
            content_width: 0,
        }
    }

    /// Number of leading cached heights still valid for `views`.
    ///
    /// A width change invalidates everything. Otherwise the cache is valid up
    /// to the first render key that differs, which catches both appends and
    /// a regenerated last message.
    pub fn reusable_count(&self, views: &[MessageView<'_>], content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        self.keys
            .iter()
            .zip(views)
            .take_while(|(cached, view)| **cached == view.key)
            .count()
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end.max(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn view(key: &str) -> MessageView<'static> {
        MessageView {
            index: 0,
            key: key.to_string(),
            is_self: false,
            display_name: "model",
            text: "hello",
            is_last: false,
            annotation: None,
            controls: None,
        }
    }

    fn cached(keys: &[&str], width: u16) -> LayoutCache {
        let mut cache = LayoutCache::new();
        cache.keys = keys.iter().map(|k| k.to_string()).collect();
        cache.heights = vec![3; keys.len()];
        cache.content_width = width;
        cache.rebuild_prefix_heights();
        cache
    }

    #[test]
    fn appended_messages_reuse_prefix() {
        let cache = cached(&["1-0", "2-1"], 80);
        let views = vec![view("1-0"), view("2-1"), view("3-2")];
        assert_eq!(cache.reusable_count(&views, 80), 2);
    }

    #[test]
    fn replaced_last_message_is_remeasured() {
        let cache = cached(&["1-0", "2-1"], 80);
        let views = vec![view("1-0"), view("9-1")];
        assert_eq!(cache.reusable_count(&views, 80), 1);
    }

    #[test]
    fn width_change_invalidates_all() {
        let cache = cached(&["1-0", "2-1"], 80);
        let views = vec![view("1-0"), view("2-1")];
        assert_eq!(cache.reusable_count(&views, 40), 0);
    }

    #[test]
    fn visible_range_covers_viewport() {
        let cache = cached(&["a", "b", "c", "d", "e", "f"], 80);
        // Heights 3 each: [3, 6, 9, 12, 15, 18]
        let range = cache.visible_range(6, 4);
        assert!(range.contains(&2));
        assert!(range.contains(&3));
        assert_eq!(cache.total_height(), 18);
    }

    #[test]
    fn scrolling_up_unpins_and_end_repins() {
        let mut state = MessageListState::new();
        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        state.handle_event(&TuiEvent::ScrollToBottom);
        assert!(state.stick_to_bottom);
    }

    #[test]
    fn render_fills_cache() {
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut state = MessageListState::new();
        let views = vec![view("1-0"), view("2-1")];

        terminal
            .draw(|f| {
                let area = f.area();
                MessageList::new(&mut state, &views, None).render(f, area);
            })
            .unwrap();

        assert_eq!(state.layout.heights, vec![3, 3]);
        assert_eq!(state.layout.prefix_heights, vec![3, 6]);
    }
}
