//! # Composer
//!
//! The worker's outgoing text.
//!
//! ```text
//! Empty ──edit──▶ Composing ──submit──▶ Sending ──ok──▶ Empty
//!   ▲                │  ▲                  │
//!   └──clear─────────┘  └──────failed──────┘
//! ```
//!
//! Whether a submit is *allowed* (gate, input mode) is decided by the caller
//! and passed in; the composer only tracks its own text and phase.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Composer {
    #[default]
    Empty,
    Composing(String),
    Sending(String),
}

impl Composer {
    pub fn new() -> Self {
        Self::Empty
    }

    pub fn text(&self) -> &str {
        match self {
            Composer::Empty => "",
            Composer::Composing(text) | Composer::Sending(text) => text,
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self, Composer::Sending(_))
    }

    /// Replace the text. Ignored while a send is in flight.
    pub fn edit(&mut self, text: String) {
        if self.is_sending() {
            return;
        }
        *self = if text.is_empty() {
            Composer::Empty
        } else {
            Composer::Composing(text)
        };
    }

    /// Seed the composer, e.g. with the annotation of the last message.
    /// Only an empty composer, or one still holding exactly `replaces` (the
    /// previous seed), is touched; anything the worker typed is kept.
    pub fn prefill(&mut self, text: String, replaces: Option<&str>) {
        let untouched = match self {
            Composer::Empty => true,
            Composer::Composing(current) => replaces == Some(current.as_str()),
            Composer::Sending(_) => false,
        };
        if untouched {
            self.edit(text);
        }
    }

    /// Move to `Sending` and return the text to send, if there is any and
    /// `allowed` holds.
    pub fn submit(&mut self, allowed: bool) -> Option<String> {
        match self {
            Composer::Composing(text) if allowed && !text.trim().is_empty() => {
                let text = text.clone();
                *self = Composer::Sending(text.clone());
                Some(text)
            }
            _ => None,
        }
    }

    pub fn sent(&mut self) {
        if self.is_sending() {
            *self = Composer::Empty;
        }
    }

    /// Back to `Composing` with the text untouched.
    pub fn failed(&mut self) {
        if let Composer::Sending(text) = self {
            *self = Composer::Composing(std::mem::take(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_moves_between_empty_and_composing() {
        let mut c = Composer::new();
        c.edit("hi".into());
        assert_eq!(c, Composer::Composing("hi".into()));
        c.edit(String::new());
        assert_eq!(c, Composer::Empty);
    }

    #[test]
    fn submit_requires_content_and_permission() {
        let mut c = Composer::new();
        assert_eq!(c.submit(true), None);
        c.edit("   ".into());
        assert_eq!(c.submit(true), None);
        c.edit("hello".into());
        assert_eq!(c.submit(false), None);
        assert_eq!(c.submit(true), Some("hello".into()));
        assert!(c.is_sending());
        // No second send while the first is in flight.
        assert_eq!(c.submit(true), None);
    }

    #[test]
    fn success_clears() {
        let mut c = Composer::Composing("x".into());
        c.submit(true);
        c.sent();
        assert_eq!(c, Composer::Empty);
    }

    #[test]
    fn failure_keeps_text() {
        let mut c = Composer::Composing("keep me".into());
        c.submit(true);
        c.failed();
        assert_eq!(c, Composer::Composing("keep me".into()));
    }

    #[test]
    fn edits_ignored_while_sending() {
        let mut c = Composer::Composing("a".into());
        c.submit(true);
        c.edit("b".into());
        assert_eq!(c.text(), "a");
    }

    #[test]
    fn prefill_only_when_empty() {
        let mut c = Composer::new();
        c.prefill("good - ".into(), None);
        assert_eq!(c.text(), "good - ");
        c.prefill("other - ".into(), None);
        assert_eq!(c.text(), "good - ");
    }

    #[test]
    fn prefill_replaces_its_own_untouched_seed() {
        let mut c = Composer::new();
        c.prefill("good - ".into(), None);
        c.prefill("bad - ".into(), Some("good - "));
        assert_eq!(c.text(), "bad - ");

        c.edit("bad - too short".into());
        c.prefill("okay - ".into(), Some("bad - "));
        assert_eq!(c.text(), "bad - too short");
    }
}
