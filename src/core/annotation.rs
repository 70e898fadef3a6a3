//! # Annotation Store
//!
//! Per-message judgments (radio choice or free-text reason), keyed by the
//! message's position in the stream. The store only grows: recording an index
//! overwrites that index's value and leaves every other entry alone.
//!
//! The session reducer is the only writer (via [`AnnotationStore::dispatch`]).
//! Renderers read it freely.

use std::collections::BTreeMap;

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

/// A single reducer action: set `index` to `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationAction {
    pub index: usize,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationStore {
    entries: BTreeMap<usize, Option<String>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, action: AnnotationAction) {
        debug!(
            "Annotation recorded: index={} value={:?}",
            action.index, action.value
        );
        self.entries.insert(action.index, action.value);
    }

    pub fn record(&mut self, index: usize, value: Option<String>) {
        self.dispatch(AnnotationAction { index, value });
    }

    /// True once `index` has been recorded, even with a null value.
    pub fn is_annotated(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// `None` when never recorded, `Some(None)` for a recorded null.
    pub fn get(&self, index: usize) -> Option<Option<&str>> {
        self.entries.get(&index).map(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&str>)> {
        self.entries.iter().map(|(i, v)| (*i, v.as_deref()))
    }
}

/// Which earlier messages must be judged before the worker can act at a
/// given position in the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum GatingPolicy {
    /// The message right before the position must be annotated.
    #[default]
    PreviousMessage,
    /// Every earlier message that needs a judgment must have one.
    AllPrior,
    /// Never gated.
    Disabled,
}

impl GatingPolicy {
    /// Whether acting at `position` is allowed.
    ///
    /// `needs_annotation(i)` says whether message `i` is something the
    /// worker is asked to judge; messages that aren't never block.
    pub fn gate_open(
        &self,
        position: usize,
        store: &AnnotationStore,
        needs_annotation: impl Fn(usize) -> bool,
    ) -> bool {
        match self {
            GatingPolicy::Disabled => true,
            GatingPolicy::PreviousMessage => match position.checked_sub(1) {
                None => true,
                Some(prev) => !needs_annotation(prev) || store.is_annotated(prev),
            },
            GatingPolicy::AllPrior => {
                (0..position).all(|i| !needs_annotation(i) || store.is_annotated(i))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GatingPolicy::PreviousMessage => "previous message",
            GatingPolicy::AllPrior => "all prior",
            GatingPolicy::Disabled => "off",
        }
    }
}
