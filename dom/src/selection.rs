//! Selection boundaries and host-provided layout facts.

use crate::NodeId;

/// A point in the tree.
///
/// For a text node `offset` counts characters; for an element it is a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    #[must_use]
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection range. `start` precedes or equals `end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    #[must_use]
    pub const fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Collapsed range at `at`.
    #[must_use]
    pub const fn caret(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    /// True when both boundaries are the same point. Ranges that span only
    /// markup are not collapsed by this definition.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Bounding rectangle in viewport coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Page scroll origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Plain text field state: value plus selection in character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextField {
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
}

impl TextField {
    pub(crate) fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub(crate) fn clamp_selection(&mut self) {
        let len = self.len();
        self.selection_end = self.selection_end.min(len);
        self.selection_start = self.selection_start.min(self.selection_end);
    }

    /// Selected characters.
    #[must_use]
    pub fn selected_text(&self) -> String {
        self.value
            .chars()
            .skip(self.selection_start)
            .take(self.selection_end.saturating_sub(self.selection_start))
            .collect()
    }
}

/// Events dispatched into the document by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    /// Synthetic `input` event so host frameworks observe the edit.
    Input { target: NodeId, bubbles: bool },
}
