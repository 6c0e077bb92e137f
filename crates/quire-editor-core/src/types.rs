//! Core editor types: cursor, selection, entry direction and edit tracking.
//!
//! These types are framework-agnostic. All offsets are char offsets
//! (Unicode scalar values), never bytes or UTF-16 units.

use std::ops::Range;

use web_time::Instant;

/// Cursor position in the editable surface.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// Character offset in text (NOT byte offset!)
    pub offset: usize,
}

impl CursorState {
    /// Create a new cursor at the given offset.
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }
}

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the cursor is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where cursor is now
    pub head: usize,
}

impl Selection {
    /// Create a new selection.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Get the start (lower bound) of the selection.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Get the end (upper bound) of the selection.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Check if the selection is collapsed (empty, cursor only).
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Convert to a Range<usize> (ordered).
    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

/// Which side focus came from when it enters a rendered math span.
///
/// Threaded explicitly through the event handlers rather than inferred
/// from a remembered "last cursor position".
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Cursor arrived moving rightwards, i.e. from the text before the span.
    FromLeft,
    /// Cursor arrived moving leftwards, i.e. from the text after the span.
    FromRight,
    /// Click or tap at a specific offset; clamped into the span interior.
    Pointer(usize),
}

/// A point in surface coordinates (pixels).
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Information about the most recent edit.
///
/// Used to shift span ranges and to pick the debounce delay.
#[derive(Clone, Debug)]
pub struct EditInfo {
    /// Character offset where the edit occurred
    pub edit_char_pos: usize,
    /// Number of characters inserted
    pub inserted_len: usize,
    /// Number of characters deleted
    pub deleted_len: usize,
    /// Whether the inserted or deleted text contains a newline
    pub contains_newline: bool,
    /// Document length (in chars) after this edit was applied.
    /// If current doc length doesn't match, the edit info is stale.
    pub doc_len_after: usize,
    /// When this edit occurred.
    pub timestamp: Instant,
}

impl PartialEq for EditInfo {
    fn eq(&self, other: &Self) -> bool {
        // Compare all fields except timestamp (not meaningful for equality)
        self.edit_char_pos == other.edit_char_pos
            && self.inserted_len == other.inserted_len
            && self.deleted_len == other.deleted_len
            && self.contains_newline == other.contains_newline
            && self.doc_len_after == other.doc_len_after
    }
}

impl EditInfo {
    /// Check if this edit info is stale (doc has changed since this edit).
    pub fn is_stale(&self, current_doc_len: usize) -> bool {
        self.doc_len_after != current_doc_len
    }

    /// Signed change in document length.
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.deleted_len as isize
    }

    /// The range of the old document that was replaced.
    pub fn deleted_range(&self) -> Range<usize> {
        self.edit_char_pos..self.edit_char_pos + self.deleted_len
    }

    /// Get the range that was affected by this edit.
    ///
    /// For insertions and replacements: the range of inserted text.
    /// For deletions: an empty range at the deletion point.
    pub fn affected_range(&self) -> Range<usize> {
        self.edit_char_pos..self.edit_char_pos + self.inserted_len
    }
}

/// Apply a signed delta to a usize, saturating at 0 on underflow.
pub fn apply_delta(val: usize, delta: isize) -> usize {
    if delta >= 0 {
        val.saturating_add(delta as usize)
    } else {
        val.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let sel = Selection::new(10, 5);
        assert_eq!(sel.start(), 5);
        assert_eq!(sel.end(), 10);
        assert_eq!(sel.to_range(), 5..10);
        assert!(!sel.is_collapsed());
        assert!(Selection::collapsed(3).is_collapsed());
    }

    #[test]
    fn test_edit_info_ranges() {
        let edit = EditInfo {
            edit_char_pos: 4,
            inserted_len: 3,
            deleted_len: 1,
            contains_newline: false,
            doc_len_after: 20,
            timestamp: Instant::now(),
        };
        assert_eq!(edit.delta(), 2);
        assert_eq!(edit.deleted_range(), 4..5);
        assert_eq!(edit.affected_range(), 4..7);
        assert!(!edit.is_stale(20));
        assert!(edit.is_stale(21));
    }

    #[test]
    fn test_apply_delta_saturates() {
        assert_eq!(apply_delta(5, 3), 8);
        assert_eq!(apply_delta(5, -3), 2);
        assert_eq!(apply_delta(2, -5), 0);
    }
}
