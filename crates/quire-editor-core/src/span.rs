//! Math span arena.
//!
//! Spans are addressed by [`SpanId`]. The document text stays the source of
//! truth: a span records which range it covers and a copy of its source so
//! a rendered span can be re-exposed unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::math::editable_interior;
use crate::types::{EditInfo, apply_delta};

/// Stable id of a math span within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(pub(crate) u64);

impl SpanId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Lifecycle state of a span. A region with no span is plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanState {
    /// Source visible and editable.
    Editing,
    /// Source replaced by typeset markup.
    Rendering,
    /// Typesetting failed; source kept and flagged.
    Error,
}

impl SpanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanState::Editing => "editing",
            SpanState::Rendering => "rendering",
            SpanState::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    pub id: SpanId,
    /// Char range in the document, delimiters included.
    pub range: Range<usize>,
    /// Source text with delimiters, exactly as in the document.
    pub source: String,
    pub display: bool,
    pub state: SpanState,
    pub markup: Option<String>,
    pub error: Option<String>,
}

impl MathSpan {
    pub fn delimiter_len(&self) -> usize {
        if self.display { 2 } else { 1 }
    }

    /// Char range of the LaTeX between the delimiters.
    pub fn content_range(&self) -> Range<usize> {
        let d = self.delimiter_len();
        let interior = editable_interior(&self.source).unwrap_or(d..d);
        self.range.start + interior.start..self.range.start + interior.end
    }

    /// The LaTeX between the delimiters.
    pub fn latex(&self) -> &str {
        let d = self.delimiter_len();
        let mut bounds = self.source.char_indices().map(|(b, _)| b);
        let start = bounds.nth(d).unwrap_or(self.source.len());
        let end = self
            .source
            .char_indices()
            .rev()
            .nth(d - 1)
            .map(|(b, _)| b)
            .unwrap_or(start)
            .max(start);
        &self.source[start..end]
    }

    /// Whether a cursor at `offset` is between the delimiters, inclusive of
    /// the positions touching them.
    pub fn interior_contains(&self, offset: usize) -> bool {
        let content = self.content_range();
        offset >= content.start && offset <= content.end
    }

    /// Rendering or Error: the source is hidden behind markup.
    pub fn is_rendered(&self) -> bool {
        !matches!(self.state, SpanState::Editing)
    }

    /// Drop markup and error and make the source editable again.
    pub fn demote(&mut self) {
        self.state = SpanState::Editing;
        self.markup = None;
        self.error = None;
    }

    /// Shift the span through an edit. Returns true when the edit touched
    /// the span itself rather than text before or after it.
    pub fn apply_edit(&mut self, edit: &EditInfo) -> bool {
        let deleted = edit.deleted_range();
        let delta = edit.delta();

        if deleted.end <= self.range.start {
            self.range.start = apply_delta(self.range.start, delta);
            self.range.end = apply_delta(self.range.end, delta);
            return false;
        }
        if deleted.start >= self.range.end {
            return false;
        }

        let start = self.range.start.min(deleted.start);
        let end = if deleted.end >= self.range.end {
            edit.edit_char_pos + edit.inserted_len
        } else {
            apply_delta(self.range.end, delta)
        };
        self.range = start..end.max(start);
        true
    }
}

/// Owner of all spans in one document.
#[derive(Debug, Default)]
pub struct SpanArena {
    spans: BTreeMap<SpanId, MathSpan>,
    next_id: u64,
}

impl SpanArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an editing span over `range`.
    pub fn insert(&mut self, range: Range<usize>, source: String, display: bool) -> SpanId {
        let id = SpanId(self.next_id);
        self.next_id += 1;
        self.spans.insert(
            id,
            MathSpan {
                id,
                range,
                source,
                display,
                state: SpanState::Editing,
                markup: None,
                error: None,
            },
        );
        id
    }

    pub fn get(&self, id: SpanId) -> Option<&MathSpan> {
        self.spans.get(&id)
    }

    pub fn get_mut(&mut self, id: SpanId) -> Option<&mut MathSpan> {
        self.spans.get_mut(&id)
    }

    pub fn remove(&mut self, id: SpanId) -> Option<MathSpan> {
        self.spans.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Spans ordered by document position.
    pub fn iter(&self) -> impl Iterator<Item = &MathSpan> {
        let mut spans: Vec<&MathSpan> = self.spans.values().collect();
        spans.sort_by_key(|span| (span.range.start, span.id));
        spans.into_iter()
    }

    pub fn ids(&self) -> Vec<SpanId> {
        self.iter().map(|span| span.id).collect()
    }

    /// Spans whose range overlaps `range`, in document order.
    pub fn overlapping(&self, range: &Range<usize>) -> Vec<SpanId> {
        self.iter()
            .filter(|span| span.range.start < range.end && range.start < span.range.end)
            .map(|span| span.id)
            .collect()
    }

    /// Span containing `offset` strictly inside its outer bounds.
    pub fn span_at(&self, offset: usize) -> Option<&MathSpan> {
        self.spans
            .values()
            .find(|span| span.range.start < offset && offset < span.range.end)
    }

    /// Shift every span through `edit`. Returns the spans the edit touched.
    pub fn apply_edit(&mut self, edit: &EditInfo) -> Vec<SpanId> {
        self.spans
            .values_mut()
            .filter_map(|span| span.apply_edit(edit).then_some(span.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use web_time::Instant;

    use super::*;

    fn edit(pos: usize, deleted: usize, inserted: usize) -> EditInfo {
        EditInfo {
            edit_char_pos: pos,
            inserted_len: inserted,
            deleted_len: deleted,
            contains_newline: false,
            doc_len_after: 0,
            timestamp: Instant::now(),
        }
    }

    fn span(range: Range<usize>, source: &str, display: bool) -> MathSpan {
        let mut arena = SpanArena::new();
        let id = arena.insert(range, source.to_string(), display);
        arena.remove(id).expect("just inserted")
    }

    #[test]
    fn test_latex_and_content_range() {
        let inline = span(8..17, "$a^2+b^2$", false);
        assert_eq!(inline.latex(), "a^2+b^2");
        assert_eq!(inline.content_range(), 9..16);

        let display = span(0..7, "$$x+1$$", true);
        assert_eq!(display.latex(), "x+1");
        assert_eq!(display.content_range(), 2..5);

        let empty = span(0..4, "$$$$", true);
        assert_eq!(empty.latex(), "");
        assert!(empty.content_range().is_empty());

        let cjk = span(0..4, "$面积$", false);
        assert_eq!(cjk.latex(), "面积");
    }

    #[test]
    fn test_interior_is_inclusive() {
        let s = span(8..17, "$a^2+b^2$", false);
        assert!(!s.interior_contains(8));
        assert!(s.interior_contains(9));
        assert!(s.interior_contains(16));
        assert!(!s.interior_contains(17));
    }

    #[test]
    fn test_edit_before_shifts() {
        let mut s = span(8..17, "$a^2+b^2$", false);
        assert!(!s.apply_edit(&edit(0, 0, 3)));
        assert_eq!(s.range, 11..20);
        assert!(!s.apply_edit(&edit(11, 0, 2)));
        assert_eq!(s.range, 13..22);
    }

    #[test]
    fn test_edit_after_is_ignored() {
        let mut s = span(8..17, "$a^2+b^2$", false);
        assert!(!s.apply_edit(&edit(17, 0, 4)));
        assert_eq!(s.range, 8..17);
    }

    #[test]
    fn test_edit_inside_grows_or_shrinks() {
        let mut s = span(8..17, "$a^2+b^2$", false);
        assert!(s.apply_edit(&edit(12, 0, 2)));
        assert_eq!(s.range, 8..19);
        assert!(s.apply_edit(&edit(9, 3, 0)));
        assert_eq!(s.range, 8..16);
    }

    #[test]
    fn test_edit_deleting_closing_delimiter() {
        let mut s = span(8..17, "$a^2+b^2$", false);
        assert!(s.apply_edit(&edit(16, 3, 0)));
        assert_eq!(s.range, 8..16);
    }

    #[test]
    fn test_arena_ids_are_monotonic_and_ordered() {
        let mut arena = SpanArena::new();
        let b = arena.insert(10..13, "$y$".into(), false);
        let a = arena.insert(0..3, "$x$".into(), false);
        assert!(a > b);
        assert_eq!(arena.ids(), vec![a, b]);
        assert_eq!(arena.overlapping(&(2..11)), vec![a, b]);
        assert_eq!(arena.span_at(1).map(|s| s.id), Some(a));
        assert!(arena.span_at(0).is_none());
        assert_eq!(format!("{b}"), "m0");
    }
}
