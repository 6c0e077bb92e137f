//! Math span lifecycle.
//!
//! A region with no span is plain text. Reconciling text changes creates
//! `Editing` spans, and leaving a span renders it to `Rendering` or `Error`.
//! Focus brings it back to `Editing` with the cursor placed by the entry
//! direction. Regions that vanish, empty out or merge into a larger region
//! drop their span.
//!
//! The controller never touches the text. Operations that change it return
//! a [`Splice`] for the caller to apply.

use std::ops::Range;
use std::time::Duration;

use web_time::Instant;

use crate::autocomplete::DEFAULT_MAX_SUGGESTIONS;
use crate::error::EditorError;
use crate::math::MathRegion;
use crate::position::DEFAULT_CHAR_WIDTH_FACTOR;
use crate::render::MathRenderer;
use crate::schedule::Debouncer;
use crate::span::{MathSpan, SpanArena, SpanId, SpanState};
use crate::types::{EditInfo, Entry};

/// Debounce after an edit that inserts or removes a line break.
pub const DEFAULT_NEWLINE_DELAY: Duration = Duration::from_millis(100);

/// Debounce after an ordinary edit.
pub const DEFAULT_EDIT_DELAY: Duration = Duration::from_millis(300);

/// Tunables for the editing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub newline_delay: Duration,
    pub edit_delay: Duration,
    pub max_suggestions: usize,
    pub char_width_factor: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            newline_delay: DEFAULT_NEWLINE_DELAY,
            edit_delay: DEFAULT_EDIT_DELAY,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            char_width_factor: DEFAULT_CHAR_WIDTH_FACTOR,
        }
    }
}

impl EditorConfig {
    /// Debounce delay to use after `edit`.
    pub fn delay_for(&self, edit: &EditInfo) -> Duration {
        if edit.contains_newline {
            self.newline_delay
        } else {
            self.edit_delay
        }
    }
}

/// What changed about a span. Hosts redraw from the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEvent {
    Updated(SpanId),
    Removed(SpanId),
}

/// A text change requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub text: String,
}

fn push_event(events: &mut Vec<SpanEvent>, event: SpanEvent) {
    if !events.contains(&event) {
        events.push(event);
    }
}

/// Owns the span arena and the debounce slot for one document.
pub struct SpanController<R> {
    arena: SpanArena,
    debouncer: Debouncer,
    renderer: R,
    config: EditorConfig,
}

impl<R: MathRenderer> SpanController<R> {
    pub fn new(renderer: R, config: EditorConfig) -> Self {
        Self {
            arena: SpanArena::new(),
            debouncer: Debouncer::new(),
            renderer,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn span(&self, id: SpanId) -> Option<&MathSpan> {
        self.arena.get(id)
    }

    /// All spans in document order.
    pub fn spans(&self) -> impl Iterator<Item = &MathSpan> {
        self.arena.iter()
    }

    /// Span containing `offset` strictly inside its outer bounds.
    pub fn span_at(&self, offset: usize) -> Option<&MathSpan> {
        self.arena.span_at(offset)
    }

    /// Editing span whose interior holds a cursor at `offset`.
    pub fn editing_span_at(&self, offset: usize) -> Option<&MathSpan> {
        self.arena
            .iter()
            .find(|span| span.state == SpanState::Editing && span.interior_contains(offset))
    }

    /// Rendered span starting exactly at `offset`.
    pub fn rendered_span_starting_at(&self, offset: usize) -> Option<&MathSpan> {
        self.arena
            .iter()
            .find(|span| span.is_rendered() && span.range.start == offset)
    }

    /// Rendered span ending exactly at `offset`.
    pub fn rendered_span_ending_at(&self, offset: usize) -> Option<&MathSpan> {
        self.arena
            .iter()
            .find(|span| span.is_rendered() && span.range.end == offset)
    }

    /// Bring the arena in line with freshly scanned `regions` of `text`.
    ///
    /// `edit` is the change that produced `text`, if any. Spans are shifted
    /// through it first, spans it touched lose their markup, and the span it
    /// landed in is scheduled for evaluation.
    pub fn sync(
        &mut self,
        text: &str,
        regions: &[MathRegion],
        edit: Option<&EditInfo>,
        now: Instant,
    ) -> Vec<SpanEvent> {
        let mut events = Vec::new();

        let mut byte_at: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let len_chars = byte_at.len();
        byte_at.push(text.len());

        let edit = edit.filter(|edit| {
            let stale = edit.is_stale(len_chars);
            if stale {
                tracing::warn!(
                    target: "quire::lifecycle",
                    expected = edit.doc_len_after,
                    actual = len_chars,
                    "ignoring edit that does not match the text"
                );
            }
            !stale
        });

        if let Some(edit) = edit {
            for id in self.arena.apply_edit(edit) {
                let Some(span) = self.arena.get_mut(id) else {
                    continue;
                };
                if span.is_rendered() {
                    span.demote();
                    tracing::debug!(target: "quire::lifecycle", %id, "edit inside rendered span");
                    push_event(&mut events, SpanEvent::Updated(id));
                }
            }
        }

        let mut kept: Vec<SpanId> = Vec::with_capacity(regions.len());
        for region in regions {
            let source = &text[byte_at[region.range.start]..byte_at[region.range.end]];
            let candidates: Vec<SpanId> = self
                .arena
                .overlapping(&region.range)
                .into_iter()
                .filter(|id| !kept.contains(id))
                .collect();
            let empty = region.content_range().is_empty();

            let Some((&keep, merged)) = candidates.split_first() else {
                if !empty {
                    let id = self
                        .arena
                        .insert(region.range.clone(), source.to_string(), region.display);
                    tracing::debug!(target: "quire::lifecycle", %id, source, "span created");
                    push_event(&mut events, SpanEvent::Updated(id));
                    kept.push(id);
                }
                continue;
            };

            for &id in merged {
                self.drop_span(id, "merged into larger region", &mut events);
            }
            if empty {
                self.drop_span(keep, "content empty", &mut events);
                continue;
            }

            if let Some(span) = self.arena.get_mut(keep) {
                let source_changed = span.source != source || span.display != region.display;
                if source_changed || span.range != region.range {
                    span.range = region.range.clone();
                    if source_changed {
                        span.source = source.to_string();
                        span.display = region.display;
                        if span.is_rendered() {
                            span.demote();
                        }
                    }
                    push_event(&mut events, SpanEvent::Updated(keep));
                }
            }
            kept.push(keep);
        }

        for id in self.arena.ids() {
            if !kept.contains(&id) {
                self.drop_span(id, "region vanished", &mut events);
            }
        }

        if let Some(edit) = edit {
            let affected = edit.affected_range();
            let target = self.arena.iter().find(|span| {
                span.state == SpanState::Editing
                    && span.range.start <= affected.end
                    && affected.start <= span.range.end
            });
            if let Some(id) = target.map(|span| span.id) {
                let delay = self.config.delay_for(edit);
                self.schedule(id, now, delay, &mut events);
            }
        }

        events
    }

    /// Enter `id` for editing. Returns the cursor offset to restore.
    ///
    /// A different span still waiting on the debounce is rendered first.
    pub fn focus(
        &mut self,
        id: SpanId,
        entry: Entry,
    ) -> Result<(Vec<SpanEvent>, usize), EditorError> {
        if self.arena.get(id).is_none() {
            return Err(EditorError::UnknownSpan(id));
        }
        let mut events = Vec::new();

        let queued = self.debouncer.pending().map(|task| task.span);
        if let Some(queued) = queued.filter(|span| *span != id) {
            self.debouncer.flush();
            tracing::debug!(
                target: "quire::lifecycle",
                %queued,
                focused = %id,
                "flushing queued span before focus"
            );
            self.render(queued, &mut events);
        }

        let span = self.arena.get_mut(id).ok_or(EditorError::UnknownSpan(id))?;
        if span.is_rendered() {
            span.demote();
            push_event(&mut events, SpanEvent::Updated(id));
        }
        let content = span.content_range();
        let cursor = match entry {
            Entry::FromLeft => content.start,
            Entry::FromRight => content.end,
            Entry::Pointer(offset) => offset.clamp(content.start, content.end),
        };
        tracing::debug!(target: "quire::lifecycle", %id, ?entry, cursor, "span focused");
        Ok((events, cursor))
    }

    /// Focus left `id`: render it.
    pub fn blur(&mut self, id: SpanId) -> Result<Vec<SpanEvent>, EditorError> {
        if self.arena.get(id).is_none() {
            return Err(EditorError::UnknownSpan(id));
        }
        self.debouncer.cancel_span(id);
        let mut events = Vec::new();
        self.render(id, &mut events);
        Ok(events)
    }

    /// Enter pressed while editing `id`: render it and return the offset
    /// just after the span.
    pub fn commit(&mut self, id: SpanId) -> Result<(Vec<SpanEvent>, usize), EditorError> {
        let events = self.blur(id)?;
        let end = self
            .arena
            .get(id)
            .map(|span| span.range.end)
            .ok_or(EditorError::UnknownSpan(id))?;
        Ok((events, end))
    }

    /// The cursor moved to `offset`: render every editing span it is not in.
    pub fn cursor_moved(&mut self, offset: usize) -> Vec<SpanEvent> {
        let left: Vec<SpanId> = self
            .arena
            .iter()
            .filter(|span| span.state == SpanState::Editing && !span.interior_contains(offset))
            .map(|span| span.id)
            .collect();

        let mut events = Vec::new();
        for id in left {
            self.debouncer.cancel_span(id);
            self.render(id, &mut events);
        }
        events
    }

    /// Fire a due debounce. Every editing span whose interior does not hold
    /// the cursor renders, not only the one the task was queued for: a
    /// single paste can open several spans.
    pub fn tick(&mut self, now: Instant, cursor: usize) -> Vec<SpanEvent> {
        let Some(task) = self.debouncer.poll(now) else {
            return Vec::new();
        };
        if self
            .arena
            .get(task.span)
            .is_some_and(|span| span.interior_contains(cursor))
        {
            tracing::trace!(
                target: "quire::lifecycle",
                span = %task.span,
                cursor,
                "debounce fired with cursor inside"
            );
        }
        self.cursor_moved(cursor)
    }

    /// Drop `id` and return the splice that removes its delimiters.
    pub fn unwrap(&mut self, id: SpanId) -> Result<(Splice, Vec<SpanEvent>), EditorError> {
        let span = self.arena.remove(id).ok_or(EditorError::UnknownSpan(id))?;
        self.debouncer.cancel_span(id);
        tracing::debug!(target: "quire::lifecycle", %id, "span unwrapped");
        let splice = Splice {
            range: span.range.clone(),
            text: span.latex().to_string(),
        };
        Ok((splice, vec![SpanEvent::Removed(id)]))
    }

    /// Drop `id` and return the splice that deletes its text.
    pub fn delete(&mut self, id: SpanId) -> Result<(Splice, Vec<SpanEvent>), EditorError> {
        let span = self.arena.remove(id).ok_or(EditorError::UnknownSpan(id))?;
        self.debouncer.cancel_span(id);
        tracing::debug!(target: "quire::lifecycle", %id, "span deleted");
        let splice = Splice {
            range: span.range,
            text: String::new(),
        };
        Ok((splice, vec![SpanEvent::Removed(id)]))
    }

    fn schedule(&mut self, id: SpanId, now: Instant, delay: Duration, events: &mut Vec<SpanEvent>) {
        let (_, displaced) = self.debouncer.schedule(id, now, delay);
        if let Some(task) = displaced {
            tracing::debug!(
                target: "quire::lifecycle",
                queued = %task.span,
                opened = %id,
                "another span opened, rendering queued span"
            );
            self.render(task.span, events);
        }
    }

    fn drop_span(&mut self, id: SpanId, reason: &'static str, events: &mut Vec<SpanEvent>) {
        if self.arena.remove(id).is_some() {
            self.debouncer.cancel_span(id);
            tracing::debug!(target: "quire::lifecycle", %id, reason, "span dropped");
            push_event(events, SpanEvent::Removed(id));
        }
    }

    /// Typeset an editing span. Failures keep the source and record the
    /// message.
    fn render(&mut self, id: SpanId, events: &mut Vec<SpanEvent>) {
        let Some(span) = self.arena.get_mut(id) else {
            return;
        };
        if span.state != SpanState::Editing || span.content_range().is_empty() {
            return;
        }

        match self.renderer.render(span.latex(), span.display) {
            Ok(markup) => {
                span.state = SpanState::Rendering;
                span.markup = Some(markup);
                span.error = None;
                tracing::debug!(target: "quire::lifecycle", %id, "span rendered");
            }
            Err(failure) => {
                tracing::debug!(
                    target: "quire::lifecycle",
                    %id,
                    error = %failure,
                    "math render failed"
                );
                span.state = SpanState::Error;
                span.error = Some(failure.message);
                span.markup = failure.markup;
            }
        }
        push_event(events, SpanEvent::Updated(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::scan_math_regions;
    use crate::render::RenderFailure;
    use crate::text::{EditorRope, TextBuffer};

    type TestRenderer = fn(&str, bool) -> Result<String, RenderFailure>;

    fn strict(latex: &str, display: bool) -> Result<String, RenderFailure> {
        let opens = latex.matches('{').count();
        let closes = latex.matches('}').count();
        if opens != closes {
            return Err(
                RenderFailure::new("unbalanced braces").with_markup("<span class=\"err\"/>")
            );
        }
        Ok(format!("<math display=\"{display}\">{latex}</math>"))
    }

    struct Doc {
        rope: EditorRope,
        spans: SpanController<TestRenderer>,
        now: Instant,
    }

    impl Doc {
        fn new(text: &str) -> Self {
            let now = Instant::now();
            let mut spans = SpanController::new(strict as TestRenderer, EditorConfig::default());
            spans.sync(text, &scan_math_regions(text), None, now);
            Self {
                rope: EditorRope::from_str(text),
                spans,
                now,
            }
        }

        fn replace(&mut self, range: Range<usize>, text: &str) -> Vec<SpanEvent> {
            self.rope.replace(range, text);
            let edit = self.rope.last_edit();
            let text = self.rope.to_string();
            let regions = scan_math_regions(&text);
            self.spans.sync(&text, &regions, edit.as_ref(), self.now)
        }

        fn only_span(&self) -> MathSpan {
            let spans: Vec<_> = self.spans.spans().cloned().collect();
            assert_eq!(spans.len(), 1, "expected one span, got {spans:?}");
            spans.into_iter().next().expect("one span")
        }
    }

    #[test]
    fn test_detected_region_becomes_editing_span() {
        let doc = Doc::new("Compute $a^2+b^2$ now");
        let span = doc.only_span();
        assert_eq!(span.state, SpanState::Editing);
        assert_eq!(span.range, 8..17);
        assert_eq!(span.source, "$a^2+b^2$");
    }

    #[test]
    fn test_cursor_leaving_interior_renders() {
        let mut doc = Doc::new("Compute $a^2+b^2$ now");
        assert!(doc.spans.cursor_moved(9).is_empty());
        let events = doc.spans.cursor_moved(20);
        let span = doc.only_span();
        assert_eq!(events, vec![SpanEvent::Updated(span.id)]);
        assert_eq!(span.state, SpanState::Rendering);
        assert_eq!(span.markup.as_deref(), Some("<math display=\"false\">a^2+b^2</math>"));
    }

    #[test]
    fn test_round_trip_keeps_source() {
        let mut doc = Doc::new("Compute $a^2+b^2$ now");
        let id = doc.only_span().id;
        doc.spans.cursor_moved(20);

        let (_, cursor) = doc.spans.focus(id, Entry::FromRight).expect("focus");
        assert_eq!(cursor, 16);
        let span = doc.only_span();
        assert_eq!(span.state, SpanState::Editing);
        assert_eq!(span.source, "$a^2+b^2$");
        assert!(span.markup.is_none());

        doc.spans.blur(id).expect("blur");
        assert_eq!(doc.only_span().source, "$a^2+b^2$");
        assert_eq!(doc.rope.to_string(), "Compute $a^2+b^2$ now");
    }

    #[test]
    fn test_focus_entry_directions() {
        let mut doc = Doc::new("x $$abc$$ y");
        let id = doc.only_span().id;
        doc.spans.cursor_moved(0);

        let (_, from_left) = doc.spans.focus(id, Entry::FromLeft).expect("focus");
        assert_eq!(from_left, 4);
        let (_, from_right) = doc.spans.focus(id, Entry::FromRight).expect("focus");
        assert_eq!(from_right, 7);
        let (_, clamped) = doc.spans.focus(id, Entry::Pointer(2)).expect("focus");
        assert_eq!(clamped, 4);
        let (_, inside) = doc.spans.focus(id, Entry::Pointer(5)).expect("focus");
        assert_eq!(inside, 5);
    }

    #[test]
    fn test_malformed_latex_goes_to_error_with_source_kept() {
        let mut doc = Doc::new("x $\\frac{1$ y");
        let id = doc.only_span().id;
        let (events, end) = doc.spans.commit(id).expect("commit");
        assert_eq!(events, vec![SpanEvent::Updated(id)]);
        assert_eq!(end, 11);

        let span = doc.only_span();
        assert_eq!(span.state, SpanState::Error);
        assert_eq!(span.error.as_deref(), Some("unbalanced braces"));
        assert_eq!(span.markup.as_deref(), Some("<span class=\"err\"/>"));
        assert_eq!(span.source, "$\\frac{1$");
    }

    #[test]
    fn test_edit_schedules_debounce() {
        let mut doc = Doc::new("Compute $a^2+b^2$ now");
        let id = doc.only_span().id;
        doc.replace(12..12, "c");

        let task = *doc.spans.debouncer().pending().expect("scheduled");
        assert_eq!(task.span, id);
        assert_eq!(task.deadline, doc.now + DEFAULT_EDIT_DELAY);

        // Cursor still inside: nothing renders.
        let later = doc.now + DEFAULT_EDIT_DELAY;
        assert!(doc.spans.tick(later, 13).is_empty());
        assert_eq!(doc.only_span().state, SpanState::Editing);
    }

    #[test]
    fn test_debounce_renders_when_cursor_outside() {
        let mut doc = Doc::new("Compute $a^2+b^2$ now");
        doc.replace(12..12, "c");
        let before = doc.now + Duration::from_millis(50);
        assert!(doc.spans.tick(before, 21).is_empty());

        let events = doc.spans.tick(doc.now + DEFAULT_EDIT_DELAY, 21);
        assert_eq!(events.len(), 1);
        assert_eq!(doc.only_span().state, SpanState::Rendering);
    }

    #[test]
    fn test_debounce_renders_every_span_of_a_paste() {
        let mut doc = Doc::new("");
        doc.replace(0..0, "$a$ and $b$ end");
        assert_eq!(doc.spans.spans().count(), 2);

        let events = doc.spans.tick(doc.now + DEFAULT_EDIT_DELAY, 15);
        assert_eq!(events.len(), 2);
        let states: Vec<_> = doc.spans.spans().map(|s| s.state).collect();
        assert_eq!(states, vec![SpanState::Rendering, SpanState::Rendering]);
        assert!(doc.spans.debouncer().pending().is_none());
    }

    #[test]
    fn test_newline_edit_uses_short_delay() {
        let mut doc = Doc::new("$$a+b$$");
        doc.replace(3..3, "\n");
        let task = doc.spans.debouncer().pending().expect("scheduled");
        assert_eq!(task.deadline, doc.now + DEFAULT_NEWLINE_DELAY);
    }

    #[test]
    fn test_rescheduling_replaces_pending_task() {
        let mut doc = Doc::new("$ab$");
        doc.replace(3..3, "c");
        let first = doc.spans.debouncer().pending().expect("scheduled").handle;
        doc.replace(4..4, "d");
        let second = doc.spans.debouncer().pending().expect("scheduled").handle;
        assert_ne!(first, second);
        assert_eq!(doc.only_span().source, "$abcd$");
    }

    #[test]
    fn test_editing_other_span_flushes_queued_one() {
        let mut doc = Doc::new("$a$ and $b$");
        let ids = doc.spans.spans().map(|s| s.id).collect::<Vec<_>>();
        doc.replace(2..2, "x");
        assert_eq!(doc.spans.debouncer().pending().map(|t| t.span), Some(ids[0]));

        let events = doc.replace(11..11, "y");
        assert!(events.contains(&SpanEvent::Updated(ids[0])));
        assert_eq!(doc.spans.span(ids[0]).map(|s| s.state), Some(SpanState::Rendering));
        assert_eq!(doc.spans.debouncer().pending().map(|t| t.span), Some(ids[1]));
    }

    #[test]
    fn test_focus_flushes_other_queued_span() {
        let mut doc = Doc::new("$a$ and $b$");
        let ids = doc.spans.spans().map(|s| s.id).collect::<Vec<_>>();
        doc.replace(2..2, "x");
        let (events, _) = doc.spans.focus(ids[1], Entry::FromLeft).expect("focus");
        assert!(events.contains(&SpanEvent::Updated(ids[0])));
        assert!(doc.spans.debouncer().pending().is_none());
    }

    #[test]
    fn test_edit_inside_rendered_span_demotes() {
        let mut doc = Doc::new("$x$ tail");
        doc.spans.cursor_moved(8);
        assert_eq!(doc.only_span().state, SpanState::Rendering);
        doc.replace(1..2, "y");
        let span = doc.only_span();
        assert_eq!(span.state, SpanState::Editing);
        assert_eq!(span.source, "$y$");
        assert!(span.markup.is_none());
    }

    #[test]
    fn test_edit_before_span_shifts_it() {
        let mut doc = Doc::new("a $x$");
        let id = doc.only_span().id;
        doc.replace(0..0, "你好");
        let span = doc.only_span();
        assert_eq!(span.id, id);
        assert_eq!(span.range, 4..7);
    }

    #[test]
    fn test_nested_spans_flatten() {
        let mut doc = Doc::new("$a$ and $b$");
        let ids = doc.spans.spans().map(|s| s.id).collect::<Vec<_>>();
        let events = doc.replace(2..9, "");
        assert_eq!(doc.rope.to_string(), "$ab$");
        assert!(events.contains(&SpanEvent::Removed(ids[1])));
        let span = doc.only_span();
        assert_eq!(span.id, ids[0]);
        assert_eq!(span.range, 0..4);
        assert_eq!(span.source, "$ab$");
    }

    #[test]
    fn test_deleting_delimiter_drops_span() {
        let mut doc = Doc::new("$x$ y");
        let id = doc.only_span().id;
        let events = doc.replace(2..3, "");
        assert_eq!(events, vec![SpanEvent::Removed(id)]);
        assert!(doc.spans.spans().next().is_none());
    }

    #[test]
    fn test_empty_content_has_no_span() {
        let doc = Doc::new("$$$$ text");
        assert!(doc.spans.spans().next().is_none());

        let mut doc = Doc::new("$$x$$");
        let id = doc.only_span().id;
        let events = doc.replace(2..3, "");
        assert_eq!(events, vec![SpanEvent::Removed(id)]);
    }

    #[test]
    fn test_unwrap_drops_delimiters() {
        let mut doc = Doc::new("see $$x+1$$ here");
        let id = doc.only_span().id;
        let (splice, events) = doc.spans.unwrap(id).expect("unwrap");
        assert_eq!(splice, Splice { range: 4..11, text: "x+1".into() });
        assert_eq!(events, vec![SpanEvent::Removed(id)]);
        assert!(doc.spans.unwrap(id).is_err());
    }

    #[test]
    fn test_delete_removes_text() {
        let mut doc = Doc::new("a $x$ b");
        let id = doc.only_span().id;
        let (splice, _) = doc.spans.delete(id).expect("delete");
        assert_eq!(splice, Splice { range: 2..5, text: String::new() });
    }

    #[test]
    fn test_unknown_span_errors() {
        let mut doc = Doc::new("plain");
        let bogus = SpanId(42);
        assert_eq!(doc.spans.blur(bogus), Err(EditorError::UnknownSpan(bogus)));
        assert!(doc.spans.focus(bogus, Entry::FromLeft).is_err());
    }
}
