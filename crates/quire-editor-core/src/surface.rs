//! Editable surface orchestration.
//!
//! [`EditorSurface`] owns the text buffer and runs every host event through
//! the pipeline: re-highlight and reconcile spans on text changes, update
//! autocomplete on cursor changes, and drive span transitions on focus,
//! blur, keys and debounce ticks. Each entry point returns the
//! [`Instruction`]s the host should carry out.

use std::ops::Range;

use web_time::Instant;

use crate::actions::{Key, KeydownResult};
use crate::autocomplete::{AutocompleteSession, Suggestion, complete};
use crate::error::EditorError;
use crate::highlight::{Highlight, highlight};
use crate::lifecycle::{EditorConfig, SpanController, SpanEvent, Splice};
use crate::position::{BoxMetrics, TextMeasurer, translate};
use crate::render::MathRenderer;
use crate::span::{MathSpan, SpanId};
use crate::text::{EditorRope, TextBuffer};
use crate::types::{CursorState, Entry, Point, Selection};

/// When a selection change should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Immediate,
    /// After the current DOM mutation has been laid out.
    NextTick,
}

/// Something the host must do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Mirror a text change made by the engine.
    ReplaceRange { range: Range<usize>, text: String },
    SetSelection { offset: usize, timing: Timing },
    /// A span was created or changed state. Redraw it from this snapshot.
    SpanUpdated(MathSpan),
    SpanRemoved(SpanId),
    ShowSuggestions {
        items: Vec<Suggestion>,
        selected: usize,
    },
    HideSuggestions,
    /// Layout changed; re-measure before positioning popups.
    Remeasure,
}

pub struct EditorSurface<R> {
    buffer: EditorRope,
    cursor: CursorState,
    highlight: Highlight,
    spans: SpanController<R>,
    autocomplete: AutocompleteSession,
}

impl<R: MathRenderer> EditorSurface<R> {
    pub fn new(renderer: R, config: EditorConfig) -> Self {
        Self::with_text("", renderer, config)
    }

    /// Open `text` with the cursor at the start. Every math region is
    /// rendered unless the cursor sits inside it.
    pub fn with_text(text: &str, renderer: R, config: EditorConfig) -> Self {
        let autocomplete = AutocompleteSession::new(config.max_suggestions);
        let mut surface = Self {
            buffer: EditorRope::from_str(text),
            cursor: CursorState::default(),
            highlight: highlight(text),
            spans: SpanController::new(renderer, config),
            autocomplete,
        };
        surface
            .spans
            .sync(text, &surface.highlight.regions, None, Instant::now());
        surface.spans.cursor_moved(0);
        surface
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.offset
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn spans(&self) -> impl Iterator<Item = &MathSpan> {
        self.spans.spans()
    }

    pub fn span(&self, id: SpanId) -> Option<&MathSpan> {
        self.spans.span(id)
    }

    pub fn autocomplete(&self) -> &AutocompleteSession {
        &self.autocomplete
    }

    pub fn config(&self) -> &EditorConfig {
        self.spans.config()
    }

    /// When the host should next call [`tick`](Self::tick), if anything is
    /// pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.spans.debouncer().pending().map(|task| task.deadline)
    }

    /// The host replaced `range` with `text`. The cursor moves to the end of
    /// the inserted text.
    pub fn replace(
        &mut self,
        range: Range<usize>,
        text: &str,
        now: Instant,
    ) -> Result<Vec<Instruction>, EditorError> {
        EditorError::check_range(&range, self.len_chars())?;
        let mut out = Vec::new();
        self.apply_text(range, text, now, &mut out);
        self.refresh_suggestions(&mut out);
        Ok(out)
    }

    /// The host moved the cursor. Landing inside a rendered span enters it.
    pub fn set_cursor(&mut self, offset: usize) -> Result<Vec<Instruction>, EditorError> {
        EditorError::check_offset(offset, self.len_chars())?;
        let mut out = Vec::new();
        self.cursor = CursorState::new(offset);

        let rendered = self
            .spans
            .span_at(offset)
            .filter(|span| span.is_rendered())
            .map(|span| span.id);
        match rendered {
            Some(id) => self.enter(id, Entry::Pointer(offset), &mut out)?,
            None => {
                let events = self.spans.cursor_moved(offset);
                self.push_span_events(events, &mut out);
            }
        }
        self.refresh_suggestions(&mut out);
        Ok(out)
    }

    /// The host changed the selection. A collapsed selection is a cursor
    /// move. A ranged one only moves the cursor to its head and hides
    /// suggestions.
    pub fn set_selection(&mut self, selection: Selection) -> Result<Vec<Instruction>, EditorError> {
        if selection.is_collapsed() {
            return self.set_cursor(selection.head);
        }
        EditorError::check_range(&selection.to_range(), self.len_chars())?;
        self.cursor = CursorState::new(selection.head);
        let mut out = Vec::new();
        if self.autocomplete.is_visible() {
            self.autocomplete.clear();
            out.push(Instruction::HideSuggestions);
        }
        Ok(out)
    }

    pub fn key_down(
        &mut self,
        key: &Key,
        now: Instant,
    ) -> Result<(KeydownResult, Vec<Instruction>), EditorError> {
        let mut out = Vec::new();

        if self.autocomplete.is_visible() {
            match key {
                Key::ArrowDown => {
                    self.autocomplete.select_next();
                    out.push(self.show_suggestions());
                    return Ok((KeydownResult::Handled, out));
                }
                Key::ArrowUp => {
                    self.autocomplete.select_prev();
                    out.push(self.show_suggestions());
                    return Ok((KeydownResult::Handled, out));
                }
                Key::Enter | Key::Tab => {
                    let out = self.accept_suggestion(now)?;
                    return Ok((KeydownResult::Handled, out));
                }
                Key::Escape => {
                    self.autocomplete.dismiss();
                    out.push(Instruction::HideSuggestions);
                    return Ok((KeydownResult::Handled, out));
                }
                _ => {}
            }
        }

        let offset = self.cursor.offset;
        let handled = match key {
            Key::Enter => match self.spans.editing_span_at(offset).map(|span| span.id) {
                Some(id) => {
                    let (events, end) = self.spans.commit(id)?;
                    self.push_span_events(events, &mut out);
                    self.cursor = CursorState::new(end);
                    out.push(Instruction::SetSelection {
                        offset: end,
                        timing: Timing::NextTick,
                    });
                    true
                }
                None => false,
            },
            Key::ArrowRight => match self.spans.rendered_span_starting_at(offset).map(|s| s.id) {
                Some(id) => {
                    self.enter(id, Entry::FromLeft, &mut out)?;
                    true
                }
                None => false,
            },
            Key::ArrowLeft => match self.spans.rendered_span_ending_at(offset).map(|s| s.id) {
                Some(id) => {
                    self.enter(id, Entry::FromRight, &mut out)?;
                    true
                }
                None => false,
            },
            _ => false,
        };

        let result = if handled {
            KeydownResult::Handled
        } else {
            KeydownResult::NotHandled
        };
        Ok((result, out))
    }

    /// Focus or hover entered span `id`.
    pub fn focus_span(&mut self, id: SpanId, entry: Entry) -> Result<Vec<Instruction>, EditorError> {
        let mut out = Vec::new();
        self.enter(id, entry, &mut out)?;
        Ok(out)
    }

    /// Focus left span `id`.
    pub fn blur_span(&mut self, id: SpanId) -> Result<Vec<Instruction>, EditorError> {
        let mut out = Vec::new();
        let events = self.spans.blur(id)?;
        self.push_span_events(events, &mut out);
        Ok(out)
    }

    /// Splice in the selected suggestion.
    pub fn accept_suggestion(&mut self, now: Instant) -> Result<Vec<Instruction>, EditorError> {
        let Some(suggestion) = self.autocomplete.take_selected() else {
            return Ok(Vec::new());
        };
        let completion = complete(&self.buffer.to_string(), self.cursor.offset, &suggestion);
        EditorError::check_range(&completion.replace, self.len_chars())?;

        let mut out = vec![
            Instruction::HideSuggestions,
            Instruction::ReplaceRange {
                range: completion.replace.clone(),
                text: completion.insert.clone(),
            },
        ];
        self.apply_text(completion.replace, &completion.insert, now, &mut out);
        self.cursor = CursorState::new(completion.cursor);
        out.push(Instruction::SetSelection {
            offset: completion.cursor,
            timing: Timing::NextTick,
        });
        Ok(out)
    }

    /// Fire the debounce if it is due.
    pub fn tick(&mut self, now: Instant) -> Vec<Instruction> {
        let mut out = Vec::new();
        let events = self.spans.tick(now, self.cursor.offset);
        self.push_span_events(events, &mut out);
        out
    }

    /// The host could not restore the requested selection. Fall back to the
    /// end of the surface.
    pub fn restore_failed(&mut self) -> Vec<Instruction> {
        let end = self.len_chars();
        tracing::warn!(
            target: "quire::surface",
            requested = self.cursor.offset,
            fallback = end,
            "cursor restore failed, moving to end"
        );
        self.cursor = CursorState::new(end);
        vec![Instruction::SetSelection {
            offset: end,
            timing: Timing::Immediate,
        }]
    }

    /// Replace span `id` with its bare LaTeX.
    pub fn unwrap_span(&mut self, id: SpanId, now: Instant) -> Result<Vec<Instruction>, EditorError> {
        let (splice, events) = self.spans.unwrap(id)?;
        let mut out = Vec::new();
        self.push_span_events(events, &mut out);
        self.apply_splice(splice, now, &mut out);
        Ok(out)
    }

    /// Delete span `id` and its text.
    pub fn delete_span(&mut self, id: SpanId, now: Instant) -> Result<Vec<Instruction>, EditorError> {
        let (splice, events) = self.spans.delete(id)?;
        let mut out = Vec::new();
        self.push_span_events(events, &mut out);
        self.apply_splice(splice, now, &mut out);
        Ok(out)
    }

    /// Where to anchor the suggestion popup: below the start of the token.
    pub fn popup_position(&self, metrics: &BoxMetrics, measurer: &impl TextMeasurer) -> Option<Point> {
        let token_start = self.autocomplete.selected()?.token.start;
        let anchor = translate(&self.buffer.to_string(), token_start, metrics, measurer);
        Some(Point::new(anchor.x, anchor.y + metrics.line_height))
    }

    fn apply_splice(&mut self, splice: Splice, now: Instant, out: &mut Vec<Instruction>) {
        out.push(Instruction::ReplaceRange {
            range: splice.range.clone(),
            text: splice.text.clone(),
        });
        self.apply_text(splice.range, &splice.text, now, out);
        out.push(Instruction::SetSelection {
            offset: self.cursor.offset,
            timing: Timing::NextTick,
        });
    }

    fn apply_text(&mut self, range: Range<usize>, text: &str, now: Instant, out: &mut Vec<Instruction>) {
        let start = range.start;
        self.buffer.replace(range, text);
        self.cursor = CursorState::new(start + text.chars().count());

        let edit = self.buffer.last_edit();
        let current = self.buffer.to_string();
        self.highlight = highlight(&current);
        let events = self
            .spans
            .sync(&current, &self.highlight.regions, edit.as_ref(), now);

        tracing::trace!(
            target: "quire::surface",
            len = self.buffer.len_chars(),
            cursor = self.cursor.offset,
            span_events = events.len(),
            "text applied"
        );
        self.push_span_events(events, out);
    }

    fn enter(&mut self, id: SpanId, entry: Entry, out: &mut Vec<Instruction>) -> Result<(), EditorError> {
        let (events, cursor) = self.spans.focus(id, entry)?;
        self.push_span_events(events, out);
        self.cursor = CursorState::new(cursor);
        let others = self.spans.cursor_moved(cursor);
        self.push_span_events(others, out);
        out.push(Instruction::SetSelection {
            offset: cursor,
            timing: Timing::NextTick,
        });
        Ok(())
    }

    fn push_span_events(&self, events: Vec<SpanEvent>, out: &mut Vec<Instruction>) {
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                SpanEvent::Updated(id) => {
                    if let Some(span) = self.spans.span(id) {
                        out.push(Instruction::SpanUpdated(span.clone()));
                    }
                }
                SpanEvent::Removed(id) => out.push(Instruction::SpanRemoved(id)),
            }
        }
        if !out.contains(&Instruction::Remeasure) {
            out.push(Instruction::Remeasure);
        }
    }

    fn refresh_suggestions(&mut self, out: &mut Vec<Instruction>) {
        let was_visible = self.autocomplete.is_visible();
        let before = self.buffer.text_before(self.cursor.offset);
        if self.autocomplete.update(&before) {
            out.push(self.show_suggestions());
        } else if was_visible {
            out.push(Instruction::HideSuggestions);
        }
    }

    fn show_suggestions(&self) -> Instruction {
        Instruction::ShowSuggestions {
            items: self.autocomplete.suggestions().to_vec(),
            selected: self.autocomplete.selected_index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::position::MonospaceMeasurer;
    use crate::render::RenderFailure;
    use crate::span::SpanState;

    fn echo(latex: &str, _display: bool) -> Result<String, RenderFailure> {
        Ok(format!("<m>{latex}</m>"))
    }

    type Echo = fn(&str, bool) -> Result<String, RenderFailure>;

    fn surface(text: &str) -> EditorSurface<Echo> {
        EditorSurface::with_text(text, echo as Echo, EditorConfig::default())
    }

    fn type_text(s: &mut EditorSurface<Echo>, text: &str, now: Instant) -> Vec<Instruction> {
        let mut out = Vec::new();
        for ch in text.chars() {
            let at = s.cursor();
            out.extend(s.replace(at..at, &ch.to_string(), now).expect("replace"));
        }
        out
    }

    #[test]
    fn test_opening_renders_all_math() {
        let s = surface("a $x$ and $$y$$");
        let states: Vec<_> = s.spans().map(|span| span.state).collect();
        assert_eq!(states, vec![SpanState::Rendering, SpanState::Rendering]);
        assert_eq!(s.highlight().plain_text(), "a $x$ and $$y$$");
    }

    #[test]
    fn test_typed_math_renders_after_debounce() {
        let now = Instant::now();
        let mut s = surface("");
        let out = type_text(&mut s, "$x$", now);
        assert!(out.iter().any(|i| matches!(i, Instruction::SpanUpdated(span) if span.state == SpanState::Editing)));
        assert_eq!(s.next_deadline(), Some(now + Duration::from_millis(300)));

        assert!(s.tick(now + Duration::from_millis(100)).is_empty());
        let out = s.tick(now + Duration::from_millis(300));
        assert!(out.contains(&Instruction::Remeasure));
        let span = s.spans().next().expect("span");
        assert_eq!(span.state, SpanState::Rendering);
        assert_eq!(span.markup.as_deref(), Some("<m>x</m>"));
    }

    #[test]
    fn test_pasted_regions_all_render_after_debounce() {
        let now = Instant::now();
        let mut s = surface("");
        s.replace(0..0, "$a$ and $b$ end", now).expect("paste");
        assert_eq!(s.cursor(), 15);

        s.tick(now + Duration::from_millis(300));
        let states: Vec<_> = s
            .spans()
            .map(|span| (span.source.clone(), span.state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("$a$".to_string(), SpanState::Rendering),
                ("$b$".to_string(), SpanState::Rendering),
            ]
        );
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_suggestions_shown_and_accepted() {
        let now = Instant::now();
        let mut s = surface("");
        let out = s.replace(0..0, "solve \\fr", now).expect("replace");
        let shown = out.iter().find_map(|i| match i {
            Instruction::ShowSuggestions { items, selected } => Some((items.len(), *selected)),
            _ => None,
        });
        assert_eq!(shown, Some((1, 0)));

        let (result, out) = s.key_down(&Key::Enter, now).expect("key");
        assert!(result.is_handled());
        assert_eq!(out[0], Instruction::HideSuggestions);
        assert_eq!(
            out[1],
            Instruction::ReplaceRange {
                range: 6..9,
                text: "$\\frac{}{}$".into()
            }
        );
        assert_eq!(
            out.last(),
            Some(&Instruction::SetSelection {
                offset: 13,
                timing: Timing::NextTick
            })
        );
        assert_eq!(s.text(), "solve $\\frac{}{}$");
        assert_eq!(s.cursor(), 13);
        assert_eq!(s.spans().next().map(|span| span.state), Some(SpanState::Editing));
    }

    #[test]
    fn test_arrow_keys_cycle_suggestions_and_escape_hides() {
        let now = Instant::now();
        let mut s = surface("");
        s.replace(0..0, "\\s", now).expect("replace");
        let (_, out) = s.key_down(&Key::ArrowUp, now).expect("key");
        let last = s.autocomplete().suggestions().len() - 1;
        assert!(matches!(out[0], Instruction::ShowSuggestions { selected, .. } if selected == last));

        let (result, out) = s.key_down(&Key::Escape, now).expect("key");
        assert!(result.is_handled());
        assert_eq!(out, vec![Instruction::HideSuggestions]);
        assert!(!s.autocomplete().is_visible());

        let (result, _) = s.key_down(&Key::Escape, now).expect("key");
        assert_eq!(result, KeydownResult::NotHandled);
    }

    #[test]
    fn test_click_into_rendered_span_and_commit() {
        let now = Instant::now();
        let mut s = surface("$x$ y");
        let out = s.set_cursor(1).expect("cursor");
        assert!(out.contains(&Instruction::SetSelection {
            offset: 1,
            timing: Timing::NextTick
        }));
        assert_eq!(s.spans().next().map(|span| span.state), Some(SpanState::Editing));

        let (result, out) = s.key_down(&Key::Enter, now).expect("key");
        assert!(result.is_handled());
        assert!(out.contains(&Instruction::SetSelection {
            offset: 3,
            timing: Timing::NextTick
        }));
        assert_eq!(s.spans().next().map(|span| span.state), Some(SpanState::Rendering));
    }

    #[test]
    fn test_arrow_entry_direction() {
        let now = Instant::now();
        let mut s = surface("a $xy$ b");
        s.set_cursor(2).expect("cursor");
        let (result, _) = s.key_down(&Key::ArrowRight, now).expect("key");
        assert!(result.is_handled());
        assert_eq!(s.cursor(), 3);

        s.set_cursor(7).expect("cursor");
        assert_eq!(s.spans().next().map(|span| span.state), Some(SpanState::Rendering));
        s.set_cursor(6).expect("cursor");
        let (result, _) = s.key_down(&Key::ArrowLeft, now).expect("key");
        assert!(result.is_handled());
        assert_eq!(s.cursor(), 5);
    }

    #[test]
    fn test_boundary_exit_renders() {
        let mut s = surface("Compute $a^2+b^2$ now");
        s.set_cursor(9).expect("enter");
        assert_eq!(s.spans().next().map(|span| span.state), Some(SpanState::Editing));
        let out = s.set_cursor(20).expect("leave");
        assert!(out.iter().any(|i| matches!(i, Instruction::SpanUpdated(span) if span.state == SpanState::Rendering)));
        assert_eq!(s.spans().next().map(|span| span.source.clone()), Some("$a^2+b^2$".to_string()));
    }

    #[test]
    fn test_ranged_selection_hides_suggestions() {
        let now = Instant::now();
        let mut s = surface("");
        s.replace(0..0, "x \\al", now).expect("replace");
        assert!(s.autocomplete().is_visible());
        let out = s.set_selection(Selection::new(0, 3)).expect("select");
        assert_eq!(out, vec![Instruction::HideSuggestions]);
        assert_eq!(s.cursor(), 3);
        assert!(s.set_selection(Selection::new(2, 9)).is_err());

        let out = s.set_selection(Selection::collapsed(5)).expect("collapse");
        assert!(out.iter().any(|i| matches!(i, Instruction::ShowSuggestions { .. })));
    }

    #[test]
    fn test_unwrap_span() {
        let now = Instant::now();
        let mut s = surface("see $$x+1$$ here");
        let id = s.spans().next().expect("span").id;
        let out = s.unwrap_span(id, now).expect("unwrap");
        assert_eq!(out[0], Instruction::SpanRemoved(id));
        assert!(out.contains(&Instruction::ReplaceRange {
            range: 4..11,
            text: "x+1".into()
        }));
        assert_eq!(s.text(), "see x+1 here");
        assert!(s.spans().next().is_none());
    }

    #[test]
    fn test_restore_failed_falls_back_to_end() {
        let mut s = surface("abc");
        assert_eq!(
            s.restore_failed(),
            vec![Instruction::SetSelection {
                offset: 3,
                timing: Timing::Immediate
            }]
        );
        assert_eq!(s.cursor(), 3);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let now = Instant::now();
        let mut s = surface("abc");
        assert!(s.replace(2..9, "x", now).is_err());
        assert!(s.set_cursor(4).is_err());
        assert!(s.blur_span(SpanId(9)).is_err());
    }

    #[test]
    fn test_popup_position_below_token() {
        let now = Instant::now();
        let mut s = surface("");
        s.replace(0..0, "ab \\al", now).expect("replace");
        let metrics = BoxMetrics::new(200.0, 10.0, 20.0).with_char_width_factor(1.0);
        let measurer = MonospaceMeasurer::for_metrics(&metrics);
        assert_eq!(s.popup_position(&metrics, &measurer), Some(Point::new(30.0, 20.0)));

        s.key_down(&Key::Escape, now).expect("key");
        assert!(s.popup_position(&metrics, &measurer).is_none());
    }
}
