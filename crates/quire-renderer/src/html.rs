//! HTML for the editing surface.
//!
//! Highlight runs become `<span class="hl-…">` elements. Rendered math spans
//! replace their runs with typeset markup, and editing spans wrap theirs so
//! the host can find them by `data-span-id`.

use std::fmt::Write;
use std::ops::Range;

use pulldown_cmark_escape::escape_html;
use quire_editor_core::{Highlight, HighlightRun, MathSpan, SpanState};

/// CSS class prefix for highlight categories.
pub const CLASS_PREFIX: &str = "hl-";

fn push_escaped(out: &mut String, text: &str) {
    // Writing to a String cannot fail.
    let _ = escape_html(&mut *out, text);
}

fn push_run(out: &mut String, category_class: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    if category_class.is_empty() {
        push_escaped(out, text);
        return;
    }
    let _ = write!(out, r#"<span class="{CLASS_PREFIX}{category_class}">"#);
    push_escaped(out, text);
    out.push_str("</span>");
}

/// Emit the parts of `runs` inside `window`.
fn push_runs(out: &mut String, runs: &[HighlightRun], window: Range<usize>) {
    for run in runs {
        let start = run.char_range.start.max(window.start);
        let end = run.char_range.end.min(window.end);
        if start >= end {
            continue;
        }
        let clipped: String = run
            .text
            .chars()
            .skip(start - run.char_range.start)
            .take(end - start)
            .collect();
        push_run(out, run.category.as_str(), &clipped);
    }
}

/// Highlight runs only, with no span handling.
pub fn highlight_html(highlight: &Highlight) -> String {
    let mut out = String::new();
    push_runs(&mut out, &highlight.runs, 0..highlight.len_chars());
    out
}

/// Markup for a rendered or failed span.
pub fn span_html(span: &MathSpan) -> String {
    let mode = if span.display { "math-display" } else { "math-inline" };
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<span class="math-span {mode} math-{}" data-span-id="{}" contenteditable="false""#,
        span.state.as_str(),
        span.id,
    );
    if let Some(error) = &span.error {
        out.push_str(r#" title=""#);
        push_escaped(&mut out, error);
        out.push('"');
    }
    out.push('>');
    match &span.markup {
        Some(markup) => out.push_str(markup),
        None => {
            out.push_str("<code>");
            push_escaped(&mut out, &span.source);
            out.push_str("</code>");
        }
    }
    out.push_str("</span>");
    out
}

/// The full surface: highlight runs with every span swapped in.
///
/// `spans` must be in document order, as the span arena yields them.
pub fn surface_html<'a>(highlight: &Highlight, spans: impl IntoIterator<Item = &'a MathSpan>) -> String {
    let mut out = String::new();
    let mut pos = 0;
    for span in spans {
        if span.range.start < pos {
            tracing::warn!(
                target: "quire::renderer",
                span = %span.id,
                start = span.range.start,
                pos,
                "span out of order, skipped"
            );
            continue;
        }
        push_runs(&mut out, &highlight.runs, pos..span.range.start);
        match span.state {
            SpanState::Editing => {
                let _ = write!(
                    out,
                    r#"<span class="math-span math-editing" data-span-id="{}">"#,
                    span.id
                );
                push_runs(&mut out, &highlight.runs, span.range.clone());
                out.push_str("</span>");
            }
            SpanState::Rendering | SpanState::Error => out.push_str(&span_html(span)),
        }
        pos = span.range.end;
    }
    push_runs(&mut out, &highlight.runs, pos..highlight.len_chars());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_editor_core::{EditorConfig, EditorSurface, RenderFailure, highlight};

    fn bracket(latex: &str, _display: bool) -> Result<String, RenderFailure> {
        Ok(format!("[{latex}]"))
    }

    type Bracket = fn(&str, bool) -> Result<String, RenderFailure>;

    #[test]
    fn test_highlight_html_escapes_and_classes() {
        let html = highlight_html(&highlight("a<b $x$"));
        insta::assert_snapshot!(html, @r#"a&lt;b <span class="hl-math-delimiter">$</span><span class="hl-math-variable">x</span><span class="hl-math-delimiter">$</span>"#);
    }

    #[test]
    fn test_highlight_html_question_markup() {
        let html = highlight_html(&highlight("【答案】A. **yes**"));
        insta::assert_snapshot!(html, @r#"<span class="hl-question-tag">【答案】</span>A. <span class="hl-markdown-bold">**yes**</span>"#);
    }

    #[test]
    fn test_surface_html_swaps_rendered_spans() {
        let surface = EditorSurface::with_text("see $x$ & $y$", bracket as Bracket, EditorConfig::default());
        let html = surface_html(surface.highlight(), surface.spans());
        assert!(html.starts_with("see "));
        assert!(html.contains(r#"data-span-id="m0" contenteditable="false">[x]</span>"#));
        assert!(html.contains(" &amp; "));
        assert!(html.ends_with("[y]</span>"));
    }

    #[test]
    fn test_editing_span_keeps_highlighted_source() {
        let mut surface = EditorSurface::with_text("$x$", bracket as Bracket, EditorConfig::default());
        surface.set_cursor(1).expect("enter span");
        let html = surface_html(surface.highlight(), surface.spans());
        assert_eq!(
            html,
            concat!(
                r#"<span class="math-span math-editing" data-span-id="m0">"#,
                r#"<span class="hl-math-delimiter">$</span>"#,
                r#"<span class="hl-math-variable">x</span>"#,
                r#"<span class="hl-math-delimiter">$</span>"#,
                "</span>",
            )
        );
    }

    #[test]
    fn test_span_html_error_title() {
        let failing = |_: &str, _: bool| -> Result<String, RenderFailure> {
            Err(RenderFailure::new("missing \"}\""))
        };
        let surface = EditorSurface::with_text("$\\frac{a$", failing, EditorConfig::default());
        let span = surface.spans().next().expect("span");
        let html = span_html(span);
        assert!(html.contains("math-error"));
        assert!(html.contains(r#"title="missing &quot;}&quot;""#));
        assert!(html.contains(r"<code>$\frac{a$</code>"));
    }
}
