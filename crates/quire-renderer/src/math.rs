//! LaTeX math rendering via pulldown-latex → MathML

use pulldown_cmark_escape::escape_html;
use pulldown_latex::{
    Parser, Storage, config::DisplayMode, config::RenderConfig, mathml::push_mathml,
};
use quire_editor_core::{MathRenderer, RenderFailure};

/// Typesets span content to MathML.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMlRenderer;

impl MathRenderer for MathMlRenderer {
    fn render(&self, latex: &str, display: bool) -> Result<String, RenderFailure> {
        render_math(latex, display)
    }
}

/// Render LaTeX math to MathML.
///
/// `latex` is the source without `$`/`$$` delimiters. On failure the
/// returned [`RenderFailure`] carries error-styled markup that shows the
/// source with the message as a tooltip.
pub fn render_math(latex: &str, display: bool) -> Result<String, RenderFailure> {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
        .collect();
    if !errors.is_empty() {
        return Err(failure(latex, errors.join("; "), display));
    }

    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config)
        .map_err(|e| failure(latex, e.to_string(), display))?;
    Ok(mathml)
}

fn failure(latex: &str, message: String, display: bool) -> RenderFailure {
    tracing::trace!(target: "quire::renderer", latex, %message, "latex rejected");
    let markup = error_html(latex, &message, display);
    RenderFailure::new(message).with_markup(markup)
}

fn error_html(latex: &str, error: &str, display: bool) -> String {
    let mode_class = if display { "math-display" } else { "math-inline" };
    let mut escaped_latex = String::new();
    let mut escaped_error = String::new();
    // Writing to a String cannot fail.
    let _ = escape_html(&mut escaped_latex, latex);
    let _ = escape_html(&mut escaped_error, error);
    format!(
        r#"<span class="math math-error {mode_class}" title="{escaped_error}"><code>{escaped_latex}</code></span>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_inline_math() {
        let mathml = render_math("a^2+b^2", false).expect("valid");
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("</math>"));
    }

    #[test]
    fn renders_display_fraction() {
        let mathml = MathMlRenderer.render(r"\frac{a}{b}", true).expect("valid");
        assert!(mathml.contains("<mfrac"));
    }

    #[test]
    fn renders_sum_with_limits() {
        assert!(render_math(r"\sum_{i=0}^{n} x_i", true).is_ok());
    }

    #[test]
    fn unclosed_group_fails_with_markup() {
        let failure = render_math(r"\frac{a", false).expect_err("unbalanced");
        assert!(!failure.message.is_empty());
        let markup = failure.markup.expect("error markup");
        assert!(markup.contains("math-error"));
        assert!(markup.contains(r"<code>\frac{a</code>"));
    }

    #[test]
    fn error_markup_is_escaped() {
        let html = error_html("a<b", "bad & worse", true);
        assert!(html.contains("math-display"));
        assert!(html.contains("a&lt;b"));
        assert!(html.contains("bad &amp; worse"));
    }
}
