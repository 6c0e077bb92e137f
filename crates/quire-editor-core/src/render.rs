//! Math typesetting seam.
//!
//! The lifecycle controller only needs `(latex, display) -> markup | error`.
//! Implementations are provided by the consuming application or by
//! `quire-renderer`.

/// A typesetting failure. The span keeps its source and shows `message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderFailure {
    pub message: String,
    /// Error-styled markup to show in place of the formula, if the renderer
    /// produced one.
    pub markup: Option<String>,
}

impl RenderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            markup: None,
        }
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Some(markup.into());
        self
    }
}

/// Typesets LaTeX math. Must not panic on malformed input.
pub trait MathRenderer {
    /// Render `latex` (without delimiters) as inline or display math.
    fn render(&self, latex: &str, display: bool) -> Result<String, RenderFailure>;
}

/// Unit type implementation - echoes the source back unchanged.
impl MathRenderer for () {
    fn render(&self, latex: &str, _display: bool) -> Result<String, RenderFailure> {
        Ok(latex.to_string())
    }
}

impl<F> MathRenderer for F
where
    F: Fn(&str, bool) -> Result<String, RenderFailure>,
{
    fn render(&self, latex: &str, display: bool) -> Result<String, RenderFailure> {
        self(latex, display)
    }
}
