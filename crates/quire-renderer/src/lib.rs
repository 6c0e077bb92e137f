//! quire renderer
//!
//! Concrete collaborators for the editing engine: a MathML typesetter built
//! on pulldown-latex, HTML for highlight runs and math spans, and the
//! stylesheet that colours them.

pub mod css;
pub mod html;
pub mod math;

pub use css::{Palette, generate_highlight_css};
pub use html::{highlight_html, span_html, surface_html};
pub use math::{MathMlRenderer, render_math};
