//! quire-editor-core: LaTeX-aware hybrid editing logic without framework
//! dependencies.
//!
//! This crate provides:
//! - `highlight` - per-character categorisation of mixed prose, Markdown and
//!   LaTeX, with math regions found along the way
//! - `autocomplete` - backslash command suggestions from a static dictionary
//! - `position` - char offset to pixel translation with wrap probing
//! - `SpanController` - the editing/rendering/error lifecycle of math spans
//! - `EditorSurface` - ties the above together and emits host instructions
//!
//! All offsets are char offsets. Time is always passed in by the caller.

pub mod actions;
pub mod autocomplete;
pub mod error;
pub mod highlight;
pub mod lifecycle;
pub mod math;
pub mod position;
pub mod render;
pub mod rules;
pub mod schedule;
pub mod span;
pub mod surface;
pub mod symbols;
pub mod text;
pub mod types;

pub use actions::{Key, KeydownResult};
pub use autocomplete::{
    AutocompleteSession, CommandToken, Completion, Suggestion, complete, extract_command_token,
    match_suggestions,
};
pub use error::EditorError;
pub use highlight::{Highlight, HighlightRun, highlight, highlight_with_regions, is_cjk};
pub use lifecycle::{EditorConfig, SpanController, SpanEvent, Splice};
pub use math::{MathMode, MathRegion, is_inside_math, math_mode, scan_math_regions};
pub use position::{BoxMetrics, MonospaceMeasurer, TextMeasurer, translate};
pub use render::{MathRenderer, RenderFailure};
pub use rules::{Category, HighlightRule, RuleKind};
pub use smol_str::SmolStr;
pub use span::{MathSpan, SpanId, SpanState};
pub use surface::{EditorSurface, Instruction, Timing};
pub use symbols::{SymbolCategory, SymbolEntry, dictionary, search_prefix};
pub use text::{EditorRope, TextBuffer};
pub use types::{CursorState, EditInfo, Entry, Point, Selection};
