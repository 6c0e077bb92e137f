//! Math region scanning and math-mode detection.
//!
//! Regions are found with the math-content rule from the rule table:
//! `$$...$$` is tried before `$...$` at every position, so display math is
//! never split into two inline regions. The mode detector is a cheaper
//! backward toggle scan over the text preceding a cursor.
//!
//! Neither pass treats `\$` as an escaped dollar sign.

use std::ops::Range;

use crate::rules::math_content_rule;
use crate::text::byte_to_char_table;

/// A `$...$` or `$$...$$` region, in char offsets, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathRegion {
    pub range: Range<usize>,
    pub display: bool,
}

impl MathRegion {
    /// Number of `$` chars on each side.
    pub fn delimiter_len(&self) -> usize {
        if self.display { 2 } else { 1 }
    }

    /// The LaTeX source between the delimiters.
    pub fn content_range(&self) -> Range<usize> {
        let d = self.delimiter_len();
        self.range.start + d..self.range.end - d
    }

    /// Whether a cursor at `offset` sits between the delimiters (inclusive
    /// of the positions touching them from inside).
    pub fn interior_contains(&self, offset: usize) -> bool {
        let content = self.content_range();
        offset >= content.start && offset <= content.end
    }

    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.range.start < range.end && range.start < self.range.end
    }
}

/// Which kind of math the cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

/// Find all math regions in `text`, ordered and disjoint.
///
/// An unterminated `$` produces no region; the fragment stays plain text.
pub fn scan_math_regions(text: &str) -> Vec<MathRegion> {
    if !text.contains('$') {
        return Vec::new();
    }

    let table = byte_to_char_table(text);
    math_content_rule()
        .pattern
        .find_iter(text)
        .map(|m| MathRegion {
            range: table[m.start()]..table[m.end()],
            display: m.as_str().starts_with("$$") && m.len() >= 4,
        })
        .collect()
}

/// Region containing `offset` strictly inside its outer bounds.
pub fn region_at(regions: &[MathRegion], offset: usize) -> Option<&MathRegion> {
    regions
        .iter()
        .find(|r| r.range.start < offset && offset < r.range.end)
}

/// Report whether the end of `preceding` lies inside unclosed math.
pub fn is_inside_math(preceding: &str) -> bool {
    math_mode(preceding).is_some()
}

/// Which math mode, if any, is open at the end of `preceding`.
///
/// Scans backward: `$$` toggles display math and consumes both chars, a lone
/// `$` toggles inline math unless display math is open.
pub fn math_mode(preceding: &str) -> Option<MathMode> {
    let mut in_display = false;
    let mut in_inline = false;

    let mut chars = preceding.chars().rev().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            continue;
        }
        if chars.peek() == Some(&'$') {
            chars.next();
            in_display = !in_display;
        } else if !in_display {
            in_inline = !in_inline;
        }
    }

    if in_display {
        Some(MathMode::Display)
    } else if in_inline {
        Some(MathMode::Inline)
    } else {
        None
    }
}

/// Cursor positions between the opening and closing delimiter runs of a span
/// source, e.g. `1..3` for `$ab$`. Both ends are valid cursor positions.
///
/// `None` when the source does not start and end with `$` or the runs overlap.
pub fn editable_interior(source: &str) -> Option<Range<usize>> {
    let chars: Vec<char> = source.chars().collect();
    let lead = chars.iter().take(2).take_while(|c| **c == '$').count();
    let trail = chars.iter().rev().take(2).take_while(|c| **c == '$').count();
    if lead == 0 || trail == 0 || lead + trail > chars.len() {
        return None;
    }
    let open = lead.min(trail);
    Some(open..chars.len() - open)
}
