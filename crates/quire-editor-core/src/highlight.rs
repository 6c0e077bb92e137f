//! Tokenizing highlighter.
//!
//! Produces a run list that covers every char of the input exactly once.
//! Rules are folded into a per-char `(category, priority)` table where a
//! strictly higher priority wins, so rule order never changes the result.
//! Math regions then re-tag variables, CJK text and numbers, without touching
//! anything already claimed at LaTeX-command priority or above.

use std::ops::Range;

use smol_str::SmolStr;

use crate::math::{MathRegion, scan_math_regions};
use crate::rules::{
    Category, LATEX_COMMAND_PRIORITY, MATH_CONTENT_PRIORITY, MATH_TOKEN_PRIORITY, RuleKind, rules,
};
use crate::text::byte_to_char_table;

/// A maximal run of chars sharing one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRun {
    /// Char range in the source text.
    pub char_range: Range<usize>,
    /// The run's text, exactly as in the source.
    pub text: SmolStr,
    pub category: Category,
}

/// Result of one highlight pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlight {
    pub runs: Vec<HighlightRun>,
    /// Math regions found during the pass, reused by the span lifecycle.
    pub regions: Vec<MathRegion>,
}

impl Highlight {
    /// Concatenated run text. Always equal to the highlighted input.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Total length in chars.
    pub fn len_chars(&self) -> usize {
        self.runs.last().map(|run| run.char_range.end).unwrap_or(0)
    }

    /// Run containing the char at `offset`.
    pub fn run_at(&self, offset: usize) -> Option<&HighlightRun> {
        let idx = self
            .runs
            .partition_point(|run| run.char_range.end <= offset);
        self.runs.get(idx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    category: Category,
    priority: u8,
}

/// Highlight `text`, scanning its math regions first.
pub fn highlight(text: &str) -> Highlight {
    let regions = scan_math_regions(text);
    highlight_with_regions(text, regions)
}

/// Highlight `text` using already-scanned math regions.
pub fn highlight_with_regions(text: &str, regions: Vec<MathRegion>) -> Highlight {
    let chars: Vec<char> = text.chars().collect();
    let mut slots = vec![Slot::default(); chars.len()];

    apply_rules(text, &mut slots);
    for region in &regions {
        apply_math_region(&chars, region, &mut slots);
    }

    let runs = coalesce(text, &slots);
    check_coverage(&runs, chars.len());

    tracing::trace!(
        target: "quire::highlight",
        chars = chars.len(),
        runs = runs.len(),
        regions = regions.len(),
        "highlight pass"
    );

    Highlight { runs, regions }
}

fn apply_rules(text: &str, slots: &mut [Slot]) {
    let table = byte_to_char_table(text);
    for rule in rules().iter().filter(|r| r.kind == RuleKind::Generic) {
        for m in rule.pattern.find_iter(text) {
            // Zero-width matches cover nothing.
            if m.is_empty() {
                continue;
            }
            for slot in &mut slots[table[m.start()]..table[m.end()]] {
                if rule.priority > slot.priority {
                    slot.category = rule.category;
                    slot.priority = rule.priority;
                }
            }
        }
    }
}

fn apply_math_region(chars: &[char], region: &MathRegion, slots: &mut [Slot]) {
    let content = region.content_range();

    for idx in (region.range.start..content.start).chain(content.end..region.range.end) {
        claim_math(&mut slots[idx], Category::MathDelimiter);
    }

    let mut idx = content.start;
    while idx < content.end {
        let rest = &chars[idx..content.end];
        let (category, len) = match rest[0] {
            c if c.is_ascii_alphabetic() => (
                Category::MathVariable,
                run_len(rest, |c| c.is_ascii_alphabetic()),
            ),
            c if is_cjk(c) => (Category::MathChinese, run_len(rest, is_cjk)),
            c if c.is_ascii_digit() => (Category::MathNumber, number_len(rest)),
            _ => {
                idx += 1;
                continue;
            }
        };
        for slot in &mut slots[idx..idx + len] {
            claim_math(slot, category);
        }
        idx += len;
    }

    for slot in &mut slots[content] {
        if slot.priority == 0 {
            slot.category = Category::MathContent;
            slot.priority = MATH_CONTENT_PRIORITY;
        }
    }
}

fn claim_math(slot: &mut Slot, category: Category) {
    if slot.priority < LATEX_COMMAND_PRIORITY {
        slot.category = category;
        slot.priority = MATH_TOKEN_PRIORITY;
    }
}

fn run_len(chars: &[char], pred: impl Fn(char) -> bool) -> usize {
    chars.iter().take_while(|c| pred(**c)).count()
}

/// Length of a `\d+(\.\d+)?` run at the start of `chars`.
fn number_len(chars: &[char]) -> usize {
    let int_len = run_len(chars, |c| c.is_ascii_digit());
    match chars.get(int_len..int_len + 2) {
        Some(['.', d]) if d.is_ascii_digit() => {
            int_len + 1 + run_len(&chars[int_len + 1..], |c| c.is_ascii_digit())
        }
        _ => int_len,
    }
}

/// CJK ideographs and fullwidth CJK punctuation.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{3000}'..='\u{303F}'
        | '\u{FF00}'..='\u{FFEF}'
    )
}

fn coalesce(text: &str, slots: &[Slot]) -> Vec<HighlightRun> {
    let mut byte_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    byte_starts.push(text.len());

    let mut runs: Vec<HighlightRun> = Vec::new();
    let mut start = 0;
    for idx in 1..=slots.len() {
        let boundary = idx == slots.len() || slots[idx].category != slots[start].category;
        if boundary {
            runs.push(HighlightRun {
                char_range: start..idx,
                text: SmolStr::new(&text[byte_starts[start]..byte_starts[idx]]),
                category: slots[start].category,
            });
            start = idx;
        }
    }
    runs
}

fn check_coverage(runs: &[HighlightRun], expected_chars: usize) {
    if !cfg!(debug_assertions) {
        return;
    }
    let actual: usize = runs.iter().map(|run| run.text.chars().count()).sum();
    if actual != expected_chars {
        tracing::error!(
            target: "quire::highlight",
            expected_chars,
            actual,
            "highlight runs do not reproduce the input"
        );
    }
}
