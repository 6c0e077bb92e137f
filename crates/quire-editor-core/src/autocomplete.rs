//! Command-prefix autocomplete.
//!
//! The token is the trailing `\letters` run before the cursor. Suggestions
//! are a plain prefix search over the symbol dictionary. Committing a
//! suggestion normalizes placeholders, wraps LaTeX in `$...$` when the
//! insertion point is outside math, and picks where the cursor lands.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::math::is_inside_math;
use crate::symbols::{SymbolCategory, SymbolEntry, search_prefix};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[A-Za-z]*$").expect("token pattern must compile"));

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[A-Za-z]+\}").expect("placeholder pattern must compile"));

static TRAILING_COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([A-Za-z]+)$").expect("command pattern must compile"));

/// Commands whose brace argument is kept verbatim on commit.
const STYLE_COMMANDS: &[&str] = &[
    "mathbb",
    "mathbf",
    "mathrm",
    "mathit",
    "mathcal",
    "mathfrak",
    "mathsf",
    "mathtt",
    "text",
    "textbf",
    "textit",
    "textrm",
    "operatorname",
    "boldsymbol",
    "bm",
];

/// Openers the cursor is placed after when the insertion has no `{}`.
const DELIMITER_OPENERS: &[&str] = &[r"\left(", r"\left[", r"\left\{"];

/// The trailing `\letters` token before the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToken {
    /// Token text including the backslash.
    pub text: SmolStr,
    /// Char offset of the backslash.
    pub start: usize,
    /// Char offset just past the token.
    pub end: usize,
}

impl CommandToken {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A dictionary entry matched against a live token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub entry: &'static SymbolEntry,
    pub token: CommandToken,
}

/// A splice to apply when a suggestion is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Char range of the document to replace.
    pub replace: Range<usize>,
    pub insert: String,
    /// Absolute char offset of the cursor after the splice.
    pub cursor: usize,
}

/// Extract the command token at the end of `text_before_cursor`.
pub fn extract_command_token(text_before_cursor: &str) -> Option<CommandToken> {
    let m = TOKEN_RE.find(text_before_cursor)?;
    let start = text_before_cursor[..m.start()].chars().count();
    Some(CommandToken {
        text: SmolStr::new(m.as_str()),
        start,
        end: start + m.as_str().len(),
    })
}

/// Suggestions for the token ending at the cursor, in dictionary order.
pub fn match_suggestions(text_before_cursor: &str) -> Vec<Suggestion> {
    let Some(token) = extract_command_token(text_before_cursor) else {
        return Vec::new();
    };
    let suggestions: Vec<Suggestion> = search_prefix(&token.text)
        .map(|entry| Suggestion {
            entry,
            token: token.clone(),
        })
        .collect();
    tracing::trace!(
        target: "quire::autocomplete",
        token = %token.text,
        matches = suggestions.len(),
        "matched suggestions"
    );
    suggestions
}

/// Build the splice for accepting `suggestion` with the cursor at `cursor`.
///
/// `text` is the whole document, used to decide whether the token sits
/// inside math.
pub fn complete(text: &str, cursor: usize, suggestion: &Suggestion) -> Completion {
    let entry = suggestion.entry;
    let start = suggestion.token.start;
    let replace = start..cursor.max(start);

    let raw = entry.insertion();
    let body = if entry.body.is_some() || is_environment(raw) {
        raw.to_string()
    } else {
        normalize_placeholders(raw)
    };

    let preceding: String = text.chars().take(start).collect();
    let wrap = entry.category == SymbolCategory::Latex && !is_inside_math(&preceding);

    let (insert, offset) = if wrap {
        let insert = format!("${body}$");
        let offset = match cursor_anchor(&body) {
            Some(anchor) => anchor + 1,
            None => insert.chars().count(),
        };
        (insert, offset)
    } else {
        let offset = cursor_anchor(&body).unwrap_or_else(|| body.chars().count());
        (body, offset)
    };

    tracing::debug!(
        target: "quire::autocomplete",
        trigger = entry.trigger,
        wrapped = wrap,
        "committing suggestion"
    );

    Completion {
        replace,
        insert,
        cursor: start + offset,
    }
}

fn is_environment(trigger: &str) -> bool {
    trigger.contains(r"\begin") || trigger.contains(r"\end")
}

/// Replace letter placeholders with `{}` unless they belong to a style
/// command.
fn normalize_placeholders(trigger: &str) -> String {
    let mut out = String::with_capacity(trigger.len());
    let mut last = 0;
    for m in PLACEHOLDER_RE.find_iter(trigger) {
        out.push_str(&trigger[last..m.start()]);
        if follows_style_command(&trigger[..m.start()]) {
            out.push_str(m.as_str());
        } else {
            out.push_str("{}");
        }
        last = m.end();
    }
    out.push_str(&trigger[last..]);
    out
}

fn follows_style_command(prefix: &str) -> bool {
    TRAILING_COMMAND_RE
        .captures(prefix)
        .and_then(|caps| caps.get(1))
        .is_some_and(|name| STYLE_COMMANDS.contains(&name.as_str()))
}

/// Char offset within `body` where the cursor should land, if a placeholder
/// pattern is present.
fn cursor_anchor(body: &str) -> Option<usize> {
    if let Some(idx) = body.find("{}") {
        return Some(body[..idx].chars().count() + 1);
    }
    DELIMITER_OPENERS
        .iter()
        .filter_map(|opener| body.find(opener).map(|idx| idx + opener.len()))
        .min()
        .map(|byte_end| body[..byte_end].chars().count())
}

/// Default number of suggestions shown.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 8;

/// Visible suggestion list with a selected row.
///
/// Escape hides the list until the token start changes.
#[derive(Debug, Clone)]
pub struct AutocompleteSession {
    suggestions: Vec<Suggestion>,
    selected: usize,
    max_suggestions: usize,
    dismissed_at: Option<usize>,
}

impl Default for AutocompleteSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS)
    }
}

impl AutocompleteSession {
    pub fn new(max_suggestions: usize) -> Self {
        Self {
            suggestions: Vec::new(),
            selected: 0,
            max_suggestions: max_suggestions.max(1),
            dismissed_at: None,
        }
    }

    /// Recompute suggestions for the text before the cursor. Returns whether
    /// the list is visible afterwards.
    pub fn update(&mut self, text_before_cursor: &str) -> bool {
        let mut suggestions = match_suggestions(text_before_cursor);
        let token_start = suggestions.first().map(|s| s.token.start);

        match (self.dismissed_at, token_start) {
            (Some(dismissed), Some(start)) if dismissed == start => {
                self.suggestions.clear();
                return false;
            }
            _ => self.dismissed_at = None,
        }

        suggestions.truncate(self.max_suggestions);
        let same_token = self.suggestions.first().map(|s| &s.token.text)
            == suggestions.first().map(|s| &s.token.text);
        if !same_token || self.selected >= suggestions.len() {
            self.selected = 0;
        }
        self.suggestions = suggestions;
        self.is_visible()
    }

    pub fn is_visible(&self) -> bool {
        !self.suggestions.is_empty()
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Suggestion> {
        self.suggestions.get(self.selected)
    }

    /// Move the selection down, wrapping to the top.
    pub fn select_next(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + 1) % self.suggestions.len();
        }
    }

    /// Move the selection up, wrapping to the bottom.
    pub fn select_prev(&mut self) {
        if !self.suggestions.is_empty() {
            let len = self.suggestions.len();
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Hide the list for the current token.
    pub fn dismiss(&mut self) {
        self.dismissed_at = self.suggestions.first().map(|s| s.token.start);
        self.clear();
    }

    /// Hide the list without remembering the token.
    pub fn clear(&mut self) {
        self.suggestions.clear();
        self.selected = 0;
    }

    /// Take the selected suggestion and hide the list.
    pub fn take_selected(&mut self) -> Option<Suggestion> {
        let picked = self.suggestions.get(self.selected).cloned();
        self.clear();
        picked
    }
}
