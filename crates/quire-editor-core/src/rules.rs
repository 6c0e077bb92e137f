//! Highlight rule table.
//!
//! Each rule pairs a pattern with a category and a priority. Overlaps are
//! resolved by priority alone, so the order of the table does not affect the
//! highlighter's output.

use std::sync::LazyLock;

use regex::Regex;

/// Priority of the generic LaTeX command rule. Math token re-tagging never
/// overrides a char already claimed at this priority or above.
pub const LATEX_COMMAND_PRIORITY: u8 = 8;

/// Fixed priority assigned to variables, CJK text and numbers inside math.
pub const MATH_TOKEN_PRIORITY: u8 = 9;

/// Priority given to otherwise unclaimed chars inside a math region.
pub const MATH_CONTENT_PRIORITY: u8 = 1;

/// Highlight category of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Plain,
    LatexCommand,
    LatexEnvironment,
    LatexEscape,
    Brace,
    Script,
    MathDelimiter,
    MathContent,
    MathVariable,
    MathChinese,
    MathNumber,
    MarkdownHeading,
    MarkdownBold,
    MarkdownItalic,
    MarkdownCode,
    MarkdownList,
    MarkdownLink,
    QuestionBlank,
    QuestionOption,
    QuestionTag,
}

impl Category {
    /// Stable class name used by renderers. Plain text has no class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Plain => "",
            Category::LatexCommand => "latex-command",
            Category::LatexEnvironment => "latex-environment",
            Category::LatexEscape => "latex-escape",
            Category::Brace => "brace",
            Category::Script => "script",
            Category::MathDelimiter => "math-delimiter",
            Category::MathContent => "math-content",
            Category::MathVariable => "math-variable",
            Category::MathChinese => "math-chinese",
            Category::MathNumber => "math-number",
            Category::MarkdownHeading => "markdown-heading",
            Category::MarkdownBold => "markdown-bold",
            Category::MarkdownItalic => "markdown-italic",
            Category::MarkdownCode => "markdown-code",
            Category::MarkdownList => "markdown-list",
            Category::MarkdownLink => "markdown-link",
            Category::QuestionBlank => "question-blank",
            Category::QuestionOption => "question-option",
            Category::QuestionTag => "question-tag",
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Category::Plain)
    }

    /// Every category, in declaration order.
    pub const ALL: [Category; 20] = [
        Category::Plain,
        Category::LatexCommand,
        Category::LatexEnvironment,
        Category::LatexEscape,
        Category::Brace,
        Category::Script,
        Category::MathDelimiter,
        Category::MathContent,
        Category::MathVariable,
        Category::MathChinese,
        Category::MathNumber,
        Category::MarkdownHeading,
        Category::MarkdownBold,
        Category::MarkdownItalic,
        Category::MarkdownCode,
        Category::MarkdownList,
        Category::MarkdownLink,
        Category::QuestionBlank,
        Category::QuestionOption,
        Category::QuestionTag,
    ];
}

/// How the highlighter treats a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Applied by the generic priority pass.
    Generic,
    /// Marks math content. Skipped by the generic pass; its pattern drives
    /// the math region scanner instead.
    MathContent,
}

/// A single highlight rule.
#[derive(Debug)]
pub struct HighlightRule {
    pub pattern: Regex,
    pub category: Category,
    pub priority: u8,
    pub kind: RuleKind,
}

impl HighlightRule {
    fn new(pattern: &str, category: Category, priority: u8) -> Self {
        Self::with_kind(pattern, category, priority, RuleKind::Generic)
    }

    fn with_kind(pattern: &str, category: Category, priority: u8, kind: RuleKind) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("built-in highlight pattern must compile"),
            category,
            priority,
            kind,
        }
    }
}

static RULES: LazyLock<Vec<HighlightRule>> = LazyLock::new(|| {
    use Category::*;
    vec![
        HighlightRule::with_kind(
            r"(?s)\$\$.*?\$\$|\$[^$]+?\$",
            MathContent,
            MATH_CONTENT_PRIORITY,
            RuleKind::MathContent,
        ),
        HighlightRule::new(r"\\(?:begin|end)\{[A-Za-z*]+\}", LatexEnvironment, 10),
        HighlightRule::new(r"\\[A-Za-z]+", LatexCommand, LATEX_COMMAND_PRIORITY),
        HighlightRule::new(r"\\[^A-Za-z\s]", LatexEscape, LATEX_COMMAND_PRIORITY),
        HighlightRule::new(r"`[^`\n]+`", MarkdownCode, 7),
        HighlightRule::new(r"_{3,}|（[ \t　]*）|\([ \t　]+\)", QuestionBlank, 6),
        HighlightRule::new(r"(?m)^[ \t]*[A-H][.．、]", QuestionOption, 6),
        HighlightRule::new(r"【[^】\n]*】", QuestionTag, 6),
        HighlightRule::new(r"[{}]", Brace, 5),
        HighlightRule::new(r"[\^_]", Script, 5),
        HighlightRule::new(r"\*\*[^*\n]+\*\*", MarkdownBold, 4),
        HighlightRule::new(r"\[[^\]\n]*\]\([^)\n]*\)", MarkdownLink, 4),
        HighlightRule::new(r"(?m)^#{1,6}[ \t].*$", MarkdownHeading, 3),
        HighlightRule::new(r"\*[^*\n]+\*", MarkdownItalic, 3),
        HighlightRule::new(r"(?m)^[ \t]*(?:[-*+]|\d+\.)[ \t]", MarkdownList, 3),
    ]
});

/// The built-in rule table.
pub fn rules() -> &'static [HighlightRule] {
    &RULES
}

/// The math-content meta-rule.
pub fn math_content_rule() -> &'static HighlightRule {
    RULES
        .iter()
        .find(|rule| rule.kind == RuleKind::MathContent)
        .expect("rule table always carries the math-content rule")
}
