//! Stylesheet for highlight categories and math spans.

use std::fmt::Write;

use quire_editor_core::Category;

use crate::html::CLASS_PREFIX;

/// Colours for the highlight overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub text: &'static str,
    pub muted: &'static str,
    pub command: &'static str,
    pub environment: &'static str,
    pub math: &'static str,
    pub variable: &'static str,
    pub number: &'static str,
    pub markdown: &'static str,
    pub question: &'static str,
    pub error: &'static str,
    pub surface: &'static str,
}

impl Palette {
    /// rose-pine-dawn
    pub const fn light() -> Self {
        Self {
            text: "#575279",
            muted: "#9893a5",
            command: "#286983",
            environment: "#907aa9",
            math: "#56949f",
            variable: "#d7827e",
            number: "#ea9d34",
            markdown: "#907aa9",
            question: "#b4637a",
            error: "#b4637a",
            surface: "#fffaf3",
        }
    }

    /// rose-pine
    pub const fn dark() -> Self {
        Self {
            text: "#e0def4",
            muted: "#6e6a86",
            command: "#31748f",
            environment: "#c4a7e7",
            math: "#9ccfd8",
            variable: "#ebbcba",
            number: "#f6c177",
            markdown: "#c4a7e7",
            question: "#eb6f92",
            error: "#eb6f92",
            surface: "#1f1d2e",
        }
    }

    fn color(&self, category: Category) -> &'static str {
        match category {
            Category::Plain => self.text,
            Category::LatexCommand | Category::LatexEscape => self.command,
            Category::LatexEnvironment => self.environment,
            Category::Brace | Category::Script | Category::MathDelimiter => self.muted,
            Category::MathContent => self.math,
            Category::MathVariable | Category::MathChinese => self.variable,
            Category::MathNumber => self.number,
            Category::MarkdownHeading
            | Category::MarkdownBold
            | Category::MarkdownItalic
            | Category::MarkdownCode
            | Category::MarkdownList
            | Category::MarkdownLink => self.markdown,
            Category::QuestionBlank | Category::QuestionOption | Category::QuestionTag => {
                self.question
            }
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}

fn extra_rules(category: Category) -> &'static str {
    match category {
        Category::MarkdownHeading | Category::MarkdownBold => " font-weight: 600;",
        Category::MarkdownItalic | Category::MathVariable => " font-style: italic;",
        Category::QuestionBlank => " text-decoration: underline;",
        Category::LatexEnvironment => " font-weight: 600;",
        _ => "",
    }
}

/// One rule per highlight category, plus the math span states.
pub fn generate_highlight_css(palette: &Palette) -> String {
    let mut css = String::from("/* Highlight categories */\n");
    for category in Category::ALL.into_iter().filter(|c| !c.is_plain()) {
        let _ = writeln!(
            css,
            ".{CLASS_PREFIX}{} {{ color: {};{} }}",
            category.as_str(),
            palette.color(category),
            extra_rules(category),
        );
    }

    let _ = write!(
        css,
        r#"
/* Math spans */
.math-span {{
    border-radius: 3px;
}}

.math-editing {{
    background: {surface};
    color: {text};
}}

.math-rendering {{
    cursor: pointer;
}}

.math-display {{
    display: block;
    text-align: center;
    margin: 0.5em 0;
}}

.math-error {{
    color: {error};
    text-decoration: wavy underline {error};
}}
"#,
        surface = palette.surface,
        text = palette.text,
        error = palette.error,
    );
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_rule() {
        let css = generate_highlight_css(&Palette::default());
        for category in Category::ALL.into_iter().filter(|c| !c.is_plain()) {
            let selector = format!(".hl-{} {{", category.as_str());
            assert!(css.contains(&selector), "missing {selector}");
        }
        assert!(!css.contains(".hl- {"));
    }

    #[test]
    fn dark_palette_changes_colours() {
        let css = generate_highlight_css(&Palette::dark());
        assert!(css.contains(".hl-latex-command { color: #31748f; }"));
        assert!(css.contains(".hl-math-variable { color: #ebbcba; font-style: italic; }"));
        assert!(css.contains("wavy underline #eb6f92"));
    }
}
