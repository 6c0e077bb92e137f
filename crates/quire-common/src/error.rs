//! Error types for quire applications

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use quire_editor_core::EditorError;
use std::path::{Path, PathBuf};

/// Main error type for quire operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum QuireError {
    /// Engine rejected an offset, range or span id
    #[error(transparent)]
    #[diagnostic(code(quire::editor))]
    Editor(#[from] EditorError),

    /// Config file could not be parsed
    #[error(transparent)]
    #[diagnostic_source]
    Parse(#[from] ParseError),

    /// Serialization error
    #[error(transparent)]
    #[diagnostic_source]
    Serde(#[from] SerDeError),

    /// IO error
    #[error("{context}")]
    #[diagnostic(code(quire::io))]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file has an extension we can't read
    #[error("unsupported config format: {}", path.display())]
    #[diagnostic(code(quire::config::format), help("use a .toml or .json file"))]
    UnsupportedFormat { path: PathBuf },

    /// The platform has no config directory
    #[error("could not determine a config directory")]
    #[diagnostic(code(quire::config::dir), help("pass --config with an explicit path"))]
    NoConfigDir,
}

impl QuireError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Config parse error pointing into the offending file
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("invalid config: {message}")]
#[diagnostic(code(quire::config::parse))]
pub struct ParseError {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    location: Option<SourceSpan>,
}

impl ParseError {
    pub fn from_toml(path: &Path, src: String, err: &toml::de::Error) -> Self {
        let location = err
            .span()
            .map(|span| SourceSpan::new(span.start.into(), span.len()));
        Self {
            message: err.message().to_string(),
            src: NamedSource::new(path.display().to_string(), src),
            location,
        }
    }

    pub fn from_json(path: &Path, src: String, err: &serde_json::Error) -> Self {
        // serde_json reports 1-based lines and columns; 0 means unknown.
        let location = (err.line() > 0).then(|| {
            let offset = SourceOffset::from_location(&src, err.line(), err.column().max(1));
            SourceSpan::new(offset, 1)
        });
        Self {
            message: err.to_string(),
            src: NamedSource::new(path.display().to_string(), src),
            location,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<SourceSpan> {
        self.location
    }
}

/// Serialization/deserialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_error_points_at_value() {
        let src = "[editor]\nmax_suggestions = \n".to_string();
        let err = toml::from_str::<toml::Value>(&src).expect_err("incomplete");
        let parsed = ParseError::from_toml(Path::new("config.toml"), src, &err);
        assert!(parsed.location().is_some());
        assert!(!parsed.message().is_empty());
    }

    #[test]
    fn json_error_location() {
        let src = "{\n  \"editor\": ]\n}".to_string();
        let err = serde_json::from_str::<serde_json::Value>(&src).expect_err("bad json");
        let parsed = ParseError::from_json(Path::new("config.json"), src, &err);
        let location = parsed.location().expect("located");
        // Somewhere on the second line.
        assert!(location.offset() > 2 && location.offset() < 16);
    }

    #[test]
    fn editor_errors_convert() {
        let err: QuireError = EditorError::InvalidOffset { offset: 9, len: 3 }.into();
        assert!(matches!(err, QuireError::Editor(_)));
    }
}
