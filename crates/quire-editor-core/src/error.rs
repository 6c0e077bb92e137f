//! Editor error type.

use std::ops::Range;

use crate::span::SpanId;

/// Errors returned by editor operations that take caller-supplied offsets
/// or span ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("char range {}..{} is out of bounds for a document of {len} chars", range.start, range.end)]
    InvalidRange { range: Range<usize>, len: usize },

    #[error("offset {offset} is out of bounds for a document of {len} chars")]
    InvalidOffset { offset: usize, len: usize },

    #[error("no math span with id {0}")]
    UnknownSpan(SpanId),
}

impl EditorError {
    /// Check `range` against a document of `len` chars.
    pub fn check_range(range: &Range<usize>, len: usize) -> Result<(), EditorError> {
        if range.start > range.end || range.end > len {
            return Err(EditorError::InvalidRange {
                range: range.clone(),
                len,
            });
        }
        Ok(())
    }

    /// Check `offset` against a document of `len` chars.
    pub fn check_offset(offset: usize, len: usize) -> Result<(), EditorError> {
        if offset > len {
            return Err(EditorError::InvalidOffset { offset, len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_checks() {
        assert!(EditorError::check_range(&(0..3), 3).is_ok());
        assert_eq!(
            EditorError::check_range(&(2..5), 3),
            Err(EditorError::InvalidRange { range: 2..5, len: 3 })
        );
        assert!(EditorError::check_offset(3, 3).is_ok());
        assert!(EditorError::check_offset(4, 3).is_err());
    }

    #[test]
    fn test_messages() {
        let err = EditorError::InvalidRange { range: 2..5, len: 3 };
        assert_eq!(
            err.to_string(),
            "char range 2..5 is out of bounds for a document of 3 chars"
        );
        assert_eq!(EditorError::UnknownSpan(SpanId(7)).to_string(), "no math span with id m7");
    }
}
