//! Text buffer abstraction for editor storage.
//!
//! The `TextBuffer` trait provides a common interface for text storage so the
//! surface can be driven by a rope locally or by a host-owned buffer.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;
use web_time::Instant;

use crate::types::EditInfo;

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Get info about the last edit operation, if any.
    fn last_edit(&self) -> Option<EditInfo>;
}

/// Ropey-backed text buffer for local editing.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
    last_edit: Option<EditInfo>,
}

impl EditorRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
            last_edit: None,
        }
    }

    /// Text before `char_offset`, clamped to the buffer length.
    pub fn text_before(&self, char_offset: usize) -> String {
        let end = char_offset.min(self.rope.len_chars());
        self.rope.slice(..end).to_string()
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        let contains_newline = text.contains('\n');

        self.rope.insert(char_offset, text);

        self.last_edit = Some(EditInfo {
            edit_char_pos: char_offset,
            inserted_len: text.chars().count(),
            deleted_len: 0,
            contains_newline,
            doc_len_after: self.rope.len_chars(),
            timestamp: Instant::now(),
        });
    }

    fn delete(&mut self, char_range: Range<usize>) {
        let contains_newline = self
            .slice(char_range.clone())
            .map(|s| s.contains('\n'))
            .unwrap_or(false);
        let deleted_len = char_range.len();

        self.rope.remove(char_range.clone());

        self.last_edit = Some(EditInfo {
            edit_char_pos: char_range.start,
            inserted_len: 0,
            deleted_len,
            contains_newline,
            doc_len_after: self.rope.len_chars(),
            timestamp: Instant::now(),
        });
    }

    // A replace is recorded as one edit so span shifting sees a single delta.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        let deleted_newline = self
            .slice(char_range.clone())
            .map(|s| s.contains('\n'))
            .unwrap_or(false);
        let deleted_len = char_range.len();

        self.rope.remove(char_range.clone());
        self.rope.insert(char_range.start, text);

        self.last_edit = Some(EditInfo {
            edit_char_pos: char_range.start,
            inserted_len: text.chars().count(),
            deleted_len,
            contains_newline: deleted_newline || text.contains('\n'),
            doc_len_after: self.rope.len_chars(),
            timestamp: Instant::now(),
        });
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn last_edit(&self) -> Option<EditInfo> {
        self.last_edit.clone()
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

/// Map every byte offset of `text` to the char offset it falls in.
///
/// The returned table has `text.len() + 1` entries so match ends convert too.
pub(crate) fn byte_to_char_table(text: &str) -> Vec<usize> {
    let mut table = Vec::with_capacity(text.len() + 1);
    for (char_idx, ch) in text.chars().enumerate() {
        for _ in 0..ch.len_utf8() {
            table.push(char_idx);
        }
    }
    table.push(text.chars().count());
    table
}
