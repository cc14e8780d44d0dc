//! Text geometry: character ranges and line/column conversion.
//!
//! All offsets are counted in chars (Unicode scalar values), matching how the
//! diff engine tokenizes text. Byte offsets are only used internally to slice
//! line contents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open `[start, end)` range of char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {start}..{end}");
        Self { start, end }
    }

    pub fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Overlap with `other`, or `None` when the overlap would be empty.
    pub fn intersect(&self, other: TextRange) -> Option<TextRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TextRange { start, end })
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Zero-based line and char column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct LinePosition {
    pub line: usize,
    pub column: usize,
}

impl LinePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy)]
struct LineSpan {
    char_start: usize,
    char_len: usize,
    byte_start: usize,
    byte_len: usize,
}

/// Line table over a fixed text.
///
/// Line content excludes the terminator; a `\r` directly before `\n` counts as
/// part of the terminator.
#[derive(Debug, Clone)]
pub struct LineIndex {
    lines: Vec<LineSpan>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut char_start = 0usize;
        let mut byte_start = 0usize;
        let mut chars = 0usize;

        for (byte, ch) in text.char_indices() {
            chars += 1;
            if ch == '\n' {
                let mut span = LineSpan {
                    char_start,
                    char_len: chars - 1 - char_start,
                    byte_start,
                    byte_len: byte - byte_start,
                };
                if text[byte_start..byte].ends_with('\r') {
                    span.char_len -= 1;
                    span.byte_len -= 1;
                }
                lines.push(span);
                char_start = chars;
                byte_start = byte + 1;
            }
        }

        lines.push(LineSpan {
            char_start,
            char_len: chars - char_start,
            byte_start,
            byte_len: text.len() - byte_start,
        });

        Self { lines, len: chars }
    }

    /// Total length of the indexed text in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of lines; an empty text has one empty line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Char length of `line` without its terminator, or 0 past the last line.
    pub fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map_or(0, |span| span.char_len)
    }

    /// Offset of the end of `line` (just before its terminator).
    pub fn line_end(&self, line: usize) -> usize {
        match self.lines.get(line) {
            Some(span) => span.char_start + span.char_len,
            None => self.len,
        }
    }

    /// Offset of `position`, clamping the column to the line end and the line
    /// to the end of the text.
    pub fn offset_of(&self, position: LinePosition) -> usize {
        match self.lines.get(position.line) {
            Some(span) => span.char_start + position.column.min(span.char_len),
            None => self.len,
        }
    }

    /// Line/column of `offset`, clamped to the end of the text.
    pub fn position_of(&self, offset: usize) -> LinePosition {
        let offset = offset.min(self.len);
        let line = match self
            .lines
            .binary_search_by(|span| span.char_start.cmp(&offset))
        {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let span = self.lines[line];
        LinePosition {
            line,
            column: (offset - span.char_start).min(span.char_len),
        }
    }

    /// Content of `line` within `text`, which must be the text this index was
    /// built from.
    pub fn line_text<'a>(&self, text: &'a str, line: usize) -> &'a str {
        self.lines
            .get(line)
            .and_then(|span| text.get(span.byte_start..span.byte_start + span.byte_len))
            .unwrap_or("")
    }
}
