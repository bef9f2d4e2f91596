//! Source locations.
//!
//! Every AST node and every error carries a [`Span`]: the file it came from,
//! its byte range and the 1-based line/column of its first character.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;

/// Identifies one parsed file within a resolution session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    /// The id given to a file parsed on its own, outside a resolver session.
    pub const ROOT: FileId = FileId(0);
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A region of one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    /// 1-based line of `start`.
    pub line: u32,
    /// 1-based column of `start`, counted in characters.
    pub column: u32,
}

impl Span {
    /// Smallest span covering both `self` and `other`.
    ///
    /// Both spans must come from the same file.
    pub fn join(self, other: Span) -> Span {
        let first = if other.start < self.start { other } else { self };
        Span {
            file: self.file,
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of one file to [`Span`]s.
///
/// Cheap to clone; parser closures each hold their own copy.
#[derive(Debug, Clone)]
pub struct Locator {
    file: FileId,
    text: Arc<str>,
    line_starts: Arc<[usize]>,
}

impl Locator {
    pub fn new(file: FileId, text: &str) -> Self {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file,
            text: Arc::from(text),
            line_starts: line_starts.into(),
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based (line, column) of a byte offset. Offsets past the end clamp to it.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line_idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_idx];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        (line_idx as u32 + 1, column as u32 + 1)
    }

    pub fn span(&self, range: Range<usize>) -> Span {
        let (line, column) = self.position(range.start);
        Span {
            file: self.file,
            start: range.start,
            end: range.end,
            line,
            column,
        }
    }
}
