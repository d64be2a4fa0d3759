//! Source location tracking

use serde::Serialize;

/// A span represents a range in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// 1-based line of the start offset
    pub line: usize,
    /// 1-based line of the end offset
    pub end_line: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: usize, end_line: usize) -> Self {
        Self { start, end, line, end_line }
    }

    /// Create a dummy span (for testing)
    pub fn dummy() -> Self {
        Self { start: 0, end: 0, line: 1, end_line: 1 }
    }

    /// Merge two spans
    pub fn merge(&self, other: &Span) -> Span {
        let (line, start) = if self.start <= other.start {
            (self.line, self.start)
        } else {
            (other.line, other.start)
        };
        let (end_line, end) = if self.end >= other.end {
            (self.end_line, self.end)
        } else {
            (other.end_line, other.end)
        };
        Span { start, end, line, end_line }
    }
}
