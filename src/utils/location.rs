//! Source location tracking for error reporting.
//!
//! Every statement and expression in the input tree carries a [`Span`] so that
//! a rejected construct can be reported at the place it was written.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A position in source code (line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of file
    pub offset: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Location of the first character of a file.
    pub fn start() -> Self {
        Self { line: 1, column: 1, offset: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open region of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Byte offset of start
    pub start_offset: usize,
    /// Byte offset of end
    pub end_offset: usize,
}

impl Span {
    /// Create a span from line/column pairs (no byte offsets).
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Create a span from start and end locations.
    pub fn from_locations(start: SourceLocation, end: SourceLocation) -> Self {
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            start_offset: start.offset,
            end_offset: end.offset,
        }
    }

    /// Attach byte offsets to a span.
    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    /// Span for trees built by hand rather than parsed.
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Check if this span is a dummy span.
    pub fn is_dummy(&self) -> bool {
        self.start_line == 0 && self.end_line == 0
    }

    /// Get the start location.
    pub fn start(&self) -> SourceLocation {
        SourceLocation::new(self.start_line, self.start_column, self.start_offset)
    }

    /// Get the end location.
    pub fn end(&self) -> SourceLocation {
        SourceLocation::new(self.end_line, self.end_column, self.end_offset)
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// A dummy span is the identity, so hand-built trees can be merged freely.
    pub fn merge(&self, other: &Span) -> Span {
        if self.is_dummy() {
            return *other;
        }
        if other.is_dummy() {
            return *self;
        }
        let start = if self.start_offset <= other.start_offset { self.start() } else { other.start() };
        let end = if self.end_offset >= other.end_offset { self.end() } else { other.end() };
        Span::from_locations(start, end)
    }

    /// Length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            write!(f, "<generated>")
        } else if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_column, self.end_line, self.end_column
            )
        }
    }
}
