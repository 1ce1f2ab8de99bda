//! Line and column lookup for byte offsets.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A 1-based line/column position, as reported in GraphQL error `locations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets of a source string to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Builds an index of line starts for `source`.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            memchr::memchr_iter(b'\n', source.as_bytes())
                .map(|pos| u32::try_from(pos + 1).unwrap_or(u32::MAX)),
        );
        Self { line_starts }
    }

    /// Returns the location of a byte offset.
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = offset - self.line_starts[line];
        Location {
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            column: column + 1,
        }
    }

    /// Returns the location of the start of a span.
    #[must_use]
    pub fn span_location(&self, span: Span) -> Location {
        self.location(span.start)
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
