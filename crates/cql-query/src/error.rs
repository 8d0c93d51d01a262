//! The error returned for rejected queries.
//!
//! Every failure, whether a malformed token, an illegal field/operator pair, an
//! invalid value or unconsumed trailing input, is reported as one
//! [`QueryError`]. Its fields are diagnostics only.

use thiserror::Error;

use crate::combinator::Failure;

/// A query that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query could not be parsed")]
pub struct QueryError {
    /// Byte offset into [`query`](Self::query) of the furthest failure point.
    pub position: usize,
    /// What the grammar expected at that point.
    pub expected: &'static str,
    /// The case-folded query that was parsed.
    pub query: String,
}

impl QueryError {
    /// Creates an error from a grammar failure in `query`.
    pub(crate) fn new(failure: Failure, query: impl Into<String>) -> Self {
        Self {
            position: failure.position,
            expected: failure.expected,
            query: query.into(),
        }
    }

    /// Character column of the failure point.
    pub fn column(&self) -> usize {
        let end = self.position.min(self.query.len());
        self.query
            .get(..end)
            .map_or(end, |prefix| prefix.chars().count())
    }

    /// Formats the error with a position indicator showing where the error occurred.
    pub fn format_with_context(&self) -> String {
        let mut result = String::new();
        result.push_str(&format!("{self}: expected {}\n", self.expected));
        result.push_str(&format!("  {}\n", self.query));
        result.push_str(&format!("  {}^", " ".repeat(self.column())));
        result
    }
}
