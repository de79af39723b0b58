//! Source location tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the source text, as reported by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line
    pub line: u32,
    /// 0-based column
    pub column: u32,
}

impl Span {
    /// Create a new span
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Create a dummy span (for synthesized nodes and tests)
    pub fn dummy() -> Self {
        Self::new(0, 0)
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
