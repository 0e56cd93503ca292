//! Source marks for composed nodes
#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source document
///
/// `line` and `column` are zero-based. `Display` renders them one-based, the
/// way editors show them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Mark {
    /// Line number (0-indexed)
    pub line: usize,

    /// Column number (0-indexed, in characters)
    pub column: usize,

    /// Character index from the start of the document
    pub index: usize,

    /// Byte offset from the start of the document
    pub offset: usize,
}

impl Mark {
    /// Create a new mark
    pub const fn new(line: usize, column: usize, index: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            index,
            offset,
        }
    }

    /// The very start of a document.
    pub const fn origin() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}
