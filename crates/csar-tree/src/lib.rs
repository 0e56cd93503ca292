#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csar-tree
//!
//! Positioned node tree for YAML definition documents.
//!
//! This crate turns a character stream into exactly one root [`Node`] whose
//! scalars, mappings and sequences all carry start and end [`Mark`]s. The
//! tree is immutable once composed; element parsers only ever read it.

/// Composition of YAML text into a single root node.
pub mod compose;
/// Source marks for composed nodes.
pub mod mark;
/// Node model: scalars, mappings and sequences.
pub mod node;

pub use compose::compose;
pub use mark::Mark;
pub use node::{Entry, Node, NodeKind, NodeValue, Scalar, ScalarStyle};

use thiserror::Error;

/// Errors raised while composing a document into a node tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("{message}")]
    Syntax { message: String, mark: Mark },

    #[error("expected a single document in the stream, found another document at {mark}")]
    MultipleDocuments { mark: Mark },

    #[error("found duplicate mapping key '{key}' at {mark}")]
    DuplicateKey { key: String, mark: Mark },

    #[error("only scalar mapping keys are supported, found a {kind} key at {mark}")]
    UnsupportedKey { kind: NodeKind, mark: Mark },

    #[error("found undefined alias at {mark}")]
    UnknownAlias { mark: Mark },
}

impl ComposeError {
    /// Build a syntax error reported by the YAML scanner.
    pub fn syntax(message: impl Into<String>, mark: Mark) -> Self {
        Self::Syntax {
            message: message.into(),
            mark,
        }
    }

    /// Position in the source where composition stopped.
    pub fn mark(&self) -> Mark {
        match self {
            Self::Syntax { mark, .. }
            | Self::MultipleDocuments { mark }
            | Self::DuplicateKey { mark, .. }
            | Self::UnsupportedKey { mark, .. }
            | Self::UnknownAlias { mark } => *mark,
        }
    }
}
