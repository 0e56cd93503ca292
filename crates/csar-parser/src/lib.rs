#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csar-parser
//!
//! Generic tree-parsing engine for definition documents.
//!
//! A [`DocumentParser`] composes one document into a positioned tree, picks
//! the [`ElementParser`] for the document's dialect, runs it against a fresh
//! [`ParsingSession`], then drains the session's deferred actions so that
//! forward references resolve against the fully parsed value. Problems local
//! to a node are accumulated as [`ParsingIssue`]s; only conditions that leave
//! nothing to attach an issue to surface as a fatal [`ParsingError`].
//!
//! ## Example Usage
//!
//! ```rust
//! use csar_parser::{DocumentParser, Diagnostics, ElementParser, ParsingSession, StringParser};
//! use csar_tree::Node;
//!
//! struct NameDocument;
//!
//! impl DocumentParser<Option<String>> for NameDocument {
//!     type Action = ();
//!
//!     fn select_parser(
//!         &self,
//!         _root: &Node,
//!         _session: &mut ParsingSession<()>,
//!     ) -> csar_parser::Result<&dyn ElementParser<Option<String>, ()>> {
//!         Ok(&StringParser)
//!     }
//!
//!     fn resolve(&self, _: (), _: &mut Option<String>, _: &mut Diagnostics) -> csar_parser::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let result = NameDocument.parse_str("name.yaml", "hello", None).unwrap();
//! assert!(result.is_success());
//! assert_eq!(result.value, Some(Some("hello".to_string())));
//! ```

pub mod document;
pub mod element;
pub mod issue;
pub mod result;
pub mod session;

pub use document::DocumentParser;
pub use element::{
    BooleanParser, ElementParser, ListParser, MapParser, StringParser, UpdatingElementParser,
    expect_mapping, expect_scalar, unrecognized_key,
};
pub use issue::{ErrorCode, ParsingIssue, Severity};
pub use result::ParsingResult;
pub use session::{Diagnostics, ParsingSession};

use thiserror::Error;

/// A fatal parsing failure
///
/// Raised only when no tree or session exists to attach a recoverable issue
/// to. Always carries exactly one issue; each boundary it crosses may
/// re-annotate the file name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse {file_name}: {issue}")]
pub struct ParsingError {
    /// File the failure is attributed to
    pub file_name: String,

    /// The single issue describing the failure
    pub issue: Box<ParsingIssue>,
}

impl ParsingError {
    /// Create a fatal error for `file_name`
    pub fn new(file_name: impl Into<String>, issue: ParsingIssue) -> Self {
        let file_name = file_name.into();
        let issue = if issue.file_name.is_none() {
            issue.in_file(file_name.clone())
        } else {
            issue
        };
        Self {
            file_name,
            issue: Box::new(issue),
        }
    }

    /// Re-attribute the failure to `file_name`
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        if self.issue.file_name.is_none() {
            self.issue.file_name = Some(self.file_name.clone());
        }
        self
    }

    /// Kind of the failure
    pub fn code(&self) -> ErrorCode {
        self.issue.code
    }
}

/// Result type for operations that may fail fatally
pub type Result<T> = std::result::Result<T, ParsingError>;
