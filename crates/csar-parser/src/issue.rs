//! Parsing diagnostics
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use csar_tree::{Mark, Node};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a parsing issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A document referenced by path does not exist
    MissingFile,
    /// A file or archive exists but could not be read
    FailedToReadFile,
    /// The character stream is not well-formed YAML
    InvalidYaml,
    /// The document is empty or structurally unusable
    SyntaxError,
    /// The archive container is not a supported format
    ErroneousArchiveFile,
    /// The metadata descriptor does not name an entry document
    EntryDefinitionNotFound,
    /// An archive without descriptor has zero or several root documents
    SingleDefinitionSupported,
    /// A mapping key is not part of the element's grammar
    UnrecognizedProperty,
    /// A node has the wrong shape (scalar/mapping/sequence)
    UnexpectedNodeKind,
    /// A mandatory field is absent
    MissingRequiredField,
    /// A scalar could not be converted to the expected type
    InvalidScalar,
    /// The document does not declare its definitions version
    MissingDefinitionsVersion,
    /// The declared definitions version is not supported
    UnknownDefinitionsVersion,
    /// A referenced type is not declared
    TypeNotFound,
    /// A type derives from itself, directly or transitively
    CyclicDerivedFrom,
    /// The archive has no name or version after metadata merge
    MissingArchiveMetadata,
    /// The archive version does not follow the version format
    InvalidArchiveVersion,
}

impl ErrorCode {
    /// Stable, machine-readable code string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingFile => "MISSING_FILE",
            Self::FailedToReadFile => "FAILED_TO_READ_FILE",
            Self::InvalidYaml => "INVALID_YAML",
            Self::SyntaxError => "SYNTAX_ERROR",
            Self::ErroneousArchiveFile => "ERRONEOUS_ARCHIVE_FILE",
            Self::EntryDefinitionNotFound => "ENTRY_DEFINITION_NOT_FOUND",
            Self::SingleDefinitionSupported => "SINGLE_DEFINITION_SUPPORTED",
            Self::UnrecognizedProperty => "UNRECOGNIZED_PROPERTY",
            Self::UnexpectedNodeKind => "UNEXPECTED_NODE_KIND",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::InvalidScalar => "INVALID_SCALAR",
            Self::MissingDefinitionsVersion => "MISSING_DEFINITIONS_VERSION",
            Self::UnknownDefinitionsVersion => "UNKNOWN_DEFINITIONS_VERSION",
            Self::TypeNotFound => "TYPE_NOT_FOUND",
            Self::CyclicDerivedFrom => "CYCLIC_DERIVED_FROM",
            Self::MissingArchiveMetadata => "MISSING_ARCHIVE_METADATA",
            Self::InvalidArchiveVersion => "INVALID_ARCHIVE_VERSION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a parsing issue
///
/// An error does not stop parsing, it marks the whole result as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

/// One diagnostic produced while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingIssue {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Mark>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Mark>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ParsingIssue {
    /// Create an issue with no position
    pub fn new(code: ErrorCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            detail: None,
            start: None,
            end: None,
            file_name: None,
            extra: None,
        }
    }

    /// Create an error issue
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Create a warning issue
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    /// Attach a source span
    pub fn at(mut self, start: Mark, end: Mark) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Attach the span of `node`
    pub fn at_node(self, node: &Node) -> Self {
        self.at(node.start, node.end)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Tag the issue with the file it was found in
    pub fn in_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ParsingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file_name, &self.start) {
            (Some(file), Some(start)) => write!(f, "{file}:{start}: ")?,
            (Some(file), None) => write!(f, "{file}: ")?,
            (None, Some(start)) => write!(f, "{start}: ")?,
            (None, None) => {}
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let issue = ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "unknown key 'foo'")
            .at(Mark::new(3, 2, 40, 40), Mark::new(3, 5, 43, 43))
            .with_detail("ignored")
            .with_extra("node_types")
            .in_file("main.yaml");

        assert_eq!(issue.severity, Severity::Warning);
        assert!(!issue.is_error());
        assert_eq!(issue.start.unwrap().line, 3);
        assert_eq!(issue.detail.as_deref(), Some("ignored"));
        assert_eq!(issue.extra.as_deref(), Some("node_types"));
        assert_eq!(issue.file_name.as_deref(), Some("main.yaml"));
    }

    #[test]
    fn test_display_with_position() {
        let issue = ParsingIssue::error(ErrorCode::SyntaxError, "Empty file.")
            .at(Mark::origin(), Mark::origin())
            .with_detail("No yaml content found in file.")
            .in_file("empty.yaml");
        assert_eq!(
            issue.to_string(),
            "empty.yaml:1:1: ERROR SYNTAX_ERROR: Empty file. (No yaml content found in file.)"
        );
    }

    #[test]
    fn test_display_without_position() {
        let issue = ParsingIssue::error(ErrorCode::ErroneousArchiveFile, "not a zip");
        assert_eq!(issue.to_string(), "ERROR ERRONEOUS_ARCHIVE_FILE: not a zip");
    }

    #[test]
    fn test_serialized_code_matches_as_str() {
        for code in [
            ErrorCode::MissingFile,
            ErrorCode::SingleDefinitionSupported,
            ErrorCode::UnknownDefinitionsVersion,
            ErrorCode::InvalidArchiveVersion,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let issue = ParsingIssue::error(ErrorCode::MissingFile, "File not found in archive.");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "ERROR");
        assert!(json.get("detail").is_none());
        assert!(json.get("start").is_none());
    }
}
