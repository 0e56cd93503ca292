//! Parsing result

use crate::issue::{ParsingIssue, Severity};
use serde::Serialize;

/// Parsed value together with every issue found while producing it
///
/// The value may be present even when errors were reported; callers must
/// check [`ParsingResult::has_errors`] before using it downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsingResult<T> {
    /// Parsed value (best effort when errors were reported)
    pub value: Option<T>,

    /// Issues in discovery order
    pub issues: Vec<ParsingIssue>,
}

impl<T> ParsingResult<T> {
    /// Create a result from a value and its issues
    pub fn new(value: Option<T>, issues: Vec<ParsingIssue>) -> Self {
        Self { value, issues }
    }

    /// Create an issue-free result
    pub fn ok(value: T) -> Self {
        Self::new(Some(value), Vec::new())
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn issues(&self) -> &[ParsingIssue] {
        &self.issues
    }

    /// Check if any issue has error severity
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ParsingIssue::is_error)
    }

    /// A value is present and no error was reported
    pub fn is_success(&self) -> bool {
        self.value.is_some() && !self.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Append an issue after the existing ones
    pub fn push_issue(&mut self, issue: ParsingIssue) {
        self.issues.push(issue);
    }

    /// Insert issues found before the ones already recorded
    pub fn prepend_issues(&mut self, issues: Vec<ParsingIssue>) {
        self.issues.splice(0..0, issues);
    }

    /// Transform the value, keeping the issues
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParsingResult<U> {
        ParsingResult {
            value: self.value.map(f),
            issues: self.issues,
        }
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::ErrorCode;

    #[test]
    fn test_ok_result_is_success() {
        let result = ParsingResult::ok(42);
        assert!(result.is_success());
        assert_eq!(result.value(), Some(&42));
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn test_errors_fail_result_but_keep_value() {
        let result = ParsingResult::new(
            Some("partial"),
            vec![
                ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "w"),
                ParsingIssue::error(ErrorCode::TypeNotFound, "e"),
            ],
        );
        assert!(result.has_errors());
        assert!(!result.is_success());
        assert_eq!(result.value(), Some(&"partial"));
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_warnings_only_is_success() {
        let result = ParsingResult::new(
            Some(()),
            vec![ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "w")],
        );
        assert!(result.is_success());
    }

    #[test]
    fn test_prepend_keeps_relative_order() {
        let mut result = ParsingResult::new(
            Some(()),
            vec![ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "c")],
        );
        result.prepend_issues(vec![
            ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "a"),
            ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "b"),
        ]);
        result.push_issue(ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "d"));
        let order: Vec<&str> = result.issues().iter().map(|i| i.message.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_map_keeps_issues() {
        let result = ParsingResult::new(
            Some(2),
            vec![ParsingIssue::error(ErrorCode::InvalidScalar, "e")],
        )
        .map(|v| v * 10);
        assert_eq!(result.value, Some(20));
        assert_eq!(result.issues.len(), 1);
    }
}
