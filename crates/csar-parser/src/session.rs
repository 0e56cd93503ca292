//! Per-document parsing state
//!
//! A [`ParsingSession`] lives for exactly one document parse. It owns the
//! ordered issue list and a FIFO queue of pending action records. Actions are
//! plain data chosen by the dialect; the document parser resolves them once
//! the main pass is over. Resolution only gets the [`Diagnostics`] half of
//! the session, so an action can report issues but never enqueue more work.

use crate::issue::{ErrorCode, ParsingIssue, Severity};
use csar_tree::Node;
use std::collections::VecDeque;

/// Issues reported for one document, in discovery order
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    file_name: String,
    issues: Vec<ParsingIssue>,
}

impl Diagnostics {
    /// Create an empty issue list for `file_name`
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            issues: Vec::new(),
        }
    }

    /// Name of the document being parsed
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Append an issue. Untagged issues are attributed to this document.
    pub fn report(&mut self, issue: ParsingIssue) {
        let issue = if issue.file_name.is_none() {
            issue.in_file(self.file_name.clone())
        } else {
            issue
        };
        self.issues.push(issue);
    }

    /// Report an error located at `node`
    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>, node: &Node) {
        self.report(ParsingIssue::error(code, message).at_node(node));
    }

    /// Report a warning located at `node`
    pub fn warning(&mut self, code: ErrorCode, message: impl Into<String>, node: &Node) {
        self.report(ParsingIssue::warning(code, message).at_node(node));
    }

    pub fn issues(&self) -> &[ParsingIssue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn into_issues(self) -> Vec<ParsingIssue> {
        self.issues
    }
}

/// Mutable state for one document parse
#[derive(Debug)]
pub struct ParsingSession<A = ()> {
    diagnostics: Diagnostics,
    deferred: VecDeque<A>,
}

impl<A> ParsingSession<A> {
    /// Create a fresh session for `file_name`
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            diagnostics: Diagnostics::new(file_name),
            deferred: VecDeque::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.diagnostics.file_name()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Append an issue to the session
    pub fn report(&mut self, issue: ParsingIssue) {
        self.diagnostics.report(issue);
    }

    /// Report an error located at `node`
    pub fn error(&mut self, code: ErrorCode, message: impl Into<String>, node: &Node) {
        self.diagnostics.error(code, message, node);
    }

    /// Report a warning located at `node`
    pub fn warning(&mut self, code: ErrorCode, message: impl Into<String>, node: &Node) {
        self.diagnostics.warning(code, message, node);
    }

    /// Queue an action to run after the main pass
    pub fn defer(&mut self, action: A) {
        self.deferred.push_back(action);
    }

    /// Actions queued so far, in enqueue order
    pub fn pending(&self) -> impl Iterator<Item = &A> {
        self.deferred.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.deferred.len()
    }

    /// Split the session once the main pass is complete
    pub fn into_parts(self) -> (Diagnostics, VecDeque<A>) {
        (self.diagnostics, self.deferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issues_keep_discovery_order() {
        let mut session: ParsingSession = ParsingSession::new("main.yaml");
        let node = Node::plain("x");
        session.warning(ErrorCode::UnrecognizedProperty, "first", &node);
        session.error(ErrorCode::TypeNotFound, "second", &node);
        session.warning(ErrorCode::UnrecognizedProperty, "first", &node);

        let messages: Vec<&str> = session
            .diagnostics()
            .issues()
            .iter()
            .map(|i| i.message.as_str())
            .collect();
        assert_eq!(messages, vec!["first", "second", "first"]);
        assert!(session.diagnostics().has_errors());
    }

    #[test]
    fn test_report_tags_file_name() {
        let mut diagnostics = Diagnostics::new("main.yaml");
        diagnostics.report(ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "a"));
        diagnostics.report(
            ParsingIssue::warning(ErrorCode::UnrecognizedProperty, "b").in_file("other.yaml"),
        );
        let files: Vec<_> = diagnostics
            .issues()
            .iter()
            .map(|i| i.file_name.as_deref())
            .collect();
        assert_eq!(files, vec![Some("main.yaml"), Some("other.yaml")]);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_deferred_queue_is_fifo() {
        let mut session = ParsingSession::new("main.yaml");
        session.defer("a");
        session.defer("b");
        session.defer("c");
        assert_eq!(session.pending_count(), 3);
        assert_eq!(session.pending().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        let (_, deferred) = session.into_parts();
        assert_eq!(deferred.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
