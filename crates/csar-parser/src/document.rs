//! Document orchestration
//!
//! Drives one document through composition, dialect dispatch, the main
//! parse pass and the deferred drain, in that order, on the calling thread.

use crate::element::ElementParser;
use crate::issue::{ErrorCode, ParsingIssue};
use crate::result::ParsingResult;
use crate::session::{Diagnostics, ParsingSession};
use crate::{ParsingError, Result};
use csar_tree::{ComposeError, Mark, Node, compose};
use std::io;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Parses a whole document into a `T`
///
/// Implementors supply the dialect dispatch ([`DocumentParser::select_parser`])
/// and the resolution of their pending actions ([`DocumentParser::resolve`]);
/// the provided methods implement loading, composition and the deferred pass.
pub trait DocumentParser<T> {
    /// Pending action record queued by this document's element parsers
    type Action;

    /// Pick the element parser for the dialect `root` is written in.
    ///
    /// An unusable discriminator should be reported to the session and a
    /// fallback parser returned.
    fn select_parser(
        &self,
        root: &Node,
        session: &mut ParsingSession<Self::Action>,
    ) -> Result<&dyn ElementParser<T, Self::Action>>;

    /// Run one pending action against the fully parsed value
    fn resolve(
        &self,
        action: Self::Action,
        value: &mut T,
        diagnostics: &mut Diagnostics,
    ) -> Result<()>;

    /// Parse the file at `path`, optionally merging into `instance`
    fn parse_file(&self, path: &Path, instance: Option<T>) -> Result<ParsingResult<T>> {
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        trace!(path = %path.display(), "reading document");
        let bytes = std::fs::read(path).map_err(|e| read_failure(&file_name, path, &e))?;
        self.parse_bytes(&file_name, &bytes, instance)
    }

    /// Parse raw bytes named `file_name`
    fn parse_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        instance: Option<T>,
    ) -> Result<ParsingResult<T>> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ParsingError::new(
                file_name,
                ParsingIssue::error(ErrorCode::FailedToReadFile, "File is not valid UTF-8 text.")
                    .with_detail(e.to_string()),
            )
        })?;
        self.parse_str(file_name, text, instance)
    }

    /// Parse document text named `file_name`
    fn parse_str(&self, file_name: &str, text: &str, instance: Option<T>) -> Result<ParsingResult<T>> {
        let root = compose(text)
            .map_err(|e| invalid_yaml(file_name, &e))?
            .ok_or_else(|| empty_document(file_name))?;
        self.parse_node(file_name, &root, instance)
    }

    /// Parse an already composed root node
    fn parse_node(&self, file_name: &str, root: &Node, instance: Option<T>) -> Result<ParsingResult<T>> {
        let mut session = ParsingSession::new(file_name);
        let parser = self
            .select_parser(root, &mut session)
            .map_err(|e| e.with_file_name(file_name))?;

        let parsed = match (parser.updating(), instance) {
            (Some(updating), Some(existing)) => {
                debug!(file = file_name, "parsing into existing instance");
                updating.parse_into(root, &mut session, existing)
            }
            _ => parser.parse(root, &mut session),
        };
        let mut value = parsed.map_err(|e| e.with_file_name(file_name))?;

        let (mut diagnostics, deferred) = session.into_parts();
        debug!(file = file_name, pending = deferred.len(), "draining deferred actions");
        for action in deferred {
            self.resolve(action, &mut value, &mut diagnostics)
                .map_err(|e| e.with_file_name(file_name))?;
        }

        let issues = diagnostics.into_issues();
        debug!(file = file_name, issues = issues.len(), "document parsed");
        Ok(ParsingResult::new(Some(value), issues))
    }
}

fn read_failure(file_name: &str, path: &Path, error: &io::Error) -> ParsingError {
    let issue = if error.kind() == io::ErrorKind::NotFound {
        ParsingIssue::error(ErrorCode::MissingFile, "File not found in archive.")
    } else {
        ParsingIssue::error(ErrorCode::FailedToReadFile, "Problem happened while accessing file.")
            .with_detail(error.to_string())
    };
    warn!(path = %path.display(), "unable to read document: {}", error);
    ParsingError::new(file_name, issue.with_extra(path.display().to_string()))
}

fn invalid_yaml(file_name: &str, error: &ComposeError) -> ParsingError {
    let mark = error.mark();
    warn!(file = file_name, %mark, "document is not valid yaml: {}", error);
    ParsingError::new(
        file_name,
        ParsingIssue::error(ErrorCode::InvalidYaml, error.to_string()).at(mark, mark),
    )
}

fn empty_document(file_name: &str) -> ParsingError {
    ParsingError::new(
        file_name,
        ParsingIssue::error(ErrorCode::SyntaxError, "Empty file.")
            .at(Mark::origin(), Mark::origin())
            .with_detail("No yaml content found in file."),
    )
}
