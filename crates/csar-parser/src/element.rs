//! Element parser capability and the reusable building blocks
//!
//! An [`ElementParser`] turns one node into a value. Problems local to the
//! node are reported to the session and a best-effort value is returned;
//! `Err` is reserved for failures that make the rest of the document
//! meaningless.

use crate::Result;
use crate::issue::{ErrorCode, ParsingIssue};
use crate::session::{Diagnostics, ParsingSession};
use csar_tree::{Entry, Node, NodeKind};

/// Parses a node into a `T`
///
/// `A` is the pending action record the parser may queue on the session.
pub trait ElementParser<T, A = ()> {
    /// Parse `node` into a fresh value
    fn parse(&self, node: &Node, session: &mut ParsingSession<A>) -> Result<T>;

    /// The merge-capable view of this parser, if it has one
    fn updating(&self) -> Option<&dyn UpdatingElementParser<T, A>> {
        None
    }
}

/// An element parser that can also merge a node into an existing value
pub trait UpdatingElementParser<T, A = ()>: ElementParser<T, A> {
    /// Parse `node` into `existing`, keeping fields the node does not set
    fn parse_into(&self, node: &Node, session: &mut ParsingSession<A>, existing: T) -> Result<T>;
}

/// Mapping entries of `node`; a null node reads as an empty mapping.
///
/// Any other shape is reported and yields `None`.
pub fn expect_mapping<'n>(
    node: &'n Node,
    diagnostics: &mut Diagnostics,
    context: &str,
) -> Option<&'n [Entry]> {
    if node.is_null() {
        return Some(&[]);
    }
    match node.as_mapping() {
        Some(entries) => Some(entries),
        None => {
            report_kind(node, NodeKind::Mapping, diagnostics, context);
            None
        }
    }
}

/// Scalar text of `node`; `None` for null scalars and reported shapes.
pub fn expect_scalar<'n>(
    node: &'n Node,
    diagnostics: &mut Diagnostics,
    context: &str,
) -> Option<&'n str> {
    match node.kind() {
        NodeKind::Scalar => node.as_str(),
        _ => {
            report_kind(node, NodeKind::Scalar, diagnostics, context);
            None
        }
    }
}

/// Warn about a key that is not part of `context`'s grammar
pub fn unrecognized_key(entry: &Entry, diagnostics: &mut Diagnostics, context: &str) {
    diagnostics.report(
        ParsingIssue::warning(
            ErrorCode::UnrecognizedProperty,
            format!("Unrecognized key '{}' in {context}.", entry.key_text()),
        )
        .at_node(&entry.key)
        .with_detail("The key is ignored."),
    );
}

fn report_kind(node: &Node, expected: NodeKind, diagnostics: &mut Diagnostics, context: &str) {
    diagnostics.report(
        ParsingIssue::error(
            ErrorCode::UnexpectedNodeKind,
            format!("Expected a {expected} for {context}, found a {}.", node.kind()),
        )
        .at_node(node),
    );
}

/// Scalar text; null scalars parse to `None`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

impl<A> ElementParser<Option<String>, A> for StringParser {
    fn parse(&self, node: &Node, session: &mut ParsingSession<A>) -> Result<Option<String>> {
        Ok(expect_scalar(node, session.diagnostics_mut(), "a text value").map(str::to_string))
    }
}

/// YAML 1.2 core-schema booleans
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanParser;

impl<A> ElementParser<Option<bool>, A> for BooleanParser {
    fn parse(&self, node: &Node, session: &mut ParsingSession<A>) -> Result<Option<bool>> {
        let Some(text) = expect_scalar(node, session.diagnostics_mut(), "a boolean") else {
            return Ok(None);
        };
        match text {
            "true" | "True" | "TRUE" => Ok(Some(true)),
            "false" | "False" | "FALSE" => Ok(Some(false)),
            other => {
                session.error(
                    ErrorCode::InvalidScalar,
                    format!("'{other}' is not a boolean, expected true or false."),
                    node,
                );
                Ok(None)
            }
        }
    }
}

/// Sequence of elements parsed with an inner parser
#[derive(Debug, Clone, Default)]
pub struct ListParser<P> {
    inner: P,
}

impl<P> ListParser<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<T, A, P: ElementParser<T, A>> ElementParser<Vec<T>, A> for ListParser<P> {
    fn parse(&self, node: &Node, session: &mut ParsingSession<A>) -> Result<Vec<T>> {
        if node.is_null() {
            return Ok(Vec::new());
        }
        let Some(items) = node.as_sequence() else {
            report_kind(node, NodeKind::Sequence, session.diagnostics_mut(), "a list");
            return Ok(Vec::new());
        };
        items
            .iter()
            .map(|item| self.inner.parse(item, session))
            .collect()
    }
}

/// Mapping of names to elements parsed with an inner parser, in document order
#[derive(Debug, Clone, Default)]
pub struct MapParser<P> {
    inner: P,
}

impl<P> MapParser<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<T, A, P: ElementParser<T, A>> ElementParser<Vec<(String, T)>, A> for MapParser<P> {
    fn parse(&self, node: &Node, session: &mut ParsingSession<A>) -> Result<Vec<(String, T)>> {
        let Some(entries) = expect_mapping(node, session.diagnostics_mut(), "a map") else {
            return Ok(Vec::new());
        };
        entries
            .iter()
            .map(|entry| {
                let value = self.inner.parse(&entry.value, session)?;
                Ok((entry.key_text().to_string(), value))
            })
            .collect()
    }
}
