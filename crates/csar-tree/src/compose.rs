//! Single-document composer
//!
//! Builds a positioned [`Node`] tree from the YAML event stream. Only the
//! first document of a stream is accepted: a second document, a duplicate
//! mapping key, a non-scalar key or an alias to an unknown anchor stops
//! composition with a [`ComposeError`] carrying the offending mark.

use crate::ComposeError;
use crate::mark::Mark;
use crate::node::{Entry, Node, NodeValue, Scalar, ScalarStyle};
use std::collections::HashMap;
use tracing::trace;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Compose `source` into its root node.
///
/// Returns `Ok(None)` when the stream holds no document at all (empty,
/// whitespace-only or comment-only input).
pub fn compose(source: &str) -> Result<Option<Node>, ComposeError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut composer = Composer::new(source);
    let mut parser = Parser::new_from_str(source);

    if let Err(scan_error) = parser.load(&mut composer, true) {
        // an earlier composition error is closer to the real cause
        if let Some(error) = composer.error.take() {
            return Err(error);
        }
        let mark = composer.offsets.mark(scan_error.marker());
        return Err(ComposeError::syntax(scan_error.to_string(), mark));
    }

    composer.finish()
}

/// Maps character indexes to byte offsets for non-ASCII sources.
struct Offsets {
    boundaries: Option<Vec<usize>>,
    len: usize,
}

impl Offsets {
    fn new(source: &str) -> Self {
        let boundaries = (!source.is_ascii())
            .then(|| source.char_indices().map(|(offset, _)| offset).collect());
        Self {
            boundaries,
            len: source.len(),
        }
    }

    fn mark(&self, marker: &Marker) -> Mark {
        let index = marker.index();
        let offset = match &self.boundaries {
            None => index,
            Some(boundaries) => boundaries.get(index).copied().unwrap_or(self.len),
        };
        // the scanner counts lines from one and columns from zero
        Mark::new(marker.line().saturating_sub(1), marker.col(), index, offset)
    }
}

enum Frame {
    Mapping {
        start: Mark,
        anchor: usize,
        entries: Vec<Entry>,
        key: Option<Node>,
    },
    Sequence {
        start: Mark,
        anchor: usize,
        items: Vec<Node>,
    },
}

/// A scalar waits for the next event to learn where it ends.
struct PendingScalar {
    scalar: Scalar,
    start: Mark,
    anchor: usize,
}

struct Composer {
    offsets: Offsets,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    pending: Option<PendingScalar>,
    documents: usize,
    root: Option<Node>,
    error: Option<ComposeError>,
}

impl Composer {
    fn new(source: &str) -> Self {
        Self {
            offsets: Offsets::new(source),
            stack: Vec::new(),
            anchors: HashMap::new(),
            pending: None,
            documents: 0,
            root: None,
            error: None,
        }
    }

    fn finish(mut self) -> Result<Option<Node>, ComposeError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        trace!(documents = self.documents, "composition finished");
        Ok(self.root)
    }

    fn handle(&mut self, event: Event, mark: Mark) -> Result<(), ComposeError> {
        if let Some(pending) = self.pending.take() {
            let node = Node::new(NodeValue::Scalar(pending.scalar), pending.start, mark);
            self.complete(node, pending.anchor)?;
        }

        match event {
            Event::DocumentStart => {
                self.documents += 1;
                if self.documents > 1 {
                    return Err(ComposeError::MultipleDocuments { mark });
                }
            }
            Event::Alias(id) => {
                let node = self
                    .anchors
                    .get(&id)
                    .cloned()
                    .ok_or(ComposeError::UnknownAlias { mark })?;
                self.attach(node)?;
            }
            Event::Scalar(text, style, anchor, _) => {
                self.pending = Some(PendingScalar {
                    scalar: Scalar::new(text, scalar_style(style)),
                    start: mark,
                    anchor,
                });
            }
            Event::SequenceStart(anchor, ..) => self.stack.push(Frame::Sequence {
                start: mark,
                anchor,
                items: Vec::new(),
            }),
            Event::MappingStart(anchor, ..) => self.stack.push(Frame::Mapping {
                start: mark,
                anchor,
                entries: Vec::new(),
                key: None,
            }),
            Event::SequenceEnd | Event::MappingEnd => {
                let (node, anchor) = match self.stack.pop() {
                    Some(Frame::Sequence {
                        start,
                        anchor,
                        items,
                    }) => (Node::new(NodeValue::Sequence(items), start, mark), anchor),
                    Some(Frame::Mapping {
                        start,
                        anchor,
                        entries,
                        ..
                    }) => (Node::new(NodeValue::Mapping(entries), start, mark), anchor),
                    None => return Ok(()),
                };
                self.complete(node, anchor)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn complete(&mut self, node: Node, anchor: usize) -> Result<(), ComposeError> {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        self.attach(node)
    }

    fn attach(&mut self, node: Node) -> Result<(), ComposeError> {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(key) => entries.push(Entry { key, value: node }),
                None => {
                    let Some(text) = node.as_scalar().map(|s| s.text.clone()) else {
                        return Err(ComposeError::UnsupportedKey {
                            kind: node.kind(),
                            mark: node.start,
                        });
                    };
                    if entries.iter().any(|e| e.key_text() == text) {
                        return Err(ComposeError::DuplicateKey {
                            key: text,
                            mark: node.start,
                        });
                    }
                    *key = Some(node);
                }
            },
        }
        Ok(())
    }
}

impl MarkedEventReceiver for Composer {
    fn on_event(&mut self, event: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        let mark = self.offsets.mark(&marker);
        if let Err(error) = self.handle(event, mark) {
            trace!(%mark, "composition stopped: {}", error);
            self.error = Some(error);
        }
    }
}

fn scalar_style(style: TScalarStyle) -> ScalarStyle {
    match style {
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn root(source: &str) -> Node {
        compose(source).unwrap().expect("document should have a root")
    }

    #[test]
    fn test_empty_inputs_have_no_root() {
        assert_eq!(compose("").unwrap(), None);
        assert_eq!(compose("   \n\n  ").unwrap(), None);
        assert_eq!(compose("# only a comment\n").unwrap(), None);
    }

    #[test]
    fn test_mapping_keeps_document_order() {
        let node = root("zeta: 1\nalpha: 2\nmid: 3\n");
        let keys: Vec<&str> = node
            .as_mapping()
            .unwrap()
            .iter()
            .map(Entry::key_text)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_marks_are_zero_based() {
        let node = root("name: web\nversion: 1.0\n");
        let version = node.entry("version").unwrap();
        assert_eq!(version.key.start.line, 1);
        assert_eq!(version.key.start.column, 0);
        assert_eq!(version.value.start.line, 1);
        assert_eq!(version.value.start.column, 9);
        assert_eq!(version.value.start.index, 19);
    }

    #[test]
    fn test_scalar_end_follows_start() {
        let node = root("a: hello\nb: world\n");
        let value = node.get("a").unwrap();
        assert!(value.end > value.start);
        assert!(node.end >= node.get("b").unwrap().end);
    }

    #[test]
    fn test_nested_sequence() {
        let node = root("items:\n  - one\n  - two\n");
        let items = node.get("items").unwrap();
        assert_eq!(items.kind(), NodeKind::Sequence);
        let texts: Vec<&str> = items
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Node::as_str)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_scalar_styles() {
        let node = root("a: plain\nb: 'single'\nc: \"double\"\nd: |\n  literal\n");
        let style = |key: &str| node.get(key).unwrap().as_scalar().unwrap().style;
        assert_eq!(style("a"), ScalarStyle::Plain);
        assert_eq!(style("b"), ScalarStyle::SingleQuoted);
        assert_eq!(style("c"), ScalarStyle::DoubleQuoted);
        assert_eq!(style("d"), ScalarStyle::Literal);
    }

    #[test]
    fn test_byte_offsets_for_multibyte_text() {
        let node = root("name: é\nnext: x\n");
        let next = node.entry("next").unwrap();
        assert_eq!(next.key.start.index, 8);
        assert_eq!(next.key.start.offset, 9);
    }

    #[test]
    fn test_bom_is_ignored() {
        let node = root("\u{feff}name: web\n");
        assert_eq!(node.get("name").and_then(Node::as_str), Some("web"));
    }

    #[test]
    fn test_alias_expands_anchor() {
        let node = root("base: &b\n  x: 1\ncopy: *b\n");
        assert_eq!(node.get("base"), node.get("copy"));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let error = compose("name: a\nname: b\n").unwrap_err();
        match error {
            ComposeError::DuplicateKey { key, mark } => {
                assert_eq!(key, "name");
                assert_eq!(mark.line, 1);
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_documents_are_rejected() {
        let error = compose("a: 1\n---\nb: 2\n").unwrap_err();
        assert!(matches!(error, ComposeError::MultipleDocuments { .. }));
        assert_eq!(error.mark().line, 1);
    }

    #[test]
    fn test_complex_key_is_rejected() {
        let error = compose("? [a, b]\n: value\n").unwrap_err();
        assert!(matches!(
            error,
            ComposeError::UnsupportedKey {
                kind: NodeKind::Sequence,
                ..
            }
        ));
    }

    #[test]
    fn test_syntax_error_carries_position() {
        let error = compose("name: [unclosed\nother: 1\n").unwrap_err();
        assert!(matches!(error, ComposeError::Syntax { .. }));
        assert!(error.mark().line >= 1);
    }

    #[test]
    fn test_explicit_empty_document_is_null_root() {
        let node = root("---\n");
        assert!(node.is_null());
    }
}
