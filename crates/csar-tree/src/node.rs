//! Node types for composed definition documents
#![allow(clippy::must_use_candidate)]

use crate::mark::Mark;
use serde::Serialize;
use std::fmt;

/// A node in the composed tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Node content
    pub value: NodeValue,

    /// Position of the first character of the node
    pub start: Mark,

    /// Position just past the node
    pub end: Mark,
}

/// Content of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum NodeValue {
    /// Scalar text
    Scalar(Scalar),

    /// Ordered mapping with unique scalar keys
    Mapping(Vec<Entry>),

    /// Ordered sequence
    Sequence(Vec<Node>),
}

/// Shape of a node, without its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Scalar,
    Mapping,
    Sequence,
}

/// A scalar value as written in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scalar {
    /// Scalar text after unescaping and folding
    pub text: String,

    /// How the scalar was written
    pub style: ScalarStyle,
}

/// Presentation style of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// One key/value pair of a mapping node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Key node, always a scalar
    pub key: Node,

    /// Value node
    pub value: Node,
}

impl Node {
    /// Create a node spanning `start..end`
    pub fn new(value: NodeValue, start: Mark, end: Mark) -> Self {
        Self { value, start, end }
    }

    /// Create a plain scalar node at the document origin
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(
            NodeValue::Scalar(Scalar::new(text, ScalarStyle::Plain)),
            Mark::origin(),
            Mark::origin(),
        )
    }

    /// Shape of this node
    pub fn kind(&self) -> NodeKind {
        match &self.value {
            NodeValue::Scalar(_) => NodeKind::Scalar,
            NodeValue::Mapping(_) => NodeKind::Mapping,
            NodeValue::Sequence(_) => NodeKind::Sequence,
        }
    }

    /// Scalar content, if this is a scalar
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            NodeValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Scalar text, if this is a non-null scalar
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar()
            .filter(|scalar| !scalar.is_null())
            .map(|scalar| scalar.text.as_str())
    }

    /// Mapping entries, if this is a mapping
    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match &self.value {
            NodeValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Sequence items, if this is a sequence
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// True for null scalars (`~`, `null`, or an empty plain value)
    pub fn is_null(&self) -> bool {
        self.as_scalar().is_some_and(Scalar::is_null)
    }

    /// Find a mapping entry by key
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.as_mapping()?.iter().find(|e| e.key_text() == key)
    }

    /// Find a mapping value by key
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }
}

impl Scalar {
    /// Create a new scalar
    pub fn new(text: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Null is only recognised for plain scalars; `'null'` stays a string.
    pub fn is_null(&self) -> bool {
        self.style == ScalarStyle::Plain
            && matches!(self.text.as_str(), "" | "~" | "null" | "Null" | "NULL")
    }
}

impl Entry {
    /// Key text. Keys are always scalars once composed.
    pub fn key_text(&self) -> &str {
        self.key.as_scalar().map_or("", |s| s.text.as_str())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
        };
        f.write_str(name)
    }
}
