//! Type hierarchy resolution
//!
//! `derived_from` and property type references are recorded while the
//! document is read and checked once every type in it is known, so a type
//! may name a parent declared further down the file.

use crate::model::{TypeDefinition, TypeKind};
use csar_tree::Mark;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Reference queued during the main pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PendingResolution {
    /// `type_name` declares `derived_from: parent`
    DerivedFrom {
        kind: TypeKind,
        type_name: String,
        parent: String,
        start: Mark,
        end: Mark,
    },
    /// Property `property` of `owner` is typed `type_name`
    PropertyType {
        owner_kind: TypeKind,
        owner: String,
        property: String,
        type_name: String,
        start: Mark,
        end: Mark,
    },
}

impl PendingResolution {
    /// Source range of the reference
    pub fn span(&self) -> (Mark, Mark) {
        match self {
            PendingResolution::DerivedFrom { start, end, .. }
            | PendingResolution::PropertyType { start, end, .. } => (*start, *end),
        }
    }
}

/// Why an ancestor chain could not be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lineage {
    /// The direct parent is neither declared nor normative
    Missing(String),
    /// The walk came back to the starting type; holds the loop in walk order
    Cyclic(Vec<String>),
}

const PRIMITIVE_TYPES: &[&str] = &[
    "string",
    "integer",
    "float",
    "boolean",
    "timestamp",
    "version",
    "range",
    "list",
    "map",
    "scalar-unit.size",
    "scalar-unit.time",
];

/// Normative node types and their parents
const NORMATIVE_NODE_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.nodes.Root", None),
    ("tosca.nodes.Compute", Some("tosca.nodes.Root")),
    ("tosca.nodes.SoftwareComponent", Some("tosca.nodes.Root")),
    ("tosca.nodes.WebServer", Some("tosca.nodes.SoftwareComponent")),
    ("tosca.nodes.WebApplication", Some("tosca.nodes.Root")),
    ("tosca.nodes.DBMS", Some("tosca.nodes.SoftwareComponent")),
    ("tosca.nodes.Database", Some("tosca.nodes.Root")),
    ("tosca.nodes.BlockStorage", Some("tosca.nodes.Root")),
    ("tosca.nodes.ObjectStorage", Some("tosca.nodes.Root")),
];

/// Normative data types and their parents
const NORMATIVE_DATA_TYPES: &[(&str, Option<&str>)] = &[
    ("tosca.datatypes.Root", None),
    ("tosca.datatypes.Credential", Some("tosca.datatypes.Root")),
    ("tosca.datatypes.TimeInterval", Some("tosca.datatypes.Root")),
    ("tosca.datatypes.network.NetworkInfo", Some("tosca.datatypes.Root")),
    ("tosca.datatypes.network.PortInfo", Some("tosca.datatypes.Root")),
    ("tosca.datatypes.network.PortDef", Some("integer")),
    ("tosca.datatypes.network.PortSpec", Some("tosca.datatypes.Root")),
];

/// Whether `name` is a built-in value type
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// Parent of a normative type; `None` when `name` is not normative
pub fn normative_parent(kind: TypeKind, name: &str) -> Option<Option<&'static str>> {
    let table = match kind {
        TypeKind::NodeType => NORMATIVE_NODE_TYPES,
        TypeKind::DataType => NORMATIVE_DATA_TYPES,
    };
    table
        .iter()
        .find(|(normative, _)| *normative == name)
        .map(|(_, parent)| *parent)
}

/// Whether `name` can be referenced as a type of `kind` without a declaration
pub fn is_builtin(kind: TypeKind, name: &str) -> bool {
    normative_parent(kind, name).is_some() || (kind == TypeKind::DataType && is_primitive(name))
}

/// Ancestors of `name`, nearest first
///
/// Declared types take precedence over normative ones of the same name.
/// Data types may bottom out in a primitive. Only a missing direct parent is
/// reported; a missing ancestor further up ends the chain. A loop that does
/// not pass through `name` also ends the chain, it is reported for the types
/// that are part of it.
pub fn derived_from_chain(
    types: &BTreeMap<String, TypeDefinition>,
    kind: TypeKind,
    name: &str,
) -> Result<Vec<String>, Lineage> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = parent_of(types, kind, name).flatten();

    while let Some(current) = next {
        if current == name {
            let mut path = vec![name.to_string()];
            path.extend(chain);
            path.push(name.to_string());
            return Err(Lineage::Cyclic(path));
        }
        if !seen.insert(current.clone()) {
            break;
        }
        match parent_of(types, kind, &current) {
            Some(parent) => {
                chain.push(current);
                next = parent;
            }
            None if chain.is_empty() => return Err(Lineage::Missing(current)),
            None => break,
        }
    }
    Ok(chain)
}

/// `Some(parent)` when `name` is known, `None` when it is not
fn parent_of(
    types: &BTreeMap<String, TypeDefinition>,
    kind: TypeKind,
    name: &str,
) -> Option<Option<String>> {
    if let Some(declared) = types.get(name) {
        return Some(declared.derived_from.clone());
    }
    if kind == TypeKind::DataType && is_primitive(name) {
        return Some(None);
    }
    normative_parent(kind, name).map(|parent| parent.map(str::to_string))
}
