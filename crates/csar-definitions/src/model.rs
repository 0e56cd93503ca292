//! Definitions model

use crate::dialect::Dialect;
use csar_tree::Node;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Root of a parsed entry document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchiveRoot {
    pub archive: Archive,
    pub imports: Vec<String>,
    pub node_types: BTreeMap<String, TypeDefinition>,
    pub data_types: BTreeMap<String, TypeDefinition>,
}

/// Archive-level metadata
///
/// `name`, `version` and `template_author` are overwritten by the archive
/// descriptor when one is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Archive {
    pub name: Option<String>,
    pub version: Option<String>,
    pub template_author: Option<String>,
    pub description: Option<String>,
    /// Raw `tosca_definitions_version` value as written
    pub definitions_version: Option<String>,
    /// Dialect the document was parsed with
    pub dialect: Option<Dialect>,
    /// Free-form metadata entries
    pub tags: BTreeMap<String, String>,
}

/// Which type table a type lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    NodeType,
    DataType,
}

impl TypeKind {
    /// Top-level section holding types of this kind
    pub const fn section(self) -> &'static str {
        match self {
            TypeKind::NodeType => "node_types",
            TypeKind::DataType => "data_types",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::NodeType => f.write_str("node type"),
            TypeKind::DataType => f.write_str("data type"),
        }
    }
}

/// A node type or data type declared in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub derived_from: Option<String>,
    /// Ancestors from direct parent upwards, filled in after the main pass
    pub derived_from_chain: Vec<String>,
    pub description: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            derived_from: None,
            derived_from_chain: Vec::new(),
            description: None,
            properties: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A property declared on a type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub type_name: Option<String>,
    pub entry_schema: Option<String>,
    pub required: bool,
    pub default: Option<Node>,
    pub description: Option<String>,
    /// Constraint clauses as written; they are not evaluated here
    pub constraints: Vec<Node>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            entry_schema: None,
            required: true,
            default: None,
            description: None,
            constraints: Vec::new(),
        }
    }
}

impl ArchiveRoot {
    /// Type table for `kind`
    pub fn types(&self, kind: TypeKind) -> &BTreeMap<String, TypeDefinition> {
        match kind {
            TypeKind::NodeType => &self.node_types,
            TypeKind::DataType => &self.data_types,
        }
    }

    pub fn types_mut(&mut self, kind: TypeKind) -> &mut BTreeMap<String, TypeDefinition> {
        match kind {
            TypeKind::NodeType => &mut self.node_types,
            TypeKind::DataType => &mut self.data_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_defaults_to_required() {
        let property = PropertyDefinition::new("port");
        assert!(property.required);
        assert!(property.type_name.is_none());
    }

    #[test]
    fn test_types_by_kind() {
        let mut root = ArchiveRoot::default();
        root.types_mut(TypeKind::DataType).insert(
            "my.Port".to_string(),
            TypeDefinition::new("my.Port", TypeKind::DataType),
        );
        assert!(root.types(TypeKind::NodeType).is_empty());
        assert!(root.types(TypeKind::DataType).contains_key("my.Port"));
        assert_eq!(TypeKind::DataType.section(), "data_types");
    }
}
