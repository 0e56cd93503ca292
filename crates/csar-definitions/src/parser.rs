//! Per-dialect parsers for definitions documents

use crate::dialect::{Dialect, MetadataLayout};
use crate::inheritance::{Lineage, PendingResolution, derived_from_chain, is_builtin};
use crate::model::{ArchiveRoot, PropertyDefinition, TypeDefinition, TypeKind};
use csar_parser::{
    BooleanParser, Diagnostics, DocumentParser, ElementParser, ErrorCode, ParsingIssue,
    ParsingSession, Result, Severity, StringParser, UpdatingElementParser, expect_mapping,
    expect_scalar, unrecognized_key,
};
use csar_tree::{Entry, Node, NodeKind};
use tracing::{debug, trace};

type Session = ParsingSession<PendingResolution>;

/// Type body keys of the full grammar that this model does not carry
const IGNORED_TYPE_KEYS: &[&str] = &[
    "abstract",
    "artifacts",
    "attributes",
    "capabilities",
    "constraints",
    "interfaces",
    "metadata",
    "requirements",
    "tags",
    "version",
];

/// Parses an entry document written in one dialect
#[derive(Debug, Clone, Copy)]
pub struct DefinitionsParser {
    dialect: Dialect,
}

impl DefinitionsParser {
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn fill(&self, node: &Node, session: &mut Session, root: &mut ArchiveRoot) -> Result<()> {
        root.archive.dialect = Some(self.dialect);
        let Some(entries) = expect_mapping(node, session.diagnostics_mut(), "the definitions document")
        else {
            return Ok(());
        };

        for entry in entries {
            let value = &entry.value;
            match (entry.key_text(), self.dialect.metadata_layout()) {
                (Dialect::DISCRIMINATOR, _) => {
                    root.archive.definitions_version =
                        expect_scalar(value, session.diagnostics_mut(), "the definitions version")
                            .map(str::to_string);
                }
                ("description", _) => {
                    root.archive.description = StringParser.parse(value, session)?;
                }
                ("imports", _) => {
                    root.imports = parse_imports(value, session.diagnostics_mut());
                }
                ("node_types", _) => self.parse_types(value, TypeKind::NodeType, session, root)?,
                ("data_types", _) => self.parse_types(value, TypeKind::DataType, session, root)?,
                ("template_name", MetadataLayout::Flat) => {
                    root.archive.name = StringParser.parse(value, session)?;
                }
                ("template_version", MetadataLayout::Flat) => {
                    root.archive.version = StringParser.parse(value, session)?;
                }
                ("template_author", MetadataLayout::Flat) => {
                    root.archive.template_author = StringParser.parse(value, session)?;
                }
                ("metadata", MetadataLayout::Nested) => parse_metadata(value, session, root)?,
                _ => unrecognized_key(entry, session.diagnostics_mut(), "the definitions document"),
            }
        }
        Ok(())
    }

    fn parse_types(
        &self,
        node: &Node,
        kind: TypeKind,
        session: &mut Session,
        root: &mut ArchiveRoot,
    ) -> Result<()> {
        let Some(entries) = expect_mapping(node, session.diagnostics_mut(), kind.section()) else {
            return Ok(());
        };
        for entry in entries {
            let definition = parse_type(entry, kind, session)?;
            trace!(kind = %kind, name = %definition.name, "parsed type");
            root.types_mut(kind).insert(definition.name.clone(), definition);
        }
        Ok(())
    }
}

impl ElementParser<ArchiveRoot, PendingResolution> for DefinitionsParser {
    fn parse(&self, node: &Node, session: &mut Session) -> Result<ArchiveRoot> {
        let mut root = ArchiveRoot::default();
        self.fill(node, session, &mut root)?;
        Ok(root)
    }

    fn updating(&self) -> Option<&dyn UpdatingElementParser<ArchiveRoot, PendingResolution>> {
        Some(self)
    }
}

impl UpdatingElementParser<ArchiveRoot, PendingResolution> for DefinitionsParser {
    fn parse_into(
        &self,
        node: &Node,
        session: &mut Session,
        mut existing: ArchiveRoot,
    ) -> Result<ArchiveRoot> {
        self.fill(node, session, &mut existing)?;
        Ok(existing)
    }
}

fn parse_imports(node: &Node, diagnostics: &mut Diagnostics) -> Vec<String> {
    if node.is_null() {
        return Vec::new();
    }
    let Some(items) = node.as_sequence() else {
        diagnostics.error(
            ErrorCode::UnexpectedNodeKind,
            format!("Expected a sequence for imports, found a {}.", node.kind()),
            node,
        );
        return Vec::new();
    };

    let mut imports = Vec::new();
    for item in items {
        match item.kind() {
            NodeKind::Scalar => imports.extend(item.as_str().map(str::to_string)),
            // `- name: file` form
            NodeKind::Mapping => {
                for import in item.as_mapping().unwrap_or_default() {
                    let target = expect_scalar(&import.value, diagnostics, "an import");
                    imports.extend(target.map(str::to_string));
                }
            }
            NodeKind::Sequence => {
                diagnostics.error(
                    ErrorCode::UnexpectedNodeKind,
                    "Expected a scalar or a mapping for an import, found a sequence.",
                    item,
                );
            }
        }
    }
    imports
}

fn parse_metadata(node: &Node, session: &mut Session, root: &mut ArchiveRoot) -> Result<()> {
    let Some(entries) = expect_mapping(node, session.diagnostics_mut(), "metadata") else {
        return Ok(());
    };
    for entry in entries {
        let value = StringParser.parse(&entry.value, session)?;
        match entry.key_text() {
            "template_name" => root.archive.name = value,
            "template_version" => root.archive.version = value,
            "template_author" => root.archive.template_author = value,
            tag => {
                if let Some(value) = value {
                    root.archive.tags.insert(tag.to_string(), value);
                }
            }
        }
    }
    Ok(())
}

fn parse_type(entry: &Entry, kind: TypeKind, session: &mut Session) -> Result<TypeDefinition> {
    let mut definition = TypeDefinition::new(entry.key_text(), kind);
    let context = format!("{kind} '{}'", definition.name);
    let Some(fields) = expect_mapping(&entry.value, session.diagnostics_mut(), &context) else {
        return Ok(definition);
    };

    for field in fields {
        match field.key_text() {
            "derived_from" => {
                let parent = expect_scalar(&field.value, session.diagnostics_mut(), "derived_from")
                    .map(str::to_string);
                if let Some(parent) = &parent {
                    session.defer(PendingResolution::DerivedFrom {
                        kind,
                        type_name: definition.name.clone(),
                        parent: parent.clone(),
                        start: field.value.start,
                        end: field.value.end,
                    });
                }
                definition.derived_from = parent;
            }
            "description" => definition.description = StringParser.parse(&field.value, session)?,
            "properties" => {
                let Some(properties) =
                    expect_mapping(&field.value, session.diagnostics_mut(), "properties")
                else {
                    continue;
                };
                for property in properties {
                    let parsed = parse_property(property, &definition, session)?;
                    definition.properties.push(parsed);
                }
            }
            key if IGNORED_TYPE_KEYS.contains(&key) => {
                trace!(key, name = %definition.name, "skipping type section");
            }
            _ => unrecognized_key(field, session.diagnostics_mut(), &context),
        }
    }
    Ok(definition)
}

fn parse_property(
    entry: &Entry,
    owner: &TypeDefinition,
    session: &mut Session,
) -> Result<PropertyDefinition> {
    let mut property = PropertyDefinition::new(entry.key_text());
    let context = format!("property '{}'", property.name);
    let Some(fields) = expect_mapping(&entry.value, session.diagnostics_mut(), &context) else {
        return Ok(property);
    };

    for field in fields {
        let value = &field.value;
        match field.key_text() {
            "type" => {
                property.type_name = StringParser.parse(value, session)?;
                if let Some(type_name) = &property.type_name {
                    defer_property_type(session, owner, &property.name, type_name, value);
                }
            }
            "entry_schema" => {
                // either `entry_schema: string` or `entry_schema: { type: string }`
                let schema_type = if value.kind() == NodeKind::Mapping {
                    value.get("type").unwrap_or(value)
                } else {
                    value
                };
                property.entry_schema = StringParser.parse(schema_type, session)?;
                if let Some(type_name) = &property.entry_schema {
                    defer_property_type(session, owner, &property.name, type_name, schema_type);
                }
            }
            "required" => {
                if let Some(required) = BooleanParser.parse(value, session)? {
                    property.required = required;
                }
            }
            "default" => property.default = Some(value.clone()),
            "description" => property.description = StringParser.parse(value, session)?,
            "constraints" => match value.as_sequence() {
                Some(items) => property.constraints = items.to_vec(),
                None if value.is_null() => {}
                None => session.error(
                    ErrorCode::UnexpectedNodeKind,
                    format!("Expected a sequence for constraints, found a {}.", value.kind()),
                    value,
                ),
            },
            "status" => {}
            _ => unrecognized_key(field, session.diagnostics_mut(), &context),
        }
    }

    if property.type_name.is_none() {
        session.report(
            ParsingIssue::error(
                ErrorCode::MissingRequiredField,
                format!(
                    "Property '{}' of {} '{}' has no type.",
                    property.name, owner.kind, owner.name
                ),
            )
            .at(entry.key.start, entry.value.end),
        );
    }
    Ok(property)
}

fn defer_property_type(
    session: &mut Session,
    owner: &TypeDefinition,
    property: &str,
    type_name: &str,
    node: &Node,
) {
    session.defer(PendingResolution::PropertyType {
        owner_kind: owner.kind,
        owner: owner.name.clone(),
        property: property.to_string(),
        type_name: type_name.to_string(),
        start: node.start,
        end: node.end,
    });
}

/// Entry document parser with the fixed dialect table
#[derive(Debug, Clone)]
pub struct DefinitionsDocument {
    parsers: [DefinitionsParser; 4],
}

impl DefinitionsDocument {
    /// Create a document parser for every supported dialect
    pub fn new() -> Self {
        Self {
            parsers: Dialect::ALL.map(DefinitionsParser::new),
        }
    }

    /// Parser registered for `dialect`
    pub fn parser(&self, dialect: Dialect) -> &DefinitionsParser {
        &self.parsers[dialect.index()]
    }
}

impl Default for DefinitionsDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser<ArchiveRoot> for DefinitionsDocument {
    type Action = PendingResolution;

    fn select_parser(
        &self,
        root: &Node,
        session: &mut Session,
    ) -> Result<&dyn ElementParser<ArchiveRoot, PendingResolution>> {
        let dialect = match root.get(Dialect::DISCRIMINATOR) {
            None => {
                session.report(
                    ParsingIssue::warning(
                        ErrorCode::MissingDefinitionsVersion,
                        format!("No {} found in the document.", Dialect::DISCRIMINATOR),
                    )
                    .at(root.start, root.start)
                    .with_detail(format!("Parsing with {}.", Dialect::LATEST)),
                );
                Dialect::LATEST
            }
            Some(node) => {
                let text = node.as_str().unwrap_or_default();
                match Dialect::from_discriminator(text) {
                    Some(dialect) => dialect,
                    None => {
                        session.report(
                            ParsingIssue::error(
                                ErrorCode::UnknownDefinitionsVersion,
                                format!("Unknown {} '{text}'.", Dialect::DISCRIMINATOR),
                            )
                            .at_node(node)
                            .with_detail(format!("Supported versions: {}.", Dialect::supported())),
                        );
                        Dialect::LATEST
                    }
                }
            }
        };
        debug!(file = session.file_name(), %dialect, "selected dialect");
        Ok(self.parser(dialect))
    }

    fn resolve(
        &self,
        action: PendingResolution,
        root: &mut ArchiveRoot,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        trace!(?action, "resolving");
        // with imports the type may live in another document
        let severity = if root.imports.is_empty() {
            Severity::Error
        } else {
            Severity::Warning
        };

        match action {
            PendingResolution::DerivedFrom {
                kind,
                type_name,
                parent,
                start,
                end,
            } => {
                let chain = match derived_from_chain(root.types(kind), kind, &type_name) {
                    Ok(chain) => chain,
                    Err(Lineage::Missing(missing)) => {
                        diagnostics.report(
                            ParsingIssue::new(
                                ErrorCode::TypeNotFound,
                                severity,
                                format!(
                                    "Derived from type '{missing}' of {kind} '{type_name}' could not be found."
                                ),
                            )
                            .at(start, end),
                        );
                        Vec::new()
                    }
                    Err(Lineage::Cyclic(path)) => {
                        diagnostics.report(
                            ParsingIssue::error(
                                ErrorCode::CyclicDerivedFrom,
                                format!("{kind} '{type_name}' derives from itself through '{parent}'."),
                            )
                            .at(start, end)
                            .with_detail(path.join(" -> ")),
                        );
                        Vec::new()
                    }
                };
                if let Some(definition) = root.types_mut(kind).get_mut(&type_name) {
                    definition.derived_from_chain = chain;
                }
            }
            PendingResolution::PropertyType {
                owner_kind,
                owner,
                property,
                type_name,
                start,
                end,
            } => {
                let known = root.data_types.contains_key(&type_name)
                    || is_builtin(TypeKind::DataType, &type_name);
                if !known {
                    diagnostics.report(
                        ParsingIssue::new(
                            ErrorCode::TypeNotFound,
                            severity,
                            format!(
                                "Type '{type_name}' of property '{property}' in {owner_kind} '{owner}' could not be found."
                            ),
                        )
                        .at(start, end),
                    );
                }
            }
        }
        Ok(())
    }
}
