//! Archive descriptor (`TOSCA.meta`)

use csar_parser::{
    Diagnostics, DocumentParser, ElementParser, ParsingSession, Result, StringParser,
    expect_mapping, unrecognized_key,
};
use csar_tree::Node;
use serde::Serialize;

/// Metadata read from the archive descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveDescriptor {
    pub meta_file_version: Option<String>,
    pub csar_version: Option<String>,
    pub created_by: Option<String>,
    /// Archive-relative path of the entry document
    pub entry_definitions: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Descriptors never queue deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDeferred {}

/// Parses descriptor mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorParser;

impl ElementParser<ArchiveDescriptor, NoDeferred> for DescriptorParser {
    fn parse(
        &self,
        node: &Node,
        session: &mut ParsingSession<NoDeferred>,
    ) -> Result<ArchiveDescriptor> {
        let mut descriptor = ArchiveDescriptor::default();
        let Some(entries) = expect_mapping(node, session.diagnostics_mut(), "the archive descriptor")
        else {
            return Ok(descriptor);
        };

        for entry in entries {
            let field = match entry.key_text() {
                "TOSCA-Meta-File-Version" => &mut descriptor.meta_file_version,
                "CSAR-Version" => &mut descriptor.csar_version,
                "Created-By" => &mut descriptor.created_by,
                "Entry-Definitions" => &mut descriptor.entry_definitions,
                "Name" => &mut descriptor.name,
                "Version" => &mut descriptor.version,
                _ => {
                    unrecognized_key(entry, session.diagnostics_mut(), "the archive descriptor");
                    continue;
                }
            };
            *field = StringParser.parse(&entry.value, session)?;
        }
        Ok(descriptor)
    }
}

/// Document parser for archive descriptors; there is a single dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorDocument {
    parser: DescriptorParser,
}

impl DescriptorDocument {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentParser<ArchiveDescriptor> for DescriptorDocument {
    type Action = NoDeferred;

    fn select_parser(
        &self,
        _root: &Node,
        _session: &mut ParsingSession<NoDeferred>,
    ) -> Result<&dyn ElementParser<ArchiveDescriptor, NoDeferred>> {
        Ok(&self.parser)
    }

    fn resolve(
        &self,
        action: NoDeferred,
        _value: &mut ArchiveDescriptor,
        _diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        match action {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csar_parser::ErrorCode;

    const META: &str = "TOSCA-Meta-File-Version: 1.0\nCSAR-Version: 1.1\nCreated-By: Alice\nEntry-Definitions: definitions/main.yaml\nName: webapp\nVersion: 2.0.0\n";

    #[test]
    fn test_parse_all_keys() {
        let result = DescriptorDocument::new()
            .parse_str("TOSCA.meta", META, None)
            .unwrap();
        assert!(result.issues.is_empty());
        let descriptor = result.value.unwrap();
        assert_eq!(descriptor.meta_file_version.as_deref(), Some("1.0"));
        assert_eq!(descriptor.csar_version.as_deref(), Some("1.1"));
        assert_eq!(descriptor.created_by.as_deref(), Some("Alice"));
        assert_eq!(descriptor.entry_definitions.as_deref(), Some("definitions/main.yaml"));
        assert_eq!(descriptor.name.as_deref(), Some("webapp"));
        assert_eq!(descriptor.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_unknown_key_warns() {
        let result = DescriptorDocument::new()
            .parse_str("TOSCA.meta", "Entry-Definitions: a.yaml\nSigned-By: bob\n", None)
            .unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, ErrorCode::UnrecognizedProperty);
        assert_eq!(result.value.unwrap().entry_definitions.as_deref(), Some("a.yaml"));
    }

    #[test]
    fn test_empty_descriptor_is_fatal() {
        let error = DescriptorDocument::new()
            .parse_str("TOSCA.meta", "\n", None)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::SyntaxError);
    }
}
