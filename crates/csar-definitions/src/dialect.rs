//! Supported document dialects
//!
//! The set is closed: every dialect has an entry in [`Dialect::ALL`], and
//! dispatch is a lookup of the document's `tosca_definitions_version` value
//! in that table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema dialect of a definitions document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "alien_dsl_1_1_0")]
    AlienDsl110,
    #[serde(rename = "alien_dsl_1_2_0")]
    AlienDsl120,
    #[serde(rename = "tosca_simple_yaml_1_0")]
    ToscaSimpleYaml10,
    #[serde(rename = "alien_dsl_1_3_0")]
    AlienDsl130,
}

/// Where a dialect expects template name, version and author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLayout {
    /// `template_name`, `template_version`, `template_author` at top level
    Flat,
    /// The same keys under a top-level `metadata` mapping
    Nested,
}

impl Dialect {
    /// Key holding the dialect discriminator
    pub const DISCRIMINATOR: &'static str = "tosca_definitions_version";

    /// Every supported dialect, oldest first
    pub const ALL: [Dialect; 4] = [
        Dialect::AlienDsl110,
        Dialect::AlienDsl120,
        Dialect::ToscaSimpleYaml10,
        Dialect::AlienDsl130,
    ];

    /// Dialect used when the discriminator is missing or unknown
    pub const LATEST: Dialect = Dialect::AlienDsl130;

    /// Discriminator value for this dialect
    pub const fn as_str(self) -> &'static str {
        match self {
            Dialect::AlienDsl110 => "alien_dsl_1_1_0",
            Dialect::AlienDsl120 => "alien_dsl_1_2_0",
            Dialect::ToscaSimpleYaml10 => "tosca_simple_yaml_1_0",
            Dialect::AlienDsl130 => "alien_dsl_1_3_0",
        }
    }

    /// Position of this dialect in [`Dialect::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Dialect::AlienDsl110 => 0,
            Dialect::AlienDsl120 => 1,
            Dialect::ToscaSimpleYaml10 => 2,
            Dialect::AlienDsl130 => 3,
        }
    }

    pub const fn metadata_layout(self) -> MetadataLayout {
        match self {
            Dialect::AlienDsl110 | Dialect::AlienDsl120 => MetadataLayout::Flat,
            Dialect::ToscaSimpleYaml10 | Dialect::AlienDsl130 => MetadataLayout::Nested,
        }
    }

    /// Look up a dialect by discriminator value
    pub fn from_discriminator(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }

    /// Supported discriminator values, comma separated
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
