//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or applying configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Settings for archive resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Archive-relative location of the descriptor
    pub metadata_path: String,
    /// Pattern a root-level file name must match in full to be an entry candidate
    pub entry_pattern: String,
    /// Run the built-in metadata check on every result
    pub post_process: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            metadata_path: Self::DEFAULT_METADATA_PATH.to_string(),
            entry_pattern: Self::DEFAULT_ENTRY_PATTERN.to_string(),
            post_process: true,
        }
    }
}

impl ResolverConfig {
    pub const DEFAULT_METADATA_PATH: &'static str = "TOSCA-Metadata/TOSCA.meta";
    pub const DEFAULT_ENTRY_PATTERN: &'static str = r".+\.ya?ml";

    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file; missing keys take their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Set the descriptor location
    pub fn metadata_path(mut self, path: impl Into<String>) -> Self {
        self.metadata_path = path.into();
        self
    }

    /// Set the entry file name pattern
    pub fn entry_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.entry_pattern = pattern.into();
        self
    }

    /// Enable or disable the built-in metadata check
    pub fn post_process(mut self, enabled: bool) -> Self {
        self.post_process = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.metadata_path, "TOSCA-Metadata/TOSCA.meta");
        assert_eq!(config.entry_pattern, r".+\.ya?ml");
        assert!(config.post_process);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ResolverConfig::from_yaml_str("post_process: false\n").unwrap();
        assert!(!config.post_process);
        assert_eq!(config.metadata_path, ResolverConfig::DEFAULT_METADATA_PATH);
        assert_eq!(ResolverConfig::from_yaml_str("").unwrap(), ResolverConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let error = ResolverConfig::from_yaml_str("post_process: [nope\n").unwrap_err();
        assert!(matches!(error, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_builder_setters() {
        let config = ResolverConfig::new()
            .metadata_path("META/archive.meta")
            .entry_pattern(r".+\.tosca")
            .post_process(false);
        assert_eq!(config.metadata_path, "META/archive.meta");
        assert_eq!(config.entry_pattern, r".+\.tosca");
        assert!(!config.post_process);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "entry_pattern: '.+\\.yml'").unwrap();
        let config = ResolverConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.entry_pattern, r".+\.yml");

        let missing = ResolverConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
