//! Convention-based entry document discovery

use crate::config::{ConfigError, ResolverConfig};
use crate::fs::{ArchiveFs, FsError};
use regex::Regex;
use tracing::trace;

/// Lists root-level files whose name matches the entry pattern
#[derive(Debug, Clone)]
pub struct EntryDiscovery {
    pattern: Regex,
}

impl EntryDiscovery {
    /// Discovery never looks below the archive root
    pub const MAX_DEPTH: usize = 1;

    /// Create a discovery for `pattern`, which must match a whole file name
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { pattern })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        Self::new(&config.entry_pattern)
    }

    /// Whether `file_name` is an entry candidate
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }

    /// Candidate entry documents at the root of `fs`, sorted by path
    pub fn discover(&self, fs: &dyn ArchiveFs) -> Result<Vec<String>, FsError> {
        let candidates: Vec<String> = fs
            .walk(Self::MAX_DEPTH)?
            .into_iter()
            .filter(|path| {
                let file_name = path.rsplit('/').next().unwrap_or(path);
                self.matches(file_name)
            })
            .collect();
        trace!(archive = fs.name(), count = candidates.len(), "discovered entry candidates");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::DirectoryFs;

    #[test]
    fn test_default_pattern() {
        let discovery = EntryDiscovery::from_config(&ResolverConfig::default()).unwrap();
        assert!(discovery.matches("main.yaml"));
        assert!(discovery.matches("main.yml"));
        assert!(!discovery.matches(".yaml"));
        assert!(!discovery.matches("main.yaml.bak"));
        assert!(!discovery.matches("README.md"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(EntryDiscovery::new("(unclosed"), Err(ConfigError::Pattern(_))));
    }

    #[test]
    fn test_discover_root_only_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yml", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x: 1").unwrap();
        }
        std::fs::create_dir(dir.path().join("types")).unwrap();
        std::fs::write(dir.path().join("types/deep.yaml"), "x: 1").unwrap();

        let fs = DirectoryFs::open(dir.path()).unwrap();
        let discovery = EntryDiscovery::new(ResolverConfig::DEFAULT_ENTRY_PATTERN).unwrap();
        assert_eq!(discovery.discover(&fs).unwrap(), vec!["a.yml", "b.yaml"]);
    }
}
