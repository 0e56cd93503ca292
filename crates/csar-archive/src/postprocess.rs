//! Post-processing hooks run on every resolved archive

use crate::config::ConfigError;
use csar_definitions::ArchiveRoot;
use csar_parser::{ErrorCode, ParsingIssue, ParsingResult};
use regex::Regex;
use tracing::debug;

/// Receives the merged result and returns it, possibly with more issues
pub trait PostProcessor {
    fn process(&self, result: ParsingResult<ArchiveRoot>) -> ParsingResult<ArchiveRoot>;
}

impl<F> PostProcessor for F
where
    F: Fn(ParsingResult<ArchiveRoot>) -> ParsingResult<ArchiveRoot>,
{
    fn process(&self, result: ParsingResult<ArchiveRoot>) -> ParsingResult<ArchiveRoot> {
        self(result)
    }
}

/// Returns results unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPostProcessor;

impl PostProcessor for NoopPostProcessor {
    fn process(&self, result: ParsingResult<ArchiveRoot>) -> ParsingResult<ArchiveRoot> {
        result
    }
}

/// Requires a name and a well-formed version on the merged archive
#[derive(Debug, Clone)]
pub struct MetadataCheck {
    version_pattern: Regex,
}

impl MetadataCheck {
    pub const VERSION_PATTERN: &'static str = r"^\d+(?:\.\d+)*(?:[-_.][A-Za-z0-9]+)*$";

    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            version_pattern: Regex::new(Self::VERSION_PATTERN)?,
        })
    }
}

impl PostProcessor for MetadataCheck {
    fn process(&self, mut result: ParsingResult<ArchiveRoot>) -> ParsingResult<ArchiveRoot> {
        let Some(root) = result.value() else {
            return result;
        };
        let archive = &root.archive;

        let mut issues = Vec::new();
        let mut missing = Vec::new();
        if archive.name.as_deref().is_none_or(str::is_empty) {
            missing.push("name");
        }
        match archive.version.as_deref() {
            None | Some("") => missing.push("version"),
            Some(version) if !self.version_pattern.is_match(version) => {
                issues.push(
                    ParsingIssue::error(
                        ErrorCode::InvalidArchiveVersion,
                        format!("Archive version '{version}' is not a valid version."),
                    )
                    .with_detail("Expected dotted numbers with optional qualifiers, e.g. 1.0.0-SNAPSHOT."),
                );
            }
            Some(_) => {}
        }
        if !missing.is_empty() {
            issues.insert(
                0,
                ParsingIssue::error(
                    ErrorCode::MissingArchiveMetadata,
                    format!("Archive has no {}.", missing.join(" and ")),
                ),
            );
        }

        debug!(issues = issues.len(), "metadata check done");
        for issue in issues {
            result.push_issue(issue);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: Option<&str>, version: Option<&str>) -> ParsingResult<ArchiveRoot> {
        let mut root = ArchiveRoot::default();
        root.archive.name = name.map(str::to_string);
        root.archive.version = version.map(str::to_string);
        ParsingResult::ok(root)
    }

    fn codes(result: &ParsingResult<ArchiveRoot>) -> Vec<ErrorCode> {
        result.issues().iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_valid_metadata_passes() {
        let check = MetadataCheck::new().unwrap();
        for version in ["1", "1.0.0", "2.1.0-SNAPSHOT", "1.0_rc1", "3.2.1.Final"] {
            let checked = check.process(result(Some("app"), Some(version)));
            assert!(checked.issues().is_empty(), "{version}");
        }
    }

    #[test]
    fn test_missing_metadata() {
        let check = MetadataCheck::new().unwrap();
        let checked = check.process(result(None, None));
        assert_eq!(codes(&checked), vec![ErrorCode::MissingArchiveMetadata]);
        assert!(checked.issues()[0].message.contains("name and version"));
    }

    #[test]
    fn test_invalid_version() {
        let check = MetadataCheck::new().unwrap();
        let checked = check.process(result(Some("app"), Some("v1.0")));
        assert_eq!(codes(&checked), vec![ErrorCode::InvalidArchiveVersion]);
        assert!(checked.has_errors());
    }

    #[test]
    fn test_noop_and_closure() {
        let unchanged = NoopPostProcessor.process(result(None, None));
        assert!(unchanged.issues().is_empty());

        let tagging = |mut r: ParsingResult<ArchiveRoot>| {
            if let Some(root) = r.value_mut() {
                root.archive.tags.insert("checked".to_string(), "yes".to_string());
            }
            r
        };
        let tagged = tagging.process(result(None, None));
        assert_eq!(tagged.value().unwrap().archive.tags["checked"], "yes");
    }
}
