//! Archive resolution
//!
//! ```text
//! Opened -> DescriptorFound  -> EntryResolved -> DocumentParsed -> Merged -> PostProcessed
//!        -> DescriptorAbsent -> EntryResolved -> DocumentParsed ----------> PostProcessed
//! ```
//!
//! Any step may end in `Failed`, carrying the single fatal issue.

use crate::config::{ConfigError, ResolverConfig};
use crate::descriptor::{ArchiveDescriptor, DescriptorDocument};
use crate::discovery::EntryDiscovery;
use crate::fs::{ArchiveFs, ArchiveSource, FsError};
use crate::postprocess::{MetadataCheck, NoopPostProcessor, PostProcessor};
use csar_definitions::{ArchiveRoot, DefinitionsDocument};
use csar_parser::{DocumentParser, ErrorCode, ParsingError, ParsingIssue, ParsingResult, Result};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Steps of a single archive resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Opened,
    DescriptorFound,
    DescriptorAbsent,
    EntryResolved,
    DocumentParsed,
    Merged,
    PostProcessed,
    Failed,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks and traces the state of one resolution
struct Resolution<'a> {
    archive: &'a str,
    state: ResolutionState,
}

impl<'a> Resolution<'a> {
    fn start(archive: &'a str) -> Self {
        debug!(archive, state = %ResolutionState::Opened, "archive opened");
        Self {
            archive,
            state: ResolutionState::Opened,
        }
    }

    fn advance(&mut self, next: ResolutionState) {
        debug!(archive = self.archive, from = %self.state, to = %next, "resolution step");
        self.state = next;
    }

    fn fail(&mut self, error: ParsingError) -> ParsingError {
        warn!(archive = self.archive, state = %self.state, "archive resolution failed: {}", error);
        self.state = ResolutionState::Failed;
        error
    }
}

/// Resolves and parses the entry document of an archive
pub struct ArchiveResolver {
    config: ResolverConfig,
    discovery: EntryDiscovery,
    descriptors: DescriptorDocument,
    definitions: DefinitionsDocument,
    post_processor: Box<dyn PostProcessor + Send + Sync>,
}

impl fmt::Debug for ArchiveResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArchiveResolver {
    /// Create a resolver; the entry pattern is compiled here
    pub fn new(config: ResolverConfig) -> std::result::Result<Self, ConfigError> {
        let discovery = EntryDiscovery::from_config(&config)?;
        let post_processor: Box<dyn PostProcessor + Send + Sync> = if config.post_process {
            Box::new(MetadataCheck::new()?)
        } else {
            Box::new(NoopPostProcessor)
        };
        Ok(Self {
            config,
            discovery,
            descriptors: DescriptorDocument::new(),
            definitions: DefinitionsDocument::new(),
            post_processor,
        })
    }

    /// Replace the post-processing hook
    pub fn with_post_processor(
        mut self,
        processor: impl PostProcessor + Send + Sync + 'static,
    ) -> Self {
        self.post_processor = Box::new(processor);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn discovery(&self) -> &EntryDiscovery {
        &self.discovery
    }

    /// Resolve the archive at `path`, zip file or directory
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> Result<ParsingResult<ArchiveRoot>> {
        self.resolve(&ArchiveSource::detect(path))
    }

    /// Open `source` and resolve it; the filesystem view is released on return
    pub fn resolve(&self, source: &ArchiveSource) -> Result<ParsingResult<ArchiveRoot>> {
        let mut fs = open(source)?;
        self.resolve_fs(&mut *fs)
    }

    /// Root-level entry candidates of `source`
    pub fn discover(&self, source: &ArchiveSource) -> Result<Vec<String>> {
        let fs = open(source)?;
        self.discovery
            .discover(&*fs)
            .map_err(|e| listing_failure(fs.name(), &e))
    }

    /// Resolve an already opened archive
    pub fn resolve_fs(&self, fs: &mut dyn ArchiveFs) -> Result<ParsingResult<ArchiveRoot>> {
        let archive = fs.name().to_string();
        let mut resolution = Resolution::start(&archive);

        let resolved = if fs.exists(&self.config.metadata_path) {
            resolution.advance(ResolutionState::DescriptorFound);
            self.resolve_with_descriptor(fs, &mut resolution)
        } else {
            resolution.advance(ResolutionState::DescriptorAbsent);
            self.resolve_from_root(fs, &mut resolution)
        };
        let result = resolved.map_err(|e| resolution.fail(e.with_file_name(&archive)))?;

        let result = self.post_processor.process(result);
        resolution.advance(ResolutionState::PostProcessed);
        info!(
            archive = %archive,
            errors = result.error_count(),
            warnings = result.warning_count(),
            "archive resolved"
        );
        Ok(result)
    }

    fn resolve_with_descriptor(
        &self,
        fs: &mut dyn ArchiveFs,
        resolution: &mut Resolution<'_>,
    ) -> Result<ParsingResult<ArchiveRoot>> {
        let meta_path = self.config.metadata_path.as_str();
        let bytes = fs.read(meta_path).map_err(|e| read_failure(meta_path, &e))?;
        let ParsingResult {
            value: descriptor,
            issues: descriptor_issues,
        } = self.descriptors.parse_bytes(meta_path, &bytes, None)?;
        let descriptor = descriptor.unwrap_or_default();

        let Some(entry) = descriptor.entry_definitions.clone() else {
            return Err(ParsingError::new(
                meta_path,
                ParsingIssue::error(
                    ErrorCode::EntryDefinitionNotFound,
                    "No entry definitions found in the meta file.",
                ),
            ));
        };
        resolution.advance(ResolutionState::EntryResolved);

        let mut result = self.parse_entry(fs, &entry)?;
        resolution.advance(ResolutionState::DocumentParsed);

        merge(&mut result, &descriptor);
        result.prepend_issues(descriptor_issues);
        resolution.advance(ResolutionState::Merged);
        Ok(result)
    }

    fn resolve_from_root(
        &self,
        fs: &mut dyn ArchiveFs,
        resolution: &mut Resolution<'_>,
    ) -> Result<ParsingResult<ArchiveRoot>> {
        let candidates = self
            .discovery
            .discover(&*fs)
            .map_err(|e| listing_failure(fs.name(), &e))?;

        let [entry] = candidates.as_slice() else {
            return Err(ParsingError::new(
                fs.name(),
                ParsingIssue::error(
                    ErrorCode::SingleDefinitionSupported,
                    "Only archives with a single root definition are supported.",
                )
                .with_detail(format!(
                    "Matching file count in root of {}: {}",
                    fs.name(),
                    candidates.len()
                )),
            ));
        };
        let entry = entry.clone();
        resolution.advance(ResolutionState::EntryResolved);

        let result = self.parse_entry(fs, &entry)?;
        resolution.advance(ResolutionState::DocumentParsed);
        Ok(result)
    }

    fn parse_entry(
        &self,
        fs: &mut dyn ArchiveFs,
        entry: &str,
    ) -> Result<ParsingResult<ArchiveRoot>> {
        debug!(archive = fs.name(), entry, "parsing entry document");
        let bytes = fs.read(entry).map_err(|e| read_failure(entry, &e))?;
        self.definitions.parse_bytes(entry, &bytes, None)
    }
}

/// Name and version always come from the descriptor, the author only when set
fn merge(result: &mut ParsingResult<ArchiveRoot>, descriptor: &ArchiveDescriptor) {
    if let Some(root) = result.value_mut() {
        root.archive.name = descriptor.name.clone();
        root.archive.version = descriptor.version.clone();
        if let Some(author) = &descriptor.created_by {
            root.archive.template_author = Some(author.clone());
        }
    }
}

fn open(source: &ArchiveSource) -> Result<Box<dyn ArchiveFs>> {
    let name = source
        .path()
        .file_name()
        .map_or_else(|| source.path().display().to_string(), |n| n.to_string_lossy().into_owned());
    source.open().map_err(|e| {
        warn!(archive = %source.path().display(), "unable to open archive: {}", e);
        let issue = match &e {
            FsError::InvalidArchive { message, .. } => ParsingIssue::error(
                ErrorCode::ErroneousArchiveFile,
                "File is not in good format, only zip file is supported.",
            )
            .with_detail(message.clone()),
            FsError::Io { .. } => ParsingIssue::error(
                ErrorCode::FailedToReadFile,
                "Problem happened while accessing file.",
            )
            .with_detail(e.to_string()),
        };
        ParsingError::new(name, issue.with_extra(source.path().display().to_string()))
    })
}

fn read_failure(path: &str, error: &FsError) -> ParsingError {
    let issue = if error.is_not_found() {
        ParsingIssue::error(ErrorCode::MissingFile, "File not found in archive.")
    } else {
        ParsingIssue::error(ErrorCode::FailedToReadFile, "Problem happened while accessing file.")
            .with_detail(error.to_string())
    };
    ParsingError::new(path, issue.with_extra(path))
}

fn listing_failure(archive: &str, error: &FsError) -> ParsingError {
    ParsingError::new(
        archive,
        ParsingIssue::error(ErrorCode::FailedToReadFile, "Failed to list root definitions.")
            .with_detail(format!("Error reading {archive}: {error}")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(
        name: Option<&str>,
        version: Option<&str>,
        created_by: Option<&str>,
    ) -> ArchiveDescriptor {
        ArchiveDescriptor {
            name: name.map(str::to_string),
            version: version.map(str::to_string),
            created_by: created_by.map(str::to_string),
            ..ArchiveDescriptor::default()
        }
    }

    fn parsed(name: &str, version: &str, author: &str) -> ParsingResult<ArchiveRoot> {
        let mut root = ArchiveRoot::default();
        root.archive.name = Some(name.to_string());
        root.archive.version = Some(version.to_string());
        root.archive.template_author = Some(author.to_string());
        ParsingResult::ok(root)
    }

    #[test]
    fn test_merge_keeps_author_without_created_by() {
        let mut result = parsed("doc", "0.1", "bob");
        merge(&mut result, &descriptor(Some("A"), Some("1.0"), None));
        let archive = &result.value().unwrap().archive;
        assert_eq!(archive.name.as_deref(), Some("A"));
        assert_eq!(archive.version.as_deref(), Some("1.0"));
        assert_eq!(archive.template_author.as_deref(), Some("bob"));
    }

    #[test]
    fn test_merge_overwrites_author_and_clears_missing_name() {
        let mut result = parsed("doc", "0.1", "bob");
        merge(&mut result, &descriptor(None, Some("1.0"), Some("alice")));
        let archive = &result.value().unwrap().archive;
        assert_eq!(archive.name, None);
        assert_eq!(archive.template_author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ResolutionState::DescriptorAbsent.to_string(), "DescriptorAbsent");
    }

    #[test]
    fn test_failure_marks_state() {
        let mut resolution = Resolution::start("a.zip");
        resolution.advance(ResolutionState::DescriptorAbsent);
        let error = resolution.fail(ParsingError::new(
            "a.zip",
            ParsingIssue::error(ErrorCode::SingleDefinitionSupported, "x"),
        ));
        assert_eq!(resolution.state, ResolutionState::Failed);
        assert_eq!(error.code(), ErrorCode::SingleDefinitionSupported);
    }
}
