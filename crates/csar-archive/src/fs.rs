//! Archive filesystem views
//!
//! Paths handed to an [`ArchiveFs`] are archive-relative and `/`-separated.
//! A leading `/` or `./` is ignored; `..` never leaves the archive.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::trace;
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors raised by archive filesystem views
#[derive(Error, Debug)]
pub enum FsError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("'{path}' is not a valid archive: {message}")]
    InvalidArchive { path: String, message: String },
}

impl FsError {
    /// Create an I/O error for `path`
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an error for a container that cannot be opened as an archive
    pub fn invalid_archive(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArchive {
            path: path.into(),
            message: message.into(),
        }
    }

    fn not_found(path: &str) -> Self {
        Self::io(path, io::Error::new(io::ErrorKind::NotFound, "no such file in archive"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// A navigable, read-only view of an archive
pub trait ArchiveFs {
    /// Display name of the archive
    fn name(&self) -> &str;

    /// Whether a regular file exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Read the file at `path`
    fn read(&mut self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Regular files at most `max_depth` levels below the root, sorted.
    ///
    /// Depth 1 is the archive root.
    fn walk(&self, max_depth: usize) -> Result<Vec<String>, FsError>;
}

/// Where an archive lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Zip(PathBuf),
    Directory(PathBuf),
}

impl ArchiveSource {
    /// Directories are read in place, anything else is treated as a zip file
    pub fn detect(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            ArchiveSource::Directory(path.to_path_buf())
        } else {
            ArchiveSource::Zip(path.to_path_buf())
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ArchiveSource::Zip(path) | ArchiveSource::Directory(path) => path,
        }
    }

    /// Open a filesystem view of the archive
    pub fn open(&self) -> Result<Box<dyn ArchiveFs>, FsError> {
        match self {
            ArchiveSource::Zip(path) => Ok(Box::new(ZipFs::open(path)?)),
            ArchiveSource::Directory(path) => Ok(Box::new(DirectoryFs::open(path)?)),
        }
    }
}

/// Normalize an archive-relative path; `None` when it escapes the root
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            part => parts.push(part),
        }
    }
    Some(parts.join("/"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Zip-backed archive
///
/// Entry names are indexed by their normalized path, so `./a.yaml` and
/// `/a.yaml` entries are reachable as `a.yaml`.
pub struct ZipFs {
    name: String,
    archive: ZipArchive<File>,
    entries: BTreeMap<String, String>,
}

impl ZipFs {
    /// Open the zip file at `path`
    pub fn open(path: &Path) -> Result<Self, FsError> {
        let name = display_name(path);
        let file = File::open(path).map_err(|e| FsError::io(path.display().to_string(), e))?;
        let archive = ZipArchive::new(file).map_err(|e| match e {
            ZipError::Io(source) => FsError::io(path.display().to_string(), source),
            other => FsError::invalid_archive(path.display().to_string(), other.to_string()),
        })?;
        let mut entries = BTreeMap::new();
        for raw in archive.file_names().filter(|raw| !raw.ends_with('/')) {
            match normalize(raw) {
                Some(normalized) if !normalized.is_empty() => {
                    // first entry wins when two raw names normalize alike
                    entries.entry(normalized).or_insert_with(|| raw.to_string());
                }
                _ => trace!(archive = %name, entry = raw, "skipping entry outside the archive root"),
            }
        }
        trace!(archive = %name, entries = entries.len(), "opened zip archive");
        Ok(Self {
            name,
            archive,
            entries,
        })
    }

    fn raw_name(&self, path: &str) -> Option<&str> {
        normalize(path).and_then(|p| self.entries.get(&p)).map(String::as_str)
    }
}

impl ArchiveFs for ZipFs {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> bool {
        self.raw_name(path).is_some()
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>, FsError> {
        let raw = self
            .raw_name(path)
            .ok_or_else(|| FsError::not_found(path))?
            .to_string();
        let mut file = self.archive.by_name(&raw).map_err(|e| match e {
            ZipError::FileNotFound => FsError::not_found(path),
            ZipError::Io(source) => FsError::io(path, source),
            other => FsError::io(path, io::Error::other(other.to_string())),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| FsError::io(path, e))?;
        Ok(bytes)
    }

    fn walk(&self, max_depth: usize) -> Result<Vec<String>, FsError> {
        Ok(self
            .entries
            .keys()
            .filter(|name| name.split('/').count() <= max_depth)
            .cloned()
            .collect())
    }
}

/// Directory-backed archive
#[derive(Debug, Clone)]
pub struct DirectoryFs {
    name: String,
    root: PathBuf,
}

impl DirectoryFs {
    /// Open the directory at `root`
    pub fn open(root: &Path) -> Result<Self, FsError> {
        if !root.is_dir() {
            return Err(FsError::io(
                root.display().to_string(),
                io::Error::new(io::ErrorKind::NotFound, "archive directory not found"),
            ));
        }
        Ok(Self {
            name: display_name(root),
            root: root.to_path_buf(),
        })
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        normalize(path).map(|p| self.root.join(p))
    }
}

impl ArchiveFs for DirectoryFs {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>, FsError> {
        let full = self.resolve(path).ok_or_else(|| FsError::not_found(path))?;
        std::fs::read(full).map_err(|e| FsError::io(path, e))
    }

    fn walk(&self, max_depth: usize) -> Result<Vec<String>, FsError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(max_depth) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).display().to_string();
                FsError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }
}
