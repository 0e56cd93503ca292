#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csar-archive
//!
//! Resolves the entry document of an archive and parses it.
//!
//! An archive is a zip file or a directory. When it carries a descriptor
//! (`TOSCA-Metadata/TOSCA.meta` by default) the descriptor names the entry
//! document and supplies archive metadata that is merged into the result.
//! Without one, the archive root must hold exactly one document matching the
//! entry pattern.
//!
//! ```no_run
//! use csar_archive::{ArchiveResolver, ResolverConfig};
//!
//! let resolver = ArchiveResolver::new(ResolverConfig::default())?;
//! let result = resolver.resolve_path("webapp.csar")?;
//! for issue in result.issues() {
//!     eprintln!("{issue}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod fs;
pub mod postprocess;
pub mod resolver;

pub use config::{ConfigError, ResolverConfig};
pub use descriptor::{ArchiveDescriptor, DescriptorDocument, NoDeferred};
pub use discovery::EntryDiscovery;
pub use fs::{ArchiveFs, ArchiveSource, DirectoryFs, FsError, ZipFs};
pub use postprocess::{MetadataCheck, NoopPostProcessor, PostProcessor};
pub use resolver::{ArchiveResolver, ResolutionState};
