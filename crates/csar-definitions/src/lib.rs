#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # csar-definitions
//!
//! Typed model and parsers for archive entry documents.
//!
//! The dialect of a document is read from its `tosca_definitions_version`
//! key and mapped through a fixed table to the matching parser. Type
//! hierarchies (`derived_from`) and property types may reference types
//! declared later in the document; those references are queued as
//! [`PendingResolution`] records and resolved once the whole document has
//! been read.

pub mod dialect;
pub mod inheritance;
pub mod model;
pub mod parser;

pub use dialect::{Dialect, MetadataLayout};
pub use inheritance::{Lineage, PendingResolution, derived_from_chain};
pub use model::{Archive, ArchiveRoot, PropertyDefinition, TypeDefinition, TypeKind};
pub use parser::{DefinitionsDocument, DefinitionsParser};
