//! dimmeta - Identity metadata for dimensional data objects
//!
//! Data objects such as cubes, coordinates, cell measures and ancillary
//! variables carry descriptive metadata (standard name, long name, variable
//! name, units, attributes, plus a few schema-specific fields). dimmeta
//! models that metadata as immutable, comparable, orderable records and
//! provides mutable managers that own a data object's current values.
//!
//! # Architecture
//!
//! - [`core::types`] - Validated value types used by metadata fields
//! - [`core::naming`] - Token grammar and name resolution
//! - [`core::metadata`] - Schema records, the schema hierarchy, and managers
//! - [`core::config`] - Naming policy configuration
//!
//! # Invariants
//!
//! 1. Every schema's fields start with the base fields, in order
//! 2. Records of one schema are totally ordered, absent before present
//! 3. A manager is bound to a single schema for its lifetime
//! 4. Unknown field names are always rejected, never ignored

pub mod core;

pub use crate::core::metadata::{
    create_manager, create_manager_for, AnyMetadata, Metadata, MetadataError, MetadataManager,
    SchemaKind,
};
