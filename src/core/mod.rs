//! core
//!
//! Core domain types, schemas, and naming for dimmeta.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Units, AttributeValue, CellMethod, etc.
//! - [`naming`] - Token grammar and display-name resolution
//! - [`metadata`] - Metadata schemas, records, and managers
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Records are immutable values; mutation goes through a manager
//! - Schemas are strict and self-describing
//! - Ordering and naming are deterministic

pub mod config;
pub mod metadata;
pub mod naming;
pub mod types;
