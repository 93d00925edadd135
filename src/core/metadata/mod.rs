//! core::metadata
//!
//! Identity metadata schemas and their mutable managers.
//!
//! # Modules
//!
//! - [`schema`] - Immutable metadata records and the schema hierarchy
//! - [`manager`] - Mutable per-object managers and the manager factory
//!
//! # Schema Hierarchy
//!
//! ```text
//! BaseMetadata
//! ├── AncillaryVariableMetadata
//! ├── CellMeasureMetadata   (+ measure)
//! ├── CoordMetadata         (+ coord_system, climatological)
//! └── CubeMetadata          (+ cell_methods)
//! ```
//!
//! Every schema's field list starts with the five base fields.
//!
//! # Example
//!
//! ```
//! use dimmeta::core::metadata::{create_manager, CubeMetadata, Metadata, SchemaKind};
//!
//! let record = CubeMetadata::new().with_var_name("tas");
//! let mut manager = create_manager(SchemaKind::Cube, [("var_name", "tas")]).unwrap();
//! assert_eq!(manager.snapshot::<CubeMetadata>(), Some(record.clone()));
//!
//! // Records require cube attributes; managers fill in an empty mapping.
//! assert!(record.name(None, false).is_err());
//! assert_eq!(manager.name(None, false).unwrap(), "tas");
//! ```

pub mod manager;
pub mod schema;

pub use manager::{create_manager, create_manager_for, ManagerState, MetadataManager};
pub use schema::{
    parse_metadata, AncillaryVariableMetadata, AnyMetadata, BaseMetadata, CellMeasureMetadata,
    CoordMetadata, CubeMetadata, CubeNames, FieldData, FieldType, FieldValue, Metadata,
    MetadataError, SchemaKind,
};
