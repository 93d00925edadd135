//! core::metadata::manager
//!
//! Mutable, owned metadata.
//!
//! # Overview
//!
//! Data objects need metadata they can change after construction, while
//! equality, ordering and naming are defined once on the immutable records
//! in [`schema`](super::schema). A [`MetadataManager`] bridges the two: it
//! is bound to one schema for its whole lifetime, holds one current value
//! per field of that schema, and hands out immutable snapshots on request.
//!
//! Each manager is exclusively owned by a single data object.
//!
//! # Example
//!
//! ```
//! use dimmeta::core::metadata::manager::create_manager;
//! use dimmeta::core::metadata::schema::{CoordMetadata, Metadata, SchemaKind};
//!
//! let mut manager = create_manager(SchemaKind::Coord, [("standard_name", "latitude")]).unwrap();
//! manager.set("var_name", "lat").unwrap();
//! manager.set("climatological", false).unwrap();
//!
//! assert_eq!(manager.name(None, false).unwrap(), "latitude");
//!
//! let snapshot: CoordMetadata = manager.snapshot().unwrap();
//! assert_eq!(snapshot.var_name(), Some("lat"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::schema::{
    write_fields, AnyMetadata, CubeNames, FieldValue, Metadata, MetadataError, SchemaKind,
};
use crate::core::naming::{self, NamingPolicy};
use crate::core::types::{Attributes, Units};

/// Exported manager state: every field of the schema and its value.
pub type ManagerState = BTreeMap<String, Option<FieldValue>>;

/// Create a manager for a schema, applying initial field values.
///
/// All fields start absent and are then overridden by `initial`.
///
/// # Errors
///
/// - `MetadataError::InvalidFields` listing every key of `initial` the
///   schema does not declare
/// - `MetadataError::InvalidFieldValue` if a value's type does not match
///   its field
pub fn create_manager<I, K, V>(
    kind: SchemaKind,
    initial: I,
) -> Result<MetadataManager, MetadataError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<FieldValue>,
{
    MetadataManager::new(kind, initial)
}

/// Create a manager for a schema named by its canonical name, e.g.
/// `"CubeMetadata"`.
///
/// # Errors
///
/// Returns `MetadataError::UnknownSchema` if the name is not a recognised
/// schema, otherwise as [`create_manager`].
///
/// # Example
///
/// ```
/// use dimmeta::core::metadata::manager::create_manager_for;
/// use dimmeta::core::metadata::MetadataError;
///
/// let manager = create_manager_for("CubeMetadata", [("long_name", "rainfall")]).unwrap();
/// assert_eq!(manager.long_name(), Some("rainfall"));
///
/// let result = create_manager_for("Grid", Vec::<(&str, &str)>::new());
/// assert!(matches!(result, Err(MetadataError::UnknownSchema(_))));
/// ```
pub fn create_manager_for<I, K, V>(
    schema: &str,
    initial: I,
) -> Result<MetadataManager, MetadataError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<FieldValue>,
{
    let kind: SchemaKind = schema.parse()?;
    MetadataManager::new(kind, initial)
}

/// A mutable holder of one schema's field values.
///
/// Two managers are equal when they wrap the same schema and their
/// snapshots are equal. Serializes as its tagged snapshot, so a
/// round-trip preserves both the schema and every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AnyMetadata", into = "AnyMetadata")]
pub struct MetadataManager {
    current: AnyMetadata,
}

impl MetadataManager {
    /// The fall-back name used when no candidate is available.
    pub const DEFAULT_NAME: &'static str = naming::DEFAULT_NAME;

    /// Create a manager for a schema, applying initial field values.
    ///
    /// See [`create_manager`].
    pub fn new<I, K, V>(kind: SchemaKind, initial: I) -> Result<Self, MetadataError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let initial: Vec<(K, V)> = initial.into_iter().collect();
        reject_unknown(kind, initial.iter().map(|(field, _)| field.as_ref()))?;

        let mut current = AnyMetadata::empty(kind);
        for (field, value) in initial {
            current.replace_field(field.as_ref(), Some(value.into()))?;
        }

        debug!(schema = %kind, "created metadata manager");
        Ok(Self { current })
    }

    /// Create a manager holding the values of an existing record.
    pub fn from_record(record: impl Into<AnyMetadata>) -> Self {
        Self {
            current: record.into(),
        }
    }

    /// Reconstruct a manager from exported state.
    ///
    /// Fields missing from `state` stay absent.
    ///
    /// # Errors
    ///
    /// As [`create_manager`].
    ///
    /// # Example
    ///
    /// ```
    /// use dimmeta::core::metadata::manager::{create_manager, MetadataManager};
    /// use dimmeta::core::metadata::schema::SchemaKind;
    ///
    /// let original = create_manager(SchemaKind::Cube, [("var_name", "tas")]).unwrap();
    /// let restored = MetadataManager::from_state(original.kind(), original.state()).unwrap();
    /// assert_eq!(original, restored);
    /// ```
    pub fn from_state<I, K>(kind: SchemaKind, state: I) -> Result<Self, MetadataError>
    where
        I: IntoIterator<Item = (K, Option<FieldValue>)>,
        K: AsRef<str>,
    {
        let state: Vec<(K, Option<FieldValue>)> = state.into_iter().collect();
        reject_unknown(kind, state.iter().map(|(field, _)| field.as_ref()))?;

        let mut current = AnyMetadata::empty(kind);
        for (field, value) in state {
            current.replace_field(field.as_ref(), value)?;
        }

        debug!(schema = %kind, "restored metadata manager");
        Ok(Self { current })
    }

    /// Export the full field-value mapping.
    pub fn state(&self) -> ManagerState {
        self.fields()
            .iter()
            .map(|field| field.to_string())
            .zip(self.current.field_values())
            .collect()
    }

    /// Get the schema this manager is bound to.
    pub fn kind(&self) -> SchemaKind {
        self.current.kind()
    }

    /// Get the ordered field names of the schema.
    pub fn fields(&self) -> &'static [&'static str] {
        self.current.fields()
    }

    /// Take an immutable snapshot of the current values.
    pub fn values(&self) -> AnyMetadata {
        self.current.clone()
    }

    /// Take a snapshot as a concrete record type.
    ///
    /// Returns `None` if the manager holds another schema.
    pub fn snapshot<M: Metadata>(&self) -> Option<M> {
        self.values().downcast()
    }

    /// Get the value of a field.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidFields` if the schema has no such field.
    pub fn get(&self, field: &str) -> Result<Option<FieldValue>, MetadataError> {
        self.current
            .field(field)
            .ok_or_else(|| MetadataError::InvalidFields {
                schema: self.kind(),
                fields: vec![field.to_string()],
            })
    }

    /// Set the value of a field.
    ///
    /// # Errors
    ///
    /// - `MetadataError::InvalidFields` if the schema has no such field
    /// - `MetadataError::InvalidFieldValue` if the value has the wrong type
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<(), MetadataError> {
        self.replace(field, Some(value.into()))
    }

    /// Clear a field.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidFields` if the schema has no such field.
    pub fn unset(&mut self, field: &str) -> Result<(), MetadataError> {
        self.replace(field, None)
    }

    /// Set or clear a field.
    pub fn replace(&mut self, field: &str, value: Option<FieldValue>) -> Result<(), MetadataError> {
        trace!(schema = %self.kind(), field, present = value.is_some(), "replacing field");
        self.current.replace_field(field, value)
    }

    pub fn standard_name(&self) -> Option<&str> {
        self.current.standard_name()
    }

    pub fn long_name(&self) -> Option<&str> {
        self.current.long_name()
    }

    pub fn var_name(&self) -> Option<&str> {
        self.current.var_name()
    }

    pub fn units(&self) -> Option<&Units> {
        self.current.units()
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.current.attributes()
    }

    pub fn set_standard_name(&mut self, name: Option<String>) {
        *self.current.common_mut().standard_name = name;
    }

    pub fn set_long_name(&mut self, name: Option<String>) {
        *self.current.common_mut().long_name = name;
    }

    pub fn set_var_name(&mut self, name: Option<String>) {
        *self.current.common_mut().var_name = name;
    }

    pub fn set_units(&mut self, units: Option<Units>) {
        *self.current.common_mut().units = units;
    }

    pub fn set_attributes(&mut self, attributes: Option<Attributes>) {
        *self.current.common_mut().attributes = attributes;
    }

    /// Resolve the display name from the current values.
    ///
    /// Behaves as [`Metadata::name`]. For a cube, absent attributes are
    /// first replaced with an empty mapping, so the call cannot fail with
    /// `MetadataError::InvalidAttributes`.
    pub fn name(
        &mut self,
        default: Option<&str>,
        require_token: bool,
    ) -> Result<String, MetadataError> {
        self.name_with(&NamingPolicy::default(), default, require_token)
    }

    /// Resolve the display name under a naming policy.
    pub fn name_with(
        &mut self,
        policy: &NamingPolicy,
        default: Option<&str>,
        require_token: bool,
    ) -> Result<String, MetadataError> {
        self.normalize_attributes();
        self.current.name_with(policy, default, require_token)
    }

    /// Get the names participating in a cube's identity.
    ///
    /// Returns `None` for non-cube schemas. Absent attributes are replaced
    /// with an empty mapping first.
    pub fn names(&mut self) -> Option<CubeNames> {
        self.names_with(&NamingPolicy::default())
    }

    /// Get a cube's identity names under a naming policy.
    pub fn names_with(&mut self, policy: &NamingPolicy) -> Option<CubeNames> {
        self.normalize_attributes();
        match &self.current {
            AnyMetadata::Cube(cube) => cube.names_with(policy).ok(),
            _ => None,
        }
    }

    /// Return the name if it is a valid token, otherwise `None`.
    pub fn token(name: Option<&str>) -> Option<&str> {
        naming::token(name)
    }

    fn normalize_attributes(&mut self) {
        if self.current.normalize_attributes() {
            debug!(schema = %self.kind(), "replaced absent attributes with an empty mapping");
        }
    }
}

fn reject_unknown<'a>(
    kind: SchemaKind,
    fields: impl Iterator<Item = &'a str>,
) -> Result<(), MetadataError> {
    let unknown: Vec<String> = fields
        .filter(|field| !kind.has_field(field))
        .map(str::to_string)
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(MetadataError::InvalidFields {
            schema: kind,
            fields: unknown,
        })
    }
}

impl From<AnyMetadata> for MetadataManager {
    fn from(record: AnyMetadata) -> Self {
        Self { current: record }
    }
}

impl From<MetadataManager> for AnyMetadata {
    fn from(manager: MetadataManager) -> Self {
        manager.current
    }
}

impl fmt::Display for MetadataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(
            f,
            "MetadataManager",
            self.fields(),
            &self.current.field_values(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::schema::{
        CellMeasureMetadata, CoordMetadata, CubeMetadata, FieldType,
    };
    use crate::core::types::{AttributeValue, CellMethod, Measure};

    fn no_values() -> Vec<(&'static str, FieldValue)> {
        Vec::new()
    }

    mod factory {
        use super::*;

        #[test]
        fn all_fields_start_absent() {
            let manager = create_manager(SchemaKind::Cube, no_values()).unwrap();
            assert_eq!(manager.kind(), SchemaKind::Cube);
            assert!(manager.state().values().all(Option::is_none));
            assert_eq!(manager.state().len(), SchemaKind::Cube.fields().len());
        }

        #[test]
        fn initial_values_applied() {
            let manager = create_manager(SchemaKind::Coord, [("standard_name", "lat")]).unwrap();
            assert_eq!(
                manager.values(),
                AnyMetadata::from(CoordMetadata::new().with_standard_name("lat"))
            );
        }

        #[test]
        fn unknown_field_rejected() {
            let err = create_manager(SchemaKind::Coord, [("bogus_field", 1i64.to_string())])
                .unwrap_err();
            assert_eq!(
                err,
                MetadataError::InvalidFields {
                    schema: SchemaKind::Coord,
                    fields: vec!["bogus_field".into()],
                }
            );
        }

        #[test]
        fn every_unknown_field_listed() {
            let err = create_manager(
                SchemaKind::Base,
                [("measure", "area"), ("long_name", "x"), ("cell_methods", "y")],
            )
            .unwrap_err();
            assert_eq!(
                err.to_string(),
                "invalid 'BaseMetadata' field parameters, got 'measure', 'cell_methods'"
            );
        }

        #[test]
        fn mistyped_value_rejected() {
            let err = create_manager(SchemaKind::CellMeasure, [("measure", "area")]).unwrap_err();
            assert!(matches!(
                err,
                MetadataError::InvalidFieldValue {
                    expected: FieldType::Measure,
                    found: FieldType::Text,
                    ..
                }
            ));
        }

        #[test]
        fn schema_by_name() {
            let manager = create_manager_for("CellMeasureMetadata", [("measure", Measure::Volume)])
                .unwrap();
            assert_eq!(manager.kind(), SchemaKind::CellMeasure);
            assert_eq!(
                manager.snapshot::<CellMeasureMetadata>().unwrap().measure(),
                Some(Measure::Volume)
            );
        }

        #[test]
        fn unknown_schema_name_rejected() {
            let err = create_manager_for("CoordinateMetadata", no_values()).unwrap_err();
            assert_eq!(err, MetadataError::UnknownSchema("CoordinateMetadata".into()));
        }
    }

    mod fields {
        use super::*;

        #[test]
        fn fields_match_schema() {
            for kind in SchemaKind::ALL {
                let manager = create_manager(kind, no_values()).unwrap();
                assert_eq!(manager.fields(), kind.fields());
            }
        }

        #[test]
        fn get_set_unset() {
            let mut manager = create_manager(SchemaKind::Coord, no_values()).unwrap();
            manager.set("climatological", true).unwrap();
            assert_eq!(manager.get("climatological").unwrap(), Some(FieldValue::Flag(true)));

            manager.unset("climatological").unwrap();
            assert_eq!(manager.get("climatological").unwrap(), None);
        }

        #[test]
        fn unknown_field_access_rejected() {
            let mut manager = create_manager(SchemaKind::AncillaryVariable, no_values()).unwrap();
            assert!(manager.get("measure").is_err());
            assert!(manager.set("coord_system", "x").is_err());
            assert!(manager.unset("cell_methods").is_err());
        }

        #[test]
        fn typed_accessors() {
            let mut manager = create_manager(SchemaKind::Base, no_values()).unwrap();
            manager.set_standard_name(Some("air_temperature".into()));
            manager.set_long_name(Some("Air Temperature".into()));
            manager.set_var_name(Some("tas".into()));
            manager.set_units(Some(Units::new("K").unwrap()));
            manager.set_attributes(Some(Attributes::new()));

            assert_eq!(manager.standard_name(), Some("air_temperature"));
            assert_eq!(manager.long_name(), Some("Air Temperature"));
            assert_eq!(manager.var_name(), Some("tas"));
            assert_eq!(manager.units().map(Units::as_str), Some("K"));
            assert_eq!(manager.attributes(), Some(&Attributes::new()));

            manager.set_standard_name(None);
            assert_eq!(manager.standard_name(), None);
        }

        #[test]
        fn snapshot_is_detached() {
            let mut manager = create_manager(SchemaKind::Base, [("var_name", "a")]).unwrap();
            let before = manager.values();
            manager.set("var_name", "b").unwrap();
            assert_eq!(before.var_name(), Some("a"));
            assert_eq!(manager.values().var_name(), Some("b"));
        }

        #[test]
        fn snapshot_of_other_schema() {
            let manager = create_manager(SchemaKind::Coord, no_values()).unwrap();
            assert!(manager.snapshot::<CubeMetadata>().is_none());
            assert!(manager.snapshot::<CoordMetadata>().is_some());
        }
    }

    mod naming {
        use super::*;

        #[test]
        fn delegates_to_schema() {
            let mut manager =
                create_manager(SchemaKind::Base, [("long_name", "L"), ("var_name", "V")]).unwrap();
            assert_eq!(manager.name(None, false).unwrap(), "L");
            assert_eq!(manager.name(None, true).unwrap(), "L");
        }

        #[test]
        fn default_name() {
            let mut manager = create_manager(SchemaKind::Coord, no_values()).unwrap();
            assert_eq!(manager.name(None, false).unwrap(), MetadataManager::DEFAULT_NAME);
        }

        #[test]
        fn cube_normalizes_absent_attributes() {
            let mut manager = create_manager(SchemaKind::Cube, no_values()).unwrap();
            assert_eq!(manager.attributes(), None);

            assert_eq!(manager.name(None, false).unwrap(), "unknown");
            assert_eq!(manager.attributes(), Some(&Attributes::new()));
        }

        #[test]
        fn cube_stash_fallback() {
            let mut attributes = Attributes::new();
            attributes.insert("STASH".into(), AttributeValue::from("m01s00i004"));
            let mut manager =
                create_manager(SchemaKind::Cube, [("attributes", attributes)]).unwrap();

            assert_eq!(manager.name(None, false).unwrap(), "m01s00i004");
            let names = manager.names().unwrap();
            assert_eq!(names.stash.as_deref(), Some("m01s00i004"));
        }

        #[test]
        fn names_only_for_cubes() {
            let mut manager = create_manager(SchemaKind::Coord, no_values()).unwrap();
            assert_eq!(manager.names(), None);
            assert_eq!(manager.attributes(), None);
        }

        #[test]
        fn cube_names_normalize() {
            let mut manager = create_manager(SchemaKind::Cube, [("var_name", "pr")]).unwrap();
            let names = manager.names().unwrap();
            assert_eq!(names.var_name.as_deref(), Some("pr"));
            assert_eq!(names.stash, None);
            assert_eq!(manager.attributes(), Some(&Attributes::new()));
        }

        #[test]
        fn token_mode_error() {
            let mut manager =
                create_manager(SchemaKind::Base, [("long_name", "bad name")]).unwrap();
            let err = manager.name(Some("no good"), true).unwrap_err();
            assert!(matches!(err, MetadataError::UnresolvableName(_)));
        }

        #[test]
        fn token() {
            assert_eq!(MetadataManager::token(Some("lat")), Some("lat"));
            assert_eq!(MetadataManager::token(Some("la t")), None);
            assert_eq!(MetadataManager::token(None), None);
        }
    }

    mod equality {
        use super::*;

        #[test]
        fn same_schema_same_values() {
            let a = create_manager(SchemaKind::Coord, [("var_name", "lat")]).unwrap();
            let b = create_manager(SchemaKind::Coord, [("var_name", "lat")]).unwrap();
            assert_eq!(a, b);
        }

        #[test]
        fn differing_value() {
            let a = create_manager(SchemaKind::Coord, [("var_name", "lat")]).unwrap();
            let b = create_manager(SchemaKind::Coord, [("var_name", "lon")]).unwrap();
            assert_ne!(a, b);
        }

        #[test]
        fn differing_schema() {
            let coord = create_manager(SchemaKind::Coord, [("var_name", "x")]).unwrap();
            let measure = create_manager(SchemaKind::CellMeasure, [("var_name", "x")]).unwrap();
            assert_ne!(coord, measure);
        }
    }

    mod state {
        use super::*;

        #[test]
        fn export_import_roundtrip() {
            let mut manager = create_manager(SchemaKind::Cube, [("var_name", "tas")]).unwrap();
            manager
                .set("cell_methods", vec![CellMethod::new("mean").unwrap().with_coord("time")])
                .unwrap();

            let state = manager.state();
            assert_eq!(state.len(), 6);
            assert_eq!(state["var_name"], Some(FieldValue::from("tas")));

            let restored = MetadataManager::from_state(SchemaKind::Cube, state).unwrap();
            assert_eq!(restored, manager);
            assert_eq!(restored.values(), manager.values());
        }

        #[test]
        fn import_rejects_unknown_fields() {
            let state = vec![("measure", Some(FieldValue::Measure(Measure::Area)))];
            let err = MetadataManager::from_state(SchemaKind::Coord, state).unwrap_err();
            assert!(matches!(err, MetadataError::InvalidFields { .. }));
        }

        #[test]
        fn serde_roundtrip() {
            let manager = create_manager(
                SchemaKind::CellMeasure,
                [("long_name", FieldValue::from("cell area")), ("measure", Measure::Area.into())],
            )
            .unwrap();

            let json = serde_json::to_string(&manager).unwrap();
            let restored: MetadataManager = serde_json::from_str(&json).unwrap();
            assert_eq!(restored.kind(), SchemaKind::CellMeasure);
            assert_eq!(restored, manager);
        }
    }

    #[test]
    fn display_lists_every_field() {
        let manager = create_manager(SchemaKind::Coord, [("standard_name", "latitude")]).unwrap();
        insta::assert_snapshot!(manager.to_string(), @r#"MetadataManager(standard_name="latitude", long_name=None, var_name=None, units=None, attributes=None, coord_system=None, climatological=None)"#);
    }
}
