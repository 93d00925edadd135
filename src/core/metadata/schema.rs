//! core::metadata::schema
//!
//! Immutable metadata records.
//!
//! # Hierarchy
//!
//! Every record carries the five [`BaseMetadata`] fields, in order, followed
//! by the fields its own schema declares:
//!
//! | Schema | Own fields |
//! |---|---|
//! | [`BaseMetadata`] | `standard_name`, `long_name`, `var_name`, `units`, `attributes` |
//! | [`AncillaryVariableMetadata`] | |
//! | [`CellMeasureMetadata`] | `measure` |
//! | [`CoordMetadata`] | `coord_system`, `climatological` |
//! | [`CubeMetadata`] | `cell_methods` |
//!
//! Field lists are fixed at compile time and exposed as [`Metadata::FIELDS`].
//!
//! # Immutability
//!
//! Records have no setters. `with_*` methods consume a record and return a
//! new one; owned, mutable metadata goes through
//! [`MetadataManager`](super::manager::MetadataManager).
//!
//! # Ordering
//!
//! Records of one schema are totally ordered field by field, in declared
//! order, with an absent value sorting before any present value. Records of
//! different schemas do not compare.
//!
//! # Example
//!
//! ```
//! use dimmeta::core::metadata::schema::{CoordMetadata, Metadata};
//!
//! let lat = CoordMetadata::new()
//!     .with_standard_name("latitude")
//!     .with_var_name("lat");
//! assert_eq!(lat.name(None, false).unwrap(), "latitude");
//!
//! let unnamed = CoordMetadata::new();
//! assert_eq!(unnamed.name(None, false).unwrap(), "unknown");
//! assert!(unnamed < lat);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::naming::{self, resolve_name, NamingPolicy};
use crate::core::types::{
    AttributeValue, Attributes, CellMethod, CoordSystem, Fingerprint, Measure, TypeError, Units,
};

/// Errors from metadata operations.
#[derive(Debug, Error, PartialEq)]
pub enum MetadataError {
    #[error("not a recognised metadata schema: '{0}'")]
    UnknownSchema(String),

    #[error("invalid '{schema}' field parameters, got {}", quote_all(.fields))]
    InvalidFields {
        schema: SchemaKind,
        fields: Vec<String>,
    },

    #[error("invalid value for '{schema}.{field}': expected {expected}, got {found}")]
    InvalidFieldValue {
        schema: SchemaKind,
        field: String,
        expected: FieldType,
        found: FieldType,
    },

    #[error("cannot retrieve a valid name token from {0}")]
    UnresolvableName(String),

    #[error("invalid '{0}.attributes' member, must be a mapping")]
    InvalidAttributes(SchemaKind),

    #[error("failed to parse metadata: {0}")]
    ParseError(String),

    #[error("failed to serialize metadata: {0}")]
    SerializeError(String),

    #[error("type validation failed: {0}")]
    TypeError(#[from] TypeError),
}

fn quote_all(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("'{f}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Identifies one of the metadata schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    #[serde(rename = "BaseMetadata")]
    Base,
    #[serde(rename = "AncillaryVariableMetadata")]
    AncillaryVariable,
    #[serde(rename = "CellMeasureMetadata")]
    CellMeasure,
    #[serde(rename = "CoordMetadata")]
    Coord,
    #[serde(rename = "CubeMetadata")]
    Cube,
}

impl SchemaKind {
    /// Every schema, root first.
    pub const ALL: [SchemaKind; 5] = [
        SchemaKind::Base,
        SchemaKind::AncillaryVariable,
        SchemaKind::CellMeasure,
        SchemaKind::Coord,
        SchemaKind::Cube,
    ];

    /// Get the canonical schema name, e.g. `"CoordMetadata"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Base => "BaseMetadata",
            SchemaKind::AncillaryVariable => "AncillaryVariableMetadata",
            SchemaKind::CellMeasure => "CellMeasureMetadata",
            SchemaKind::Coord => "CoordMetadata",
            SchemaKind::Cube => "CubeMetadata",
        }
    }

    /// Get the schema this one extends. `Base` is the root.
    pub fn parent(self) -> Option<SchemaKind> {
        match self {
            SchemaKind::Base => None,
            _ => Some(SchemaKind::Base),
        }
    }

    /// Get the ordered field names, inherited fields first.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            SchemaKind::Base => BaseMetadata::FIELDS,
            SchemaKind::AncillaryVariable => AncillaryVariableMetadata::FIELDS,
            SchemaKind::CellMeasure => CellMeasureMetadata::FIELDS,
            SchemaKind::Coord => CoordMetadata::FIELDS,
            SchemaKind::Cube => CubeMetadata::FIELDS,
        }
    }

    /// Get the fields this schema declares beyond its parent's.
    pub fn own_fields(self) -> &'static [&'static str] {
        let inherited = self.parent().map_or(0, |p| p.fields().len());
        &self.fields()[inherited..]
    }

    /// Get the payload type of a field, or `None` if the schema lacks it.
    pub fn field_type(self, field: &str) -> Option<FieldType> {
        let types = match self {
            SchemaKind::Base => BaseMetadata::FIELD_TYPES,
            SchemaKind::AncillaryVariable => AncillaryVariableMetadata::FIELD_TYPES,
            SchemaKind::CellMeasure => CellMeasureMetadata::FIELD_TYPES,
            SchemaKind::Coord => CoordMetadata::FIELD_TYPES,
            SchemaKind::Cube => CubeMetadata::FIELD_TYPES,
        };
        let index = self.fields().iter().position(|f| *f == field)?;
        types.get(index).copied()
    }

    /// Check whether the schema has a field.
    pub fn has_field(self, field: &str) -> bool {
        self.fields().iter().any(|f| *f == field)
    }
}

impl FromStr for SchemaKind {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MetadataError::UnknownSchema(s.to_string()))
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Units,
    Attributes,
    Measure,
    CoordSystem,
    Flag,
    CellMethods,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Units => "units",
            FieldType::Attributes => "attributes",
            FieldType::Measure => "measure",
            FieldType::CoordSystem => "coord system",
            FieldType::Flag => "flag",
            FieldType::CellMethods => "cell methods",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The value of a single field, addressed by name.
///
/// This is how managers read and write fields generically. Variants order
/// by their payload, so a sequence of field values sorts the same way the
/// records they came from do.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue {
    Text(String),
    Units(Units),
    Attributes(Attributes),
    Measure(Measure),
    CoordSystem(CoordSystem),
    Flag(bool),
    CellMethods(Vec<CellMethod>),
}

impl FieldValue {
    /// Get the payload type.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Units(_) => FieldType::Units,
            FieldValue::Attributes(_) => FieldType::Attributes,
            FieldValue::Measure(_) => FieldType::Measure,
            FieldValue::CoordSystem(_) => FieldType::CoordSystem,
            FieldValue::Flag(_) => FieldType::Flag,
            FieldValue::CellMethods(_) => FieldType::CellMethods,
        }
    }

    /// Get the value as a string slice if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Renders values the way they appear in a record's textual form:
/// strings quoted, absent values elsewhere shown as `None`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s:?}"),
            FieldValue::Units(u) => write!(f, "{:?}", u.as_str()),
            FieldValue::Attributes(attrs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: ")?;
                    write_attribute(f, value)?;
                }
                write!(f, "}}")
            }
            FieldValue::Measure(m) => write!(f, "{m}"),
            FieldValue::CoordSystem(cs) => write!(f, "{cs}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::CellMethods(methods) => {
                write!(f, "[")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", method.to_string())?;
                }
                write!(f, "]")
            }
        }
    }
}

fn write_attribute(f: &mut fmt::Formatter<'_>, value: &AttributeValue) -> fmt::Result {
    match value {
        AttributeValue::Text(s) => write!(f, "{s:?}"),
        AttributeValue::List(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_attribute(f, item)?;
            }
            write!(f, "]")
        }
        other => write!(f, "{other}"),
    }
}

/// Write `label(field=value, ...)` in field order.
pub(crate) fn write_fields(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    fields: &[&str],
    values: &[Option<FieldValue>],
) -> fmt::Result {
    write!(f, "{label}(")?;
    for (i, (field, value)) in fields.iter().zip(values).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match value {
            Some(value) => write!(f, "{field}={value}")?,
            None => write!(f, "{field}=None")?,
        }
    }
    write!(f, ")")
}

/// Payload types that can occupy a field.
pub trait FieldData: Sized {
    /// The field type this payload fills.
    const TYPE: FieldType;

    /// Wrap the payload as a [`FieldValue`].
    fn into_value(self) -> FieldValue;

    /// Unwrap a [`FieldValue`], handing it back if the type differs.
    fn from_value(value: FieldValue) -> Result<Self, FieldValue>;
}

macro_rules! impl_field_data {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldData for $ty {
                const TYPE: FieldType = FieldType::$variant;

                fn into_value(self) -> FieldValue {
                    FieldValue::$variant(self)
                }

                fn from_value(value: FieldValue) -> Result<Self, FieldValue> {
                    match value {
                        FieldValue::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }

            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value)
                }
            }
        )*
    };
}

impl_field_data! {
    String => Text,
    Units => Units,
    Attributes => Attributes,
    Measure => Measure,
    CoordSystem => CoordSystem,
    bool => Flag,
    Vec<CellMethod> => CellMethods,
}

fn assign<T: FieldData>(
    slot: &mut Option<T>,
    schema: SchemaKind,
    field: &str,
    value: Option<FieldValue>,
) -> Result<(), MetadataError> {
    *slot = match value {
        None => None,
        Some(value) => Some(T::from_value(value).map_err(|found| {
            MetadataError::InvalidFieldValue {
                schema,
                field: field.to_string(),
                expected: T::TYPE,
                found: found.field_type(),
            }
        })?),
    };
    Ok(())
}

/// Behaviour shared by every metadata record.
pub trait Metadata:
    Clone
    + fmt::Debug
    + fmt::Display
    + Default
    + Eq
    + Ord
    + Hash
    + Serialize
    + DeserializeOwned
    + Into<AnyMetadata>
{
    /// The schema this record belongs to.
    const KIND: SchemaKind;

    /// Ordered field names, inherited fields first.
    const FIELDS: &'static [&'static str];

    /// Payload type of each entry in [`FIELDS`](Self::FIELDS).
    const FIELD_TYPES: &'static [FieldType];

    fn standard_name(&self) -> Option<&str>;

    fn long_name(&self) -> Option<&str>;

    fn var_name(&self) -> Option<&str>;

    fn units(&self) -> Option<&Units>;

    fn attributes(&self) -> Option<&Attributes>;

    /// Field values in declared order.
    fn field_values(&self) -> Vec<Option<FieldValue>>;

    /// Extract this record type from the tagged union, handing it back if
    /// it holds another schema.
    fn from_any(any: AnyMetadata) -> Result<Self, AnyMetadata>;

    fn fields(&self) -> &'static [&'static str] {
        Self::FIELDS
    }

    /// Value of a named field.
    ///
    /// The outer `None` means the schema has no such field.
    fn field(&self, field: &str) -> Option<Option<FieldValue>> {
        let index = Self::FIELDS.iter().position(|f| *f == field)?;
        self.field_values().into_iter().nth(index)
    }

    /// Name candidates in priority order, before the default.
    fn name_candidates(
        &self,
        _policy: &NamingPolicy,
    ) -> Result<Vec<Option<String>>, MetadataError> {
        Ok(vec![
            self.standard_name().map(str::to_string),
            self.long_name().map(str::to_string),
            self.var_name().map(str::to_string),
        ])
    }

    /// Resolve the display name.
    ///
    /// Tries the standard name, long name and variable name (and for cubes
    /// the `STASH` attribute) before falling back to `default`, which
    /// itself defaults to `"unknown"`.
    ///
    /// With `require_token`, candidates that are not valid tokens are
    /// skipped, including the default.
    ///
    /// # Errors
    ///
    /// - `MetadataError::UnresolvableName` if `require_token` is set and no
    ///   candidate is a valid token
    /// - `MetadataError::InvalidAttributes` for a cube whose attributes are
    ///   absent
    fn name(&self, default: Option<&str>, require_token: bool) -> Result<String, MetadataError> {
        self.name_with(&NamingPolicy::default(), default, require_token)
    }

    /// Resolve the display name under a naming policy.
    ///
    /// See [`name`](Self::name).
    fn name_with(
        &self,
        policy: &NamingPolicy,
        default: Option<&str>,
        require_token: bool,
    ) -> Result<String, MetadataError> {
        let candidates = self.name_candidates(policy)?;
        let default = default.unwrap_or(policy.default_name.as_str());

        resolve_name(candidates.iter().map(Option::as_deref), default, require_token)
            .ok_or_else(|| MetadataError::UnresolvableName(self.to_string()))
    }

    /// Return the name if it is a valid token, otherwise `None`.
    fn token(name: Option<&str>) -> Option<&str> {
        naming::token(name)
    }

    /// Compute a stable content fingerprint.
    fn fingerprint(&self) -> Result<Fingerprint, MetadataError> {
        let any: AnyMetadata = self.clone().into();
        any.fingerprint()
    }
}

/// Mutable view of the fields every schema shares.
pub(crate) struct CommonFieldsMut<'a> {
    pub standard_name: &'a mut Option<String>,
    pub long_name: &'a mut Option<String>,
    pub var_name: &'a mut Option<String>,
    pub units: &'a mut Option<Units>,
    pub attributes: &'a mut Option<Attributes>,
}

macro_rules! metadata_record {
    (
        $(#[$doc:meta])*
        $name:ident => $kind:ident {
            $( $(#[$fdoc:meta])* $field:ident : $fty:ty ),* $(,)?
        }
        $( impl Metadata { $($items:tt)* } )?
    ) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(default, deny_unknown_fields)]
        pub struct $name {
            standard_name: Option<String>,
            long_name: Option<String>,
            var_name: Option<String>,
            units: Option<Units>,
            attributes: Option<Attributes>,
            $( $(#[$fdoc])* $field: Option<$fty>, )*
        }

        impl $name {
            /// Create a record with every field absent.
            pub fn new() -> Self {
                Self::default()
            }

            pub fn with_standard_name(mut self, name: impl Into<String>) -> Self {
                self.standard_name = Some(name.into());
                self
            }

            pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
                self.long_name = Some(name.into());
                self
            }

            pub fn with_var_name(mut self, name: impl Into<String>) -> Self {
                self.var_name = Some(name.into());
                self
            }

            pub fn with_units(mut self, units: Units) -> Self {
                self.units = Some(units);
                self
            }

            pub fn with_attributes(mut self, attributes: Attributes) -> Self {
                self.attributes = Some(attributes);
                self
            }

            /// Add one attribute, creating the mapping if absent.
            pub fn with_attribute(
                mut self,
                key: impl Into<String>,
                value: impl Into<AttributeValue>,
            ) -> Self {
                self.attributes
                    .get_or_insert_with(Attributes::new)
                    .insert(key.into(), value.into());
                self
            }

            pub(crate) fn common_mut(&mut self) -> CommonFieldsMut<'_> {
                CommonFieldsMut {
                    standard_name: &mut self.standard_name,
                    long_name: &mut self.long_name,
                    var_name: &mut self.var_name,
                    units: &mut self.units,
                    attributes: &mut self.attributes,
                }
            }

            pub(crate) fn replace_field(
                &mut self,
                field: &str,
                value: Option<FieldValue>,
            ) -> Result<(), MetadataError> {
                match field {
                    "standard_name" => assign(&mut self.standard_name, Self::KIND, field, value),
                    "long_name" => assign(&mut self.long_name, Self::KIND, field, value),
                    "var_name" => assign(&mut self.var_name, Self::KIND, field, value),
                    "units" => assign(&mut self.units, Self::KIND, field, value),
                    "attributes" => assign(&mut self.attributes, Self::KIND, field, value),
                    other => {
                        $(
                            if other == stringify!($field) {
                                return assign(&mut self.$field, Self::KIND, field, value);
                            }
                        )*
                        Err(MetadataError::InvalidFields {
                            schema: Self::KIND,
                            fields: vec![other.to_string()],
                        })
                    }
                }
            }
        }

        impl Metadata for $name {
            const KIND: SchemaKind = SchemaKind::$kind;

            const FIELDS: &'static [&'static str] = &[
                "standard_name",
                "long_name",
                "var_name",
                "units",
                "attributes",
                $( stringify!($field), )*
            ];

            const FIELD_TYPES: &'static [FieldType] = &[
                FieldType::Text,
                FieldType::Text,
                FieldType::Text,
                FieldType::Units,
                FieldType::Attributes,
                $( <$fty as FieldData>::TYPE, )*
            ];

            fn standard_name(&self) -> Option<&str> {
                self.standard_name.as_deref()
            }

            fn long_name(&self) -> Option<&str> {
                self.long_name.as_deref()
            }

            fn var_name(&self) -> Option<&str> {
                self.var_name.as_deref()
            }

            fn units(&self) -> Option<&Units> {
                self.units.as_ref()
            }

            fn attributes(&self) -> Option<&Attributes> {
                self.attributes.as_ref()
            }

            fn field_values(&self) -> Vec<Option<FieldValue>> {
                vec![
                    self.standard_name.clone().map(FieldData::into_value),
                    self.long_name.clone().map(FieldData::into_value),
                    self.var_name.clone().map(FieldData::into_value),
                    self.units.clone().map(FieldData::into_value),
                    self.attributes.clone().map(FieldData::into_value),
                    $( self.$field.clone().map(FieldData::into_value), )*
                ]
            }

            fn from_any(any: AnyMetadata) -> Result<Self, AnyMetadata> {
                match any {
                    AnyMetadata::$kind(record) => Ok(record),
                    other => Err(other),
                }
            }

            $( $($items)* )?
        }

        impl From<$name> for AnyMetadata {
            fn from(record: $name) -> Self {
                AnyMetadata::$kind(record)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_fields(f, Self::KIND.as_str(), Self::FIELDS, &self.field_values())
            }
        }
    };
}

metadata_record! {
    /// Metadata common to every dimensional data object.
    BaseMetadata => Base {}
}

metadata_record! {
    /// Metadata of an ancillary variable.
    AncillaryVariableMetadata => AncillaryVariable {}
}

metadata_record! {
    /// Metadata of a cell measure.
    CellMeasureMetadata => CellMeasure {
        /// Whether the measure is an area or a volume
        measure: Measure,
    }
}

metadata_record! {
    /// Metadata of a coordinate.
    CoordMetadata => Coord {
        /// Coordinate system the coordinate is defined in
        coord_system: CoordSystem,
        /// Whether the coordinate describes climatological time
        climatological: bool,
    }
}

metadata_record! {
    /// Metadata of a data cube.
    ///
    /// Cubes additionally fall back to the `STASH` attribute when naming,
    /// which requires `attributes` to be a mapping. An absent mapping
    /// cannot be filled in on an immutable record, so naming such a
    /// record fails with [`MetadataError::InvalidAttributes`].
    CubeMetadata => Cube {
        /// Statistical methods applied to the cube's cells
        cell_methods: Vec<CellMethod>,
    }
    impl Metadata {
        fn name_candidates(
            &self,
            policy: &NamingPolicy,
        ) -> Result<Vec<Option<String>>, MetadataError> {
            let names = self.names_with(policy)?;
            Ok(vec![names.standard_name, names.long_name, names.var_name, names.stash])
        }
    }
}

impl CellMeasureMetadata {
    pub fn measure(&self) -> Option<Measure> {
        self.measure
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measure = Some(measure);
        self
    }
}

impl CoordMetadata {
    pub fn coord_system(&self) -> Option<&CoordSystem> {
        self.coord_system.as_ref()
    }

    pub fn climatological(&self) -> Option<bool> {
        self.climatological
    }

    pub fn with_coord_system(mut self, coord_system: CoordSystem) -> Self {
        self.coord_system = Some(coord_system);
        self
    }

    pub fn with_climatological(mut self, climatological: bool) -> Self {
        self.climatological = Some(climatological);
        self
    }
}

/// The names participating in a cube's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeNames {
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
    pub var_name: Option<String>,
    /// The `STASH` attribute rendered as text, if present
    pub stash: Option<String>,
}

impl CubeMetadata {
    pub fn cell_methods(&self) -> Option<&[CellMethod]> {
        self.cell_methods.as_deref()
    }

    pub fn with_cell_methods(mut self, cell_methods: Vec<CellMethod>) -> Self {
        self.cell_methods = Some(cell_methods);
        self
    }

    /// Append one cell method, creating the sequence if absent.
    pub fn with_cell_method(mut self, cell_method: CellMethod) -> Self {
        self.cell_methods
            .get_or_insert_with(Vec::new)
            .push(cell_method);
        self
    }

    /// Get the names participating in the cube's identity.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidAttributes` if `attributes` is absent.
    ///
    /// # Example
    ///
    /// ```
    /// use dimmeta::core::metadata::schema::CubeMetadata;
    ///
    /// let cube = CubeMetadata::new()
    ///     .with_long_name("surface altitude")
    ///     .with_attribute("STASH", "m01s00i033");
    /// let names = cube.names().unwrap();
    /// assert_eq!(names.long_name.as_deref(), Some("surface altitude"));
    /// assert_eq!(names.stash.as_deref(), Some("m01s00i033"));
    ///
    /// assert!(CubeMetadata::new().names().is_err());
    /// ```
    pub fn names(&self) -> Result<CubeNames, MetadataError> {
        self.names_with(&NamingPolicy::default())
    }

    /// Get the identity names, reading the STASH key from a naming policy.
    pub fn names_with(&self, policy: &NamingPolicy) -> Result<CubeNames, MetadataError> {
        let attributes = self
            .attributes
            .as_ref()
            .ok_or(MetadataError::InvalidAttributes(Self::KIND))?;

        Ok(CubeNames {
            standard_name: self.standard_name.clone(),
            long_name: self.long_name.clone(),
            var_name: self.var_name.clone(),
            stash: attributes
                .get(&policy.stash_attribute)
                .map(ToString::to_string),
        })
    }
}

/// A metadata record of any schema.
///
/// Serializes adjacently tagged:
/// `{"schema": "CoordMetadata", "fields": {"standard_name": ..., ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "schema", content = "fields")]
pub enum AnyMetadata {
    #[serde(rename = "BaseMetadata")]
    Base(BaseMetadata),
    #[serde(rename = "AncillaryVariableMetadata")]
    AncillaryVariable(AncillaryVariableMetadata),
    #[serde(rename = "CellMeasureMetadata")]
    CellMeasure(CellMeasureMetadata),
    #[serde(rename = "CoordMetadata")]
    Coord(CoordMetadata),
    #[serde(rename = "CubeMetadata")]
    Cube(CubeMetadata),
}

macro_rules! dispatch {
    ($any:expr, $record:ident => $body:expr) => {
        match $any {
            AnyMetadata::Base($record) => $body,
            AnyMetadata::AncillaryVariable($record) => $body,
            AnyMetadata::CellMeasure($record) => $body,
            AnyMetadata::Coord($record) => $body,
            AnyMetadata::Cube($record) => $body,
        }
    };
}

impl AnyMetadata {
    /// Create a record of the given schema with every field absent.
    pub fn empty(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::Base => BaseMetadata::default().into(),
            SchemaKind::AncillaryVariable => AncillaryVariableMetadata::default().into(),
            SchemaKind::CellMeasure => CellMeasureMetadata::default().into(),
            SchemaKind::Coord => CoordMetadata::default().into(),
            SchemaKind::Cube => CubeMetadata::default().into(),
        }
    }

    /// Get the schema of the held record.
    pub fn kind(&self) -> SchemaKind {
        match self {
            AnyMetadata::Base(_) => SchemaKind::Base,
            AnyMetadata::AncillaryVariable(_) => SchemaKind::AncillaryVariable,
            AnyMetadata::CellMeasure(_) => SchemaKind::CellMeasure,
            AnyMetadata::Coord(_) => SchemaKind::Coord,
            AnyMetadata::Cube(_) => SchemaKind::Cube,
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.kind().fields()
    }

    pub fn field_values(&self) -> Vec<Option<FieldValue>> {
        dispatch!(self, record => record.field_values())
    }

    /// Value of a named field. The outer `None` means no such field.
    pub fn field(&self, field: &str) -> Option<Option<FieldValue>> {
        dispatch!(self, record => record.field(field))
    }

    pub fn standard_name(&self) -> Option<&str> {
        dispatch!(self, record => record.standard_name())
    }

    pub fn long_name(&self) -> Option<&str> {
        dispatch!(self, record => record.long_name())
    }

    pub fn var_name(&self) -> Option<&str> {
        dispatch!(self, record => record.var_name())
    }

    pub fn units(&self) -> Option<&Units> {
        dispatch!(self, record => record.units())
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        dispatch!(self, record => record.attributes())
    }

    /// Resolve the display name. See [`Metadata::name`].
    pub fn name(
        &self,
        default: Option<&str>,
        require_token: bool,
    ) -> Result<String, MetadataError> {
        dispatch!(self, record => record.name(default, require_token))
    }

    /// Resolve the display name under a naming policy.
    pub fn name_with(
        &self,
        policy: &NamingPolicy,
        default: Option<&str>,
        require_token: bool,
    ) -> Result<String, MetadataError> {
        dispatch!(self, record => record.name_with(policy, default, require_token))
    }

    /// Compute a stable content fingerprint over the canonical JSON form,
    /// schema tag included.
    pub fn fingerprint(&self) -> Result<Fingerprint, MetadataError> {
        let canonical =
            serde_json::to_vec(self).map_err(|e| MetadataError::SerializeError(e.to_string()))?;
        Ok(Fingerprint::compute(&canonical))
    }

    /// Extract a concrete record type.
    ///
    /// Returns `None` if the record belongs to another schema.
    pub fn downcast<M: Metadata>(self) -> Option<M> {
        M::from_any(self).ok()
    }

    pub(crate) fn common_mut(&mut self) -> CommonFieldsMut<'_> {
        dispatch!(self, record => record.common_mut())
    }

    pub(crate) fn replace_field(
        &mut self,
        field: &str,
        value: Option<FieldValue>,
    ) -> Result<(), MetadataError> {
        dispatch!(self, record => record.replace_field(field, value))
    }

    /// Replace absent cube attributes with an empty mapping.
    ///
    /// Returns `true` if a replacement was made.
    pub(crate) fn normalize_attributes(&mut self) -> bool {
        match self {
            AnyMetadata::Cube(cube) if cube.attributes.is_none() => {
                cube.attributes = Some(Attributes::new());
                true
            }
            _ => false,
        }
    }
}

/// Records of the same schema compare by the record ordering; records of
/// different schemas are unordered.
impl PartialOrd for AnyMetadata {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (AnyMetadata::Base(a), AnyMetadata::Base(b)) => Some(a.cmp(b)),
            (AnyMetadata::AncillaryVariable(a), AnyMetadata::AncillaryVariable(b)) => {
                Some(a.cmp(b))
            }
            (AnyMetadata::CellMeasure(a), AnyMetadata::CellMeasure(b)) => Some(a.cmp(b)),
            (AnyMetadata::Coord(a), AnyMetadata::Coord(b)) => Some(a.cmp(b)),
            (AnyMetadata::Cube(a), AnyMetadata::Cube(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for AnyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, record => fmt::Display::fmt(record, f))
    }
}

/// Parse a serialized record of any schema.
///
/// # Errors
///
/// Returns `MetadataError::ParseError` if the JSON is malformed, names an
/// unknown schema, or carries fields the schema does not declare.
///
/// # Example
///
/// ```
/// use dimmeta::core::metadata::schema::{parse_metadata, SchemaKind};
///
/// let json = r#"{
///     "schema": "CellMeasureMetadata",
///     "fields": { "long_name": "cell area", "measure": "area" }
/// }"#;
///
/// let meta = parse_metadata(json).unwrap();
/// assert_eq!(meta.kind(), SchemaKind::CellMeasure);
/// assert_eq!(meta.long_name(), Some("cell area"));
/// ```
pub fn parse_metadata(json: &str) -> Result<AnyMetadata, MetadataError> {
    serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))
}
