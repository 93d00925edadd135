//! core::types
//!
//! Strong types for the payloads carried by metadata fields.
//!
//! # Types
//!
//! - [`Units`] - Unit-of-measure descriptor
//! - [`AttributeValue`] / [`Attributes`] - Free-form attribute mapping
//! - [`Measure`] - Kind of cell measure
//! - [`CoordSystem`] - Coordinate-system descriptor
//! - [`CellMethod`] - Cell-method descriptor
//! - [`Fingerprint`] - Content hash of a metadata record
//!
//! # Validation
//!
//! Types with textual content enforce validity at construction time.
//! Invalid values cannot be represented.
//!
//! # Examples
//!
//! ```
//! use dimmeta::core::types::{CellMethod, Measure, Units};
//!
//! let units = Units::new("m s-1").unwrap();
//! assert_eq!(units.as_str(), "m s-1");
//!
//! let measure: Measure = "area".parse().unwrap();
//! assert_eq!(measure, Measure::Area);
//!
//! let method = CellMethod::new("mean").unwrap().with_coord("time");
//! assert_eq!(method.to_string(), "time: mean");
//!
//! assert!(Units::new("").is_err());
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid units: {0}")]
    InvalidUnits(String),

    #[error("invalid measure '{0}', must be one of: area, volume")]
    InvalidMeasure(String),

    #[error("invalid coordinate system: {0}")]
    InvalidCoordSystem(String),

    #[error("invalid cell method: {0}")]
    InvalidCellMethod(String),
}

/// A unit-of-measure descriptor, e.g. `"K"`, `"m s-1"` or `"days since 1970-01-01"`.
///
/// The descriptor is opaque: it is not parsed or converted, only checked
/// to be non-blank and free of control characters. Surrounding whitespace
/// is trimmed.
///
/// # Example
///
/// ```
/// use dimmeta::core::types::Units;
///
/// let units = Units::new("  kg m-2  ").unwrap();
/// assert_eq!(units.as_str(), "kg m-2");
///
/// assert!(Units::new("   ").is_err());
/// assert!(Units::new("m\ns-1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Units(String);

impl Units {
    /// Create a new unit descriptor.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidUnits` if the descriptor is blank or
    /// contains control characters.
    pub fn new(units: impl Into<String>) -> Result<Self, TypeError> {
        let units = units.into();
        let trimmed = units.trim();

        if trimmed.is_empty() {
            return Err(TypeError::InvalidUnits("units cannot be empty".into()));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidUnits("units cannot contain control characters".into()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the descriptor as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Units {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Units> for String {
    fn from(units: Units) -> Self {
        units.0
    }
}

impl AsRef<str> for Units {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single attribute value.
///
/// Values form a total order: first by kind (bool < integer < float <
/// text < list), then by content. Integers compare numerically whichever
/// variant holds them. Floats use IEEE 754 total ordering, so `-0.0` sorts
/// before `0.0`; every `NaN` is treated as the same value, sorting after
/// positive infinity.
///
/// # Serialization
///
/// Values serialize as plain JSON scalars and arrays. Non-finite floats,
/// which JSON cannot express as numbers, serialize as a single-key object:
/// `{"float": "NaN"}`, `{"float": "inf"}` or `{"float": "-inf"}`.
///
/// ```
/// use dimmeta::core::types::AttributeValue;
///
/// let json = serde_json::to_string(&AttributeValue::Float(f64::NEG_INFINITY)).unwrap();
/// assert_eq!(json, r#"{"float":"-inf"}"#);
///
/// let parsed: AttributeValue = serde_json::from_str(&json).unwrap();
/// assert_eq!(parsed, AttributeValue::Float(f64::NEG_INFINITY));
/// ```
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    /// An integer above `i64::MAX`. Smaller values are held as `Int`.
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<AttributeValue>),
}

/// Key under which non-finite floats are serialized.
const NON_FINITE_KEY: &str = "float";

impl AttributeValue {
    fn rank(&self) -> u8 {
        match self {
            AttributeValue::Bool(_) => 0,
            AttributeValue::Int(_) | AttributeValue::UInt(_) => 1,
            AttributeValue::Float(_) => 2,
            AttributeValue::Text(_) => 3,
            AttributeValue::List(_) => 4,
        }
    }

    fn integer(&self) -> Option<i128> {
        match self {
            AttributeValue::Int(i) => Some(i128::from(*i)),
            AttributeValue::UInt(u) => Some(i128::from(*u)),
            _ => None,
        }
    }

    /// Get the value as a string slice if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

fn canonical_float(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else {
        x
    }
}

fn non_finite_label(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        Some("NaN")
    } else if x == f64::INFINITY {
        Some("inf")
    } else if x == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

fn parse_non_finite(label: &str) -> Option<f64> {
    match label {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a.cmp(b),
            (AttributeValue::Float(a), AttributeValue::Float(b)) => {
                canonical_float(*a).total_cmp(&canonical_float(*b))
            }
            (AttributeValue::Text(a), AttributeValue::Text(b)) => a.cmp(b),
            (AttributeValue::List(a), AttributeValue::List(b)) => a.cmp(b),
            _ => match (self.integer(), other.integer()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            AttributeValue::Bool(b) => b.hash(state),
            AttributeValue::Int(i) => i128::from(*i).hash(state),
            AttributeValue::UInt(u) => i128::from(*u).hash(state),
            AttributeValue::Float(x) => canonical_float(*x).to_bits().hash(state),
            AttributeValue::Text(s) => s.hash(state),
            AttributeValue::List(items) => items.hash(state),
        }
    }
}

/// Renders the value as plain text: strings are not quoted, lists are
/// bracketed and comma separated.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::UInt(u) => write!(f, "{u}"),
            AttributeValue::Float(x) => write!(f, "{x:?}"),
            AttributeValue::Text(s) => write!(f, "{s}"),
            AttributeValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Bool(b) => serializer.serialize_bool(*b),
            AttributeValue::Int(i) => serializer.serialize_i64(*i),
            AttributeValue::UInt(u) => serializer.serialize_u64(*u),
            AttributeValue::Float(x) => match non_finite_label(*x) {
                Some(label) => {
                    let mut map = serializer.serialize_map(Some(1))?;
                    map.serialize_entry(NON_FINITE_KEY, label)?;
                    map.end()
                }
                None => serializer.serialize_f64(*x),
            },
            AttributeValue::Text(s) => serializer.serialize_str(s),
            AttributeValue::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a boolean, number, string, list, or non-finite float object")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Self::Value, E> {
        Ok(AttributeValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Self::Value, E> {
        Ok(AttributeValue::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Self::Value, E> {
        Ok(AttributeValue::from(u))
    }

    fn visit_f64<E: de::Error>(self, x: f64) -> Result<Self::Value, E> {
        Ok(AttributeValue::Float(x))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        Ok(AttributeValue::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Self::Value, E> {
        Ok(AttributeValue::Text(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(AttributeValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let key: Option<String> = map.next_key()?;
        if key.as_deref() != Some(NON_FINITE_KEY) {
            return Err(de::Error::custom(format!(
                "attribute objects must have the single key '{NON_FINITE_KEY}'"
            )));
        }

        let label: String = map.next_value()?;
        let value = parse_non_finite(&label)
            .ok_or_else(|| de::Error::custom(format!("invalid non-finite float '{label}'")))?;

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(format!(
                "attribute objects must have the single key '{NON_FINITE_KEY}'"
            )));
        }
        Ok(AttributeValue::Float(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<u64> for AttributeValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => AttributeValue::Int(i),
            Err(_) => AttributeValue::UInt(u),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Free-form attribute mapping. Keys are kept sorted so that
/// iteration, display and serialization are deterministic.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Kind of cell measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Horizontal cell area
    Area,
    /// Cell volume
    Volume,
}

impl Measure {
    /// Get the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Area => "area",
            Measure::Volume => "volume",
        }
    }
}

impl FromStr for Measure {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "area" => Ok(Measure::Area),
            "volume" => Ok(Measure::Volume),
            other => Err(TypeError::InvalidMeasure(other.to_string())),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A coordinate-system descriptor.
///
/// Only the identity is modelled: the grid-mapping name (e.g.
/// `"latitude_longitude"`) and its defining parameters.
///
/// # Example
///
/// ```
/// use dimmeta::core::types::CoordSystem;
///
/// let cs = CoordSystem::new("latitude_longitude")
///     .unwrap()
///     .with_parameter("earth_radius", 6371229.0_f64);
/// assert_eq!(cs.grid_mapping_name(), "latitude_longitude");
/// assert_eq!(cs.to_string(), "latitude_longitude(earth_radius=6371229.0)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCoordSystem")]
pub struct CoordSystem {
    grid_mapping_name: String,
    parameters: Attributes,
}

/// Unvalidated wire form of [`CoordSystem`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCoordSystem {
    grid_mapping_name: String,
    #[serde(default)]
    parameters: Attributes,
}

impl TryFrom<RawCoordSystem> for CoordSystem {
    type Error = TypeError;

    fn try_from(raw: RawCoordSystem) -> Result<Self, Self::Error> {
        let mut cs = Self::new(raw.grid_mapping_name)?;
        cs.parameters = raw.parameters;
        Ok(cs)
    }
}

impl CoordSystem {
    /// Create a descriptor with no parameters.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCoordSystem` if the name is blank.
    pub fn new(grid_mapping_name: impl Into<String>) -> Result<Self, TypeError> {
        let grid_mapping_name = grid_mapping_name.into();
        if grid_mapping_name.trim().is_empty() {
            return Err(TypeError::InvalidCoordSystem(
                "grid mapping name cannot be empty".into(),
            ));
        }
        Ok(Self {
            grid_mapping_name,
            parameters: Attributes::new(),
        })
    }

    /// Add a defining parameter.
    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Get the grid-mapping name.
    pub fn grid_mapping_name(&self) -> &str {
        &self.grid_mapping_name
    }

    /// Get the defining parameters.
    pub fn parameters(&self) -> &Attributes {
        &self.parameters
    }
}

impl fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.grid_mapping_name)?;
        for (i, (key, value)) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, ")")
    }
}

/// A cell-method descriptor, e.g. `time: mean (interval: 1 hour)`.
///
/// # Example
///
/// ```
/// use dimmeta::core::types::CellMethod;
///
/// let method = CellMethod::new("maximum")
///     .unwrap()
///     .with_coord("time")
///     .with_interval("1 hour")
///     .with_comment("sampled");
/// assert_eq!(
///     method.to_string(),
///     "time: maximum (interval: 1 hour comment: sampled)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCellMethod")]
pub struct CellMethod {
    method: String,
    coords: Vec<String>,
    intervals: Vec<String>,
    comments: Vec<String>,
}

/// Unvalidated wire form of [`CellMethod`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCellMethod {
    method: String,
    #[serde(default)]
    coords: Vec<String>,
    #[serde(default)]
    intervals: Vec<String>,
    #[serde(default)]
    comments: Vec<String>,
}

impl TryFrom<RawCellMethod> for CellMethod {
    type Error = TypeError;

    fn try_from(raw: RawCellMethod) -> Result<Self, Self::Error> {
        Ok(Self {
            coords: raw.coords,
            intervals: raw.intervals,
            comments: raw.comments,
            ..Self::new(raw.method)?
        })
    }
}

impl CellMethod {
    /// Create a cell method with no coordinates, intervals or comments.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCellMethod` if the method name is blank.
    pub fn new(method: impl Into<String>) -> Result<Self, TypeError> {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(TypeError::InvalidCellMethod("method cannot be empty".into()));
        }
        Ok(Self {
            method,
            coords: Vec::new(),
            intervals: Vec::new(),
            comments: Vec::new(),
        })
    }

    /// Add a coordinate name the method applies over.
    pub fn with_coord(mut self, coord: impl Into<String>) -> Self {
        self.coords.push(coord.into());
        self
    }

    /// Add an interval.
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.intervals.push(interval.into());
        self
    }

    /// Add a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn coords(&self) -> &[String] {
        &self.coords
    }

    pub fn intervals(&self) -> &[String] {
        &self.intervals
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

impl fmt::Display for CellMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for coord in &self.coords {
            write!(f, "{coord}: ")?;
        }
        write!(f, "{}", self.method)?;

        if !self.intervals.is_empty() || !self.comments.is_empty() {
            let extra: Vec<String> = self
                .intervals
                .iter()
                .map(|i| format!("interval: {i}"))
                .chain(self.comments.iter().map(|c| format!("comment: {c}")))
                .collect();
            write!(f, " ({})", extra.join(" "))?;
        }

        Ok(())
    }
}

/// A stable content hash of a metadata record.
///
/// Unlike [`std::hash::Hash`], the fingerprint is stable across processes
/// and builds, so it can key persisted metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint over canonical bytes.
    pub fn compute(canonical: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical);
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
