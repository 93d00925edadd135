//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::cmp::Ordering;

use proptest::prelude::*;

use dimmeta::core::metadata::schema::{
    parse_metadata, AnyMetadata, CoordMetadata, FieldValue, Metadata, SchemaKind,
};
use dimmeta::core::metadata::{create_manager, MetadataManager};
use dimmeta::core::naming::{is_token, resolve_name, token};
use dimmeta::core::types::{AttributeValue, Attributes, Units};

/// Strategy for generating characters allowed after the first token char.
fn token_tail_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('_'),
        Just('.'),
        Just('+'),
        Just('-'),
        Just('@'),
    ]
}

/// Strategy for generating valid tokens.
fn valid_token() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            prop::char::range('a', 'z'),
            prop::char::range('A', 'Z'),
            prop::char::range('0', '9'),
        ],
        prop::collection::vec(token_tail_char(), 0..30),
    )
        .prop_map(|(first, rest)| std::iter::once(first).chain(rest).collect())
}

/// Strategy for optional names, including non-token text.
fn optional_name() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![valid_token(), "[ a-z]{0,8}"])
}

/// Strategy for floats, weighted towards values JSON cannot spell directly.
fn float() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => any::<f64>(),
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
        1 => Just(-0.0),
        1 => Just(f64::MIN_POSITIVE),
    ]
}

fn attribute_value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        any::<bool>().prop_map(AttributeValue::from),
        any::<i64>().prop_map(AttributeValue::from),
        float().prop_map(AttributeValue::from),
        any::<u64>().prop_map(AttributeValue::from),
        "[a-z0-9 ]{0,12}".prop_map(AttributeValue::from),
    ]
}

fn attributes() -> impl Strategy<Value = Option<Attributes>> {
    prop::option::of(prop::collection::btree_map("[a-z_]{1,8}", attribute_value(), 0..4))
}

fn coord_record() -> impl Strategy<Value = CoordMetadata> {
    (
        optional_name(),
        optional_name(),
        optional_name(),
        prop::option::of(prop::sample::select(vec!["K", "m", "degrees_north", "1"])),
        attributes(),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(standard, long, var, units, attributes, climatological)| {
            let mut record = CoordMetadata::new();
            if let Some(name) = standard {
                record = record.with_standard_name(name);
            }
            if let Some(name) = long {
                record = record.with_long_name(name);
            }
            if let Some(name) = var {
                record = record.with_var_name(name);
            }
            if let Some(units) = units {
                record = record.with_units(Units::new(units).unwrap());
            }
            if let Some(attributes) = attributes {
                record = record.with_attributes(attributes);
            }
            if let Some(flag) = climatological {
                record = record.with_climatological(flag);
            }
            record
        })
}

proptest! {
    /// Every generated token satisfies the grammar.
    #[test]
    fn valid_tokens_accepted(name in valid_token()) {
        prop_assert!(is_token(&name));
        prop_assert_eq!(token(Some(name.as_str())), Some(name.as_str()));
    }

    /// A leading character outside [A-Za-z0-9] is always rejected.
    #[test]
    fn leading_symbol_rejected(
        lead in prop::sample::select(vec!['_', '.', '+', '-', '@', ' ']),
        rest in valid_token(),
    ) {
        let name = format!("{lead}{rest}");
        prop_assert!(!is_token(&name));
    }

    /// Any embedded whitespace is rejected.
    #[test]
    fn whitespace_rejected(a in valid_token(), b in valid_token()) {
        let name = format!("{a} {b}");
        prop_assert!(!is_token(&name));
    }

    /// In token mode, resolution only ever yields tokens.
    #[test]
    fn token_mode_yields_tokens(
        candidates in prop::collection::vec(optional_name(), 0..4),
        default in "[ a-z]{0,6}",
    ) {
        let resolved = resolve_name(candidates.iter().map(Option::as_deref), &default, true);
        if let Some(name) = resolved {
            prop_assert!(is_token(&name));
        }
    }

    /// Resolution without token mode always yields something.
    #[test]
    fn plain_mode_always_resolves(candidates in prop::collection::vec(optional_name(), 0..4)) {
        let resolved = resolve_name(candidates.iter().map(Option::as_deref), "unknown", false);
        prop_assert!(resolved.is_some());
    }

    /// Record ordering is a total order consistent with equality.
    #[test]
    fn ordering_consistent_with_eq(a in coord_record(), b in coord_record()) {
        let forward = a.cmp(&b);
        prop_assert_eq!(forward, b.cmp(&a).reverse());
        prop_assert_eq!(forward == Ordering::Equal, a == b);
    }

    /// Ordering is transitive.
    #[test]
    fn ordering_transitive(a in coord_record(), b in coord_record(), c in coord_record()) {
        let mut sorted = [a, b, c];
        sorted.sort();
        prop_assert!(sorted[0] <= sorted[1]);
        prop_assert!(sorted[1] <= sorted[2]);
        prop_assert!(sorted[0] <= sorted[2]);
    }

    /// Clearing a field sorts the record before the same record with it set.
    #[test]
    fn absent_sorts_first(record in coord_record(), name in valid_token()) {
        let mut manager = MetadataManager::from_record(record);
        manager.set_standard_name(None);
        let absent = manager.snapshot::<CoordMetadata>().unwrap();
        manager.set_standard_name(Some(name));
        let present = manager.snapshot::<CoordMetadata>().unwrap();
        prop_assert!(absent < present);
    }

    /// Records survive a JSON round-trip through the tagged form.
    #[test]
    fn record_serde_roundtrip(record in coord_record()) {
        let any = AnyMetadata::from(record);
        let json = serde_json::to_string(&any).unwrap();
        let parsed = parse_metadata(&json).unwrap();
        prop_assert_eq!(parsed, any);
    }

    /// Fingerprints are deterministic and track equality.
    #[test]
    fn fingerprint_tracks_equality(a in coord_record(), b in coord_record()) {
        let fa = a.fingerprint().unwrap();
        prop_assert_eq!(&fa, &a.fingerprint().unwrap());
        if a == b {
            prop_assert_eq!(fa, b.fingerprint().unwrap());
        }
    }

    /// Manager state export and import is lossless.
    #[test]
    fn manager_state_roundtrip(record in coord_record()) {
        let manager = MetadataManager::from_record(record.clone());
        let restored = MetadataManager::from_state(SchemaKind::Coord, manager.state()).unwrap();
        prop_assert_eq!(&restored, &manager);
        prop_assert_eq!(restored.snapshot::<CoordMetadata>(), Some(record));
    }

    /// Setting every field of a record through a manager reproduces it.
    #[test]
    fn manager_set_reproduces_record(record in coord_record()) {
        let mut manager =
            create_manager(SchemaKind::Coord, Vec::<(&str, FieldValue)>::new()).unwrap();
        for (field, value) in record.fields_and_values() {
            manager.replace(field, value).unwrap();
        }
        prop_assert_eq!(manager.snapshot::<CoordMetadata>(), Some(record));
    }
}

trait FieldsAndValues {
    fn fields_and_values(&self) -> Vec<(&'static str, Option<FieldValue>)>;
}

impl<M: Metadata> FieldsAndValues for M {
    fn fields_and_values(&self) -> Vec<(&'static str, Option<FieldValue>)> {
        M::FIELDS.iter().copied().zip(self.field_values()).collect()
    }
}
