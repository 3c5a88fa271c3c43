//! Property-based tests for the validation engine's quantified invariants:
//! reference-syntax predicate stability, cache transparency, resolver
//! monotonicity, coercion idempotence, descriptor round-tripping (a
//! conforming value walks an arbitrary data section without mutation), and
//! update-checker soundness over numeric ranges.
#![allow(clippy::expect_used)]

use datadict_core::{
    ArraySpec, Bound, CodeSection, DataSection, DictSpec, Dimension, KeyLeafType, KeySpec,
    LeafType, MemoryTermStore, RangeSpec, ScalarSpec, SetSpec, Term, ValidatorOptions, Validator,
    check_collection_name, check_handle_syntax, check_key, compare,
};
use proptest::prelude::*;
use serde_json::{Value, json};

const KEY_PAT: &str = r"[A-Za-z0-9\-._@+,=;$!*'%()]{1,254}";
const KEY_SHORT_PAT: &str = r"[A-Za-z0-9\-._@+,=;$!*'%()]{0,10}";
const KEY_OVERSIZED_PAT: &str = r"[A-Za-z0-9\-._@+,=;$!*'%()]{255,300}";
const FOREIGN_CHAR_PAT: &str = r"[ /\\:#?]";
const COLLECTION_PAT: &str = r"[A-Za-z0-9_\-]{1,128}";
const COLLECTION_SHORT_PAT: &str = r"[A-Za-z0-9_\-]{1,20}";

fn scalar_descriptor(key: &str, spec: ScalarSpec) -> Term {
    Term {
        key: key.to_owned(),
        code: None,
        data: Some(DataSection {
            scalar: Some(spec),
            ..DataSection::default()
        }),
        rule: None,
        path: None,
    }
}

fn enum_element(key: &str, local_id: &str, path: &[&str]) -> Term {
    Term {
        key: key.to_owned(),
        code: Some(CodeSection {
            local_id: Some(local_id.to_owned()),
            ..CodeSection::default()
        }),
        data: None,
        rule: None,
        path: Some(path.iter().map(|s| (*s).to_owned()).collect()),
    }
}

fn sex_store() -> MemoryTermStore {
    MemoryTermStore::with_terms([
        scalar_descriptor(
            "sex",
            ScalarSpec {
                leaf_type: Some(LeafType::Enum),
                kind: Some(vec!["sexEnum".to_owned()]),
                ..ScalarSpec::default()
            },
        ),
        enum_element("male", "m", &["sexEnum"]),
        enum_element("female", "f", &["sexEnum"]),
    ])
}

// ---------------------------------------------------------------------------
// Arbitrary data sections and values conforming to them
// ---------------------------------------------------------------------------

/// Leaves that need no store context: everything except the reference and
/// object shapes, and except timestamps (whose string form coerces).
fn self_contained_leaf() -> impl Strategy<Value = ScalarSpec> {
    prop_oneof![
        Just(LeafType::Boolean),
        Just(LeafType::Integer),
        Just(LeafType::Number),
        Just(LeafType::String),
        Just(LeafType::Date),
    ]
    .prop_map(|leaf| ScalarSpec {
        leaf_type: Some(leaf),
        ..ScalarSpec::default()
    })
}

/// Arbitrary data sections with exactly one dimensionality selector,
/// recursing through array elements and dict value sections.
fn data_section() -> impl Strategy<Value = DataSection> {
    let scalar = self_contained_leaf().prop_map(|spec| DataSection {
        scalar: Some(spec),
        ..DataSection::default()
    });
    scalar.prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|data| DataSection {
                array: Some(Box::new(ArraySpec {
                    min_items: None,
                    max_items: None,
                    data,
                })),
                ..DataSection::default()
            }),
            self_contained_leaf().prop_map(|spec| DataSection {
                set: Some(SetSpec {
                    min_items: None,
                    max_items: None,
                    scalar: Some(spec),
                }),
                ..DataSection::default()
            }),
            inner.prop_map(|value_section| DataSection {
                dict: Some(Box::new(DictSpec {
                    key: Some(KeySpec {
                        leaf_type: Some(KeyLeafType::String),
                        ..KeySpec::default()
                    }),
                    value: Some(Box::new(value_section)),
                })),
                ..DataSection::default()
            }),
        ]
    })
}

fn conforming_leaf(spec: &ScalarSpec) -> Value {
    match spec.leaf_type {
        Some(LeafType::Boolean) => json!(true),
        Some(LeafType::Integer) => json!(7),
        Some(LeafType::Number) => json!(2.5),
        Some(LeafType::String) => json!("specimen"),
        Some(LeafType::Date) => json!("2023"),
        Some(
            LeafType::Timestamp
            | LeafType::Key
            | LeafType::Handle
            | LeafType::Enum
            | LeafType::Struct
            | LeafType::Object
            | LeafType::Geojson,
        )
        | None => Value::Null,
    }
}

/// A value shaped to pass the given section untouched.
fn conforming_value(section: &DataSection) -> Value {
    match section.selector() {
        None => Value::Null,
        Some(Dimension::Scalar(spec)) => conforming_leaf(spec),
        Some(Dimension::Array(spec)) => {
            json!([conforming_value(&spec.data), conforming_value(&spec.data)])
        }
        Some(Dimension::Set(spec)) => match &spec.scalar {
            Some(element) => json!([conforming_leaf(element)]),
            None => json!([]),
        },
        Some(Dimension::Dict(spec)) => {
            let inner = spec.value.as_deref().map_or(Value::Null, conforming_value);
            json!({ "entry": inner })
        }
    }
}

proptest! {
    // --- Key/handle regex stability -------------------------------------

    #[test]
    fn keys_from_the_alphabet_pass(key in KEY_PAT) {
        prop_assert!(check_key(&key));
    }

    #[test]
    fn keys_with_foreign_characters_fail(
        prefix in KEY_SHORT_PAT,
        bad in FOREIGN_CHAR_PAT,
        suffix in KEY_SHORT_PAT,
    ) {
        let combined = format!("{}{}{}", prefix, bad, suffix);
        prop_assert!(!check_key(&combined));
    }

    #[test]
    fn oversized_keys_fail(key in KEY_OVERSIZED_PAT) {
        prop_assert!(!check_key(&key));
    }

    #[test]
    fn well_formed_handles_pass(collection in COLLECTION_PAT, key in KEY_PAT) {
        prop_assert!(check_collection_name(&collection));
        let handle = format!("{}/{}", collection, key);
        prop_assert!(check_handle_syntax(&handle));
    }

    #[test]
    fn handles_need_exactly_one_slash(
        collection in COLLECTION_SHORT_PAT,
        key in COLLECTION_SHORT_PAT,
        extra in COLLECTION_SHORT_PAT,
    ) {
        prop_assert!(!check_handle_syntax(&collection));
        let handle = format!("{}/{}/{}", collection, key, extra);
        prop_assert!(!check_handle_syntax(&handle));
    }

    // --- Cache transparency ---------------------------------------------

    #[test]
    fn cache_does_not_change_outcomes(
        values in proptest::collection::vec(
            prop_oneof![
                Just(json!("m")),
                Just(json!("male")),
                Just(json!("female")),
                Just(json!("unknown")),
                Just(json!(7)),
            ],
            1..8,
        )
    ) {
        let store = sex_store();
        let cached = Validator::with_options(&store, ValidatorOptions {
            zip: true,
            resolve: true,
            cache: true,
            cache_missing: true,
            ..ValidatorOptions::default()
        });
        let uncached = Validator::with_options(&store, ValidatorOptions {
            zip: true,
            resolve: true,
            cache: false,
            ..ValidatorOptions::default()
        });

        let mut with_cache = Value::Array(values.clone());
        let mut without_cache = Value::Array(values);
        let batch_cached = cached.validate(&mut with_cache, Some("sex")).expect("run");
        let batch_uncached = uncached.validate(&mut without_cache, Some("sex")).expect("run");

        prop_assert_eq!(batch_cached, batch_uncached);
        prop_assert_eq!(with_cache, without_cache);
    }

    // --- Resolver monotonicity ------------------------------------------

    #[test]
    fn resolution_never_adds_errors(
        values in proptest::collection::vec(
            prop_oneof![
                Just(json!("m")),
                Just(json!("f")),
                Just(json!("male")),
                Just(json!("unknown")),
            ],
            1..8,
        )
    ) {
        let store = sex_store();
        let resolving = Validator::with_options(&store, ValidatorOptions {
            zip: true,
            resolve: true,
            ..ValidatorOptions::default()
        });
        let strict = Validator::with_options(&store, ValidatorOptions {
            zip: true,
            resolve: false,
            ..ValidatorOptions::default()
        });

        let mut resolved_input = Value::Array(values.clone());
        let mut strict_input = Value::Array(values);
        let resolved = resolving.validate(&mut resolved_input, Some("sex")).expect("run");
        let strict_batch = strict.validate(&mut strict_input, Some("sex")).expect("run");

        for (with_resolve, without_resolve) in
            resolved.reports.iter().zip(strict_batch.reports.iter())
        {
            if with_resolve.is_error() {
                prop_assert!(
                    without_resolve.is_error(),
                    "resolution introduced an error where none existed"
                );
            }
        }
    }

    // --- Idempotence under coercion -------------------------------------

    #[test]
    fn accepted_values_stay_accepted_after_coercion(
        values in proptest::collection::vec(
            prop_oneof![
                Just(json!("m")),
                Just(json!("male")),
                Just(json!("female")),
            ],
            1..6,
        )
    ) {
        let store = sex_store();
        let validator = Validator::with_options(&store, ValidatorOptions {
            zip: true,
            resolve: true,
            ..ValidatorOptions::default()
        });

        let mut input = Value::Array(values);
        let first = validator.validate(&mut input, Some("sex")).expect("run");
        prop_assert!(first.resolution() >= 0);

        let snapshot = input.clone();
        let second = validator.validate(&mut input, Some("sex")).expect("run");
        prop_assert_eq!(second.resolution(), 0, "coerced batch passes untouched");
        prop_assert_eq!(input, snapshot, "second run must not mutate");
    }

    // --- Round trip over arbitrary data sections ------------------------

    #[test]
    fn conforming_values_walk_their_own_section_unmutated(section in data_section()) {
        let term = Term {
            key: "subject".to_owned(),
            code: None,
            data: Some(section.clone()),
            rule: None,
            path: None,
        };
        let store = MemoryTermStore::with_terms([term]);
        let validator = Validator::new(&store);

        let mut value = conforming_value(&section);
        let snapshot = value.clone();
        let batch = validator.validate(&mut value, Some("subject")).expect("run");

        prop_assert_eq!(batch.resolution(), 0, "conforming value must pass idle");
        prop_assert!(batch.reports[0].changes.is_empty());
        prop_assert_eq!(value, snapshot, "walking must not mutate");
    }

    // --- Update checker soundness over numeric ranges -------------------

    #[test]
    fn compatible_range_updates_preserve_valid_values(
        old_min in -50i64..0,
        old_max in 1i64..50,
        new_min in -60i64..10,
        new_max in -10i64..60,
        samples in proptest::collection::vec(-50i64..50, 1..10),
    ) {
        let range = |min: i64, max: i64| RangeSpec {
            min_incl: Some(Bound::Number(min as f64)),
            max_incl: Some(Bound::Number(max as f64)),
            ..RangeSpec::default()
        };
        let original = scalar_descriptor("n", ScalarSpec {
            leaf_type: Some(LeafType::Integer),
            range: Some(range(old_min, old_max)),
            ..ScalarSpec::default()
        });
        let mut updated = scalar_descriptor("n", ScalarSpec {
            leaf_type: Some(LeafType::Integer),
            range: Some(range(new_min, new_max)),
            ..ScalarSpec::default()
        });

        if compare(&original, &mut updated).is_none() {
            let store_original = MemoryTermStore::with_terms([original]);
            let store_updated = MemoryTermStore::with_terms([updated]);
            let before = Validator::new(&store_original);
            let after = Validator::new(&store_updated);

            for sample in samples {
                let mut value = json!(sample);
                let old_ok = before
                    .validate(&mut value, Some("n"))
                    .expect("run")
                    .resolution() == 0;
                if old_ok {
                    let new_code = after
                        .validate(&mut value, Some("n"))
                        .expect("run")
                        .resolution();
                    prop_assert!(
                        new_code >= 0,
                        "value {sample} passed the original but fails the accepted update"
                    );
                }
            }
        }
    }
}
