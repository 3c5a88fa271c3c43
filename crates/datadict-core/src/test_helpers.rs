//! Shared test helper functions for constructing term fixtures.
//!
//! Compiled only in test builds; provides common constructors for [`Term`]
//! records used across unit test modules throughout `datadict-core`.
//!
//! Integration tests in `crates/datadict-core/tests/` define their own local
//! helpers because they link against the non-test library build where this
//! module is not available.
#![allow(clippy::expect_used)]

use crate::term::{
    Bound, CodeSection, DataSection, LeafType, RangeSpec, RuleSection, ScalarSpec, Term,
};

/// Wraps a scalar specification into a data section.
pub fn scalar_section(spec: ScalarSpec) -> DataSection {
    DataSection {
        scalar: Some(spec),
        ..DataSection::default()
    }
}

/// Creates a descriptor term with the given data section.
pub fn descriptor_term(key: &str, data: DataSection) -> Term {
    Term {
        key: key.to_owned(),
        code: None,
        data: Some(data),
        rule: None,
        path: None,
    }
}

/// Creates an integer descriptor with an optional inclusive range.
pub fn integer_descriptor(key: &str, min_incl: Option<f64>, max_incl: Option<f64>) -> Term {
    let range = if min_incl.is_none() && max_incl.is_none() {
        None
    } else {
        Some(RangeSpec {
            min_incl: min_incl.map(Bound::Number),
            max_incl: max_incl.map(Bound::Number),
            ..RangeSpec::default()
        })
    };
    descriptor_term(
        key,
        scalar_section(ScalarSpec {
            leaf_type: Some(LeafType::Integer),
            range,
            ..ScalarSpec::default()
        }),
    )
}

/// Creates an enum element with a local identifier and an enum path.
pub fn enum_element(key: &str, local_id: &str, path: &[&str]) -> Term {
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

/// Creates a structure definition with the given rule section.
pub fn structure_term(key: &str, rule: RuleSection) -> Term {
    Term {
        key: key.to_owned(),
        code: None,
        data: None,
        rule: Some(rule),
        path: None,
    }
}
