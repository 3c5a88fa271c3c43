//! Update compatibility checking.
//!
//! [`compare`] answers one question about a proposed descriptor edit: would
//! any value that validates against the original term stop validating
//! against the update? Changes that enlarge freedom (a removed range, a
//! grown kind list, fewer banned properties) pass; silent tightenings are
//! rejected with a human message and a minimal `{field: {old, new}}` diff.
//!
//! The checker is pure: it touches neither the term cache nor the
//! repository, stops at the first incompatibility, and performs exactly one
//! mutation — the official-identifiers repair, which appends a missing
//! local identifier without erroring.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::term::{
    ArraySpec, Bound, DataSection, DictSpec, KeySpec, RangeSpec, RuleSection, ScalarSpec, SetSpec,
    Term,
};

// ---------------------------------------------------------------------------
// Incompat
// ---------------------------------------------------------------------------

/// A change on one field: its previous and proposed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    /// The value in the original term (`null` when absent).
    pub old: Value,
    /// The value in the proposed update (`null` when absent).
    pub new: Value,
}

/// A rejected descriptor update: a human message plus the minimal diff that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incompat {
    /// Human-readable rejection reason.
    pub message: String,
    /// The offending field with its old and new values.
    pub diff: BTreeMap<String, FieldChange>,
}

impl Incompat {
    fn new(message: impl Into<String>, field: impl Into<String>, old: Value, new: Value) -> Self {
        let mut diff = BTreeMap::new();
        diff.insert(field.into(), FieldChange { old, new });
        Self {
            message: message.into(),
            diff,
        }
    }
}

impl fmt::Display for Incompat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

/// Compares a term against its proposed update.
///
/// Returns `None` when the update cannot invalidate already-stored data,
/// otherwise the first incompatibility encountered. The update's official
/// identifiers are repaired in place (missing local id appended) as a side
/// effect; nothing else is mutated.
pub fn compare(original: &Term, updated: &mut Term) -> Option<Incompat> {
    if original.key != updated.key {
        return Some(Incompat::new(
            "Document key has changed",
            "key",
            Value::String(original.key.clone()),
            Value::String(updated.key.clone()),
        ));
    }

    if let Some(incompat) = compare_code(original, updated) {
        return Some(incompat);
    }

    match (&original.data, &updated.data) {
        (None, None) => {}
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Data section cannot be added to a non-descriptor",
                "data",
                Value::Null,
                to_value(added),
            ));
        }
        (Some(removed), None) => {
            return Some(Incompat::new(
                "Data section cannot be removed from a descriptor",
                "data",
                to_value(removed),
                Value::Null,
            ));
        }
        (Some(old), Some(new)) => {
            if let Some(incompat) = compare_data(old, new) {
                return Some(incompat);
            }
        }
    }

    match (&original.rule, &updated.rule) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Rule section cannot be added to an unstructured term",
            "rule",
            Value::Null,
            to_value(added),
        )),
        (Some(old), Some(new)) => compare_rule(old, new),
    }
}

// ---------------------------------------------------------------------------
// Code section
// ---------------------------------------------------------------------------

fn compare_code(original: &Term, updated: &mut Term) -> Option<Incompat> {
    let old_code = original.code.clone().unwrap_or_default();
    let new_code = updated.code.clone().unwrap_or_default();

    if let Some(incompat) = immutable_text(
        "Local identifier",
        "local_id",
        old_code.local_id.as_deref(),
        new_code.local_id.as_deref(),
    ) {
        return Some(incompat);
    }
    if let Some(incompat) = immutable_text(
        "Namespace identifier",
        "namespace_id",
        old_code.namespace_id.as_deref(),
        new_code.namespace_id.as_deref(),
    ) {
        return Some(incompat);
    }
    if let Some(incompat) = immutable_text(
        "Global identifier",
        "global_id",
        old_code.global_id.as_deref(),
        new_code.global_id.as_deref(),
    ) {
        return Some(incompat);
    }

    // Repair: the official identifiers are expected to carry the local id.
    if let Some(code) = &mut updated.code {
        if let Some(local) = code.local_id.clone() {
            if !code.official_ids.contains(&local) {
                code.official_ids.push(local);
            }
        }
    }
    None
}

/// Rejects any difference on an immutable identifier field, distinguishing
/// addition, removal and change in the message.
fn immutable_text(
    label: &str,
    field: &str,
    old: Option<&str>,
    new: Option<&str>,
) -> Option<Incompat> {
    let message = match (old, new) {
        (None, Some(_)) => format!("{label} cannot be added"),
        (Some(_), None) => format!("{label} cannot be removed"),
        (Some(a), Some(b)) if a != b => format!("{label} has changed"),
        (None, None) | (Some(_), Some(_)) => return None,
    };
    Some(Incompat::new(
        message,
        field,
        old.map_or(Value::Null, |s| Value::String(s.to_owned())),
        new.map_or(Value::Null, |s| Value::String(s.to_owned())),
    ))
}

// ---------------------------------------------------------------------------
// Data section
// ---------------------------------------------------------------------------

fn compare_data(original: &DataSection, updated: &DataSection) -> Option<Incompat> {
    let old_dim = original.selector().map(|d| d.name()).unwrap_or("none");
    let new_dim = updated.selector().map(|d| d.name()).unwrap_or("none");
    if old_dim != new_dim {
        return Some(Incompat::new(
            "Data dimensionality has changed",
            "dimension",
            Value::String(old_dim.to_owned()),
            Value::String(new_dim.to_owned()),
        ));
    }

    if let (Some(old), Some(new)) = (&original.scalar, &updated.scalar) {
        return compare_leaf(old, new);
    }
    if let (Some(old), Some(new)) = (&original.array, &updated.array) {
        return compare_array(old, new);
    }
    if let (Some(old), Some(new)) = (&original.set, &updated.set) {
        return compare_set(old, new);
    }
    if let (Some(old), Some(new)) = (&original.dict, &updated.dict) {
        return compare_dict(old, new);
    }
    None
}

fn compare_array(original: &ArraySpec, updated: &ArraySpec) -> Option<Incompat> {
    if let Some(incompat) = compare_counts(
        original.min_items,
        updated.min_items,
        original.max_items,
        updated.max_items,
    ) {
        return Some(incompat);
    }
    compare_data(&original.data, &updated.data)
}

fn compare_set(original: &SetSpec, updated: &SetSpec) -> Option<Incompat> {
    if let Some(incompat) = compare_counts(
        original.min_items,
        updated.min_items,
        original.max_items,
        updated.max_items,
    ) {
        return Some(incompat);
    }
    match (&original.scalar, &updated.scalar) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Set element restriction has been added",
            "scalar",
            Value::Null,
            to_value(added),
        )),
        (Some(old), Some(new)) => compare_leaf(old, new),
    }
}

fn compare_dict(original: &DictSpec, updated: &DictSpec) -> Option<Incompat> {
    match (&original.key, &updated.key) {
        (None, None) | (Some(_), None) => {}
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Dictionary key restriction has been added",
                "key",
                Value::Null,
                to_value(added),
            ));
        }
        (Some(old), Some(new)) => {
            if let Some(incompat) = compare_key_leaf(old, new) {
                return Some(incompat);
            }
        }
    }
    match (&original.value, &updated.value) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Dictionary value restriction has been added",
            "value",
            Value::Null,
            to_value(added),
        )),
        (Some(old), Some(new)) => compare_data(old, new),
    }
}

fn compare_leaf(original: &ScalarSpec, updated: &ScalarSpec) -> Option<Incompat> {
    if original.leaf_type != updated.leaf_type {
        return Some(Incompat::new(
            "Scalar type has changed",
            "type",
            to_value(&original.leaf_type),
            to_value(&updated.leaf_type),
        ));
    }
    if original.format != updated.format {
        return Some(Incompat::new(
            "Format has changed",
            "format",
            to_value(&original.format),
            to_value(&updated.format),
        ));
    }
    if original.unit != updated.unit {
        return Some(Incompat::new(
            "Unit has changed",
            "unit",
            to_value(&original.unit),
            to_value(&updated.unit),
        ));
    }
    if original.regex != updated.regex {
        return Some(Incompat::new(
            "Pattern has changed",
            "regex",
            to_value(&original.regex),
            to_value(&updated.regex),
        ));
    }
    if let Some(incompat) = compare_kind(original.kind.as_deref(), updated.kind.as_deref()) {
        return Some(incompat);
    }
    compare_range(original.range.as_ref(), updated.range.as_ref())
}

fn compare_key_leaf(original: &KeySpec, updated: &KeySpec) -> Option<Incompat> {
    if original.leaf_type != updated.leaf_type {
        return Some(Incompat::new(
            "Dictionary key type has changed",
            "type",
            to_value(&original.leaf_type),
            to_value(&updated.leaf_type),
        ));
    }
    if original.regex != updated.regex {
        return Some(Incompat::new(
            "Pattern has changed",
            "regex",
            to_value(&original.regex),
            to_value(&updated.regex),
        ));
    }
    if let Some(incompat) = compare_kind(original.kind.as_deref(), updated.kind.as_deref()) {
        return Some(incompat);
    }
    compare_range(original.range.as_ref(), updated.range.as_ref())
}

/// Kind lists may grow but not shrink. An absent list means unrestricted,
/// so adding one is itself a shrink.
fn compare_kind(original: Option<&[String]>, updated: Option<&[String]>) -> Option<Incompat> {
    match (original, updated) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Kind restriction has been added",
            "kind",
            Value::Null,
            to_value(&added),
        )),
        (Some(old), Some(new)) => {
            if old.iter().all(|k| new.contains(k)) {
                return None;
            }
            Some(Incompat::new(
                "Kind restrictions have shrunk",
                "kind",
                to_value(&old),
                to_value(&new),
            ))
        }
    }
}

/// Ranges may widen but not tighten; adding a range where none existed is a
/// tightening, removing one is permitted.
fn compare_range(original: Option<&RangeSpec>, updated: Option<&RangeSpec>) -> Option<Incompat> {
    let (old, new) = match (original, updated) {
        (None, None) | (Some(_), None) => return None,
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Range restriction has been added",
                "range",
                Value::Null,
                to_value(added),
            ));
        }
        (Some(old), Some(new)) => (old, new),
    };

    for (field, old_bound, new_bound, is_min) in [
        ("min_incl", &old.min_incl, &new.min_incl, true),
        ("min_excl", &old.min_excl, &new.min_excl, true),
        ("max_incl", &old.max_incl, &new.max_incl, false),
        ("max_excl", &old.max_excl, &new.max_excl, false),
    ] {
        if let Some(incompat) = compare_bound(field, old_bound.as_ref(), new_bound.as_ref(), is_min)
        {
            return Some(incompat);
        }
    }
    None
}

/// One side of a range. Minimums may only decrease, maximums only increase;
/// a bound appearing where none existed is a tightening.
fn compare_bound(
    field: &str,
    old: Option<&Bound>,
    new: Option<&Bound>,
    is_min: bool,
) -> Option<Incompat> {
    let (old, new) = match (old, new) {
        (None, None) | (Some(_), None) => return None,
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Range restriction has been added",
                field,
                Value::Null,
                to_value(added),
            ));
        }
        (Some(old), Some(new)) => (old, new),
    };

    let widened_or_equal = match (old, new) {
        (Bound::Number(a), Bound::Number(b)) => {
            if is_min {
                b <= a
            } else {
                b >= a
            }
        }
        (Bound::Text(a), Bound::Text(b)) => {
            if is_min {
                b <= a
            } else {
                b >= a
            }
        }
        (Bound::Number(_), Bound::Text(_)) | (Bound::Text(_), Bound::Number(_)) => false,
    };
    if widened_or_equal {
        return None;
    }
    let message = if is_min {
        "Minimum range has increased"
    } else {
        "Maximum range has decreased"
    };
    Some(Incompat::new(message, field, to_value(old), to_value(new)))
}

/// Element-count constraints may widen; adding one where none existed is
/// rejected, removing one is permitted.
fn compare_counts(
    old_min: Option<u64>,
    new_min: Option<u64>,
    old_max: Option<u64>,
    new_max: Option<u64>,
) -> Option<Incompat> {
    match (old_min, new_min) {
        (None, None) | (Some(_), None) => {}
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Element count restriction has been added",
                "min_items",
                Value::Null,
                Value::from(added),
            ));
        }
        (Some(old), Some(new)) => {
            if new > old {
                return Some(Incompat::new(
                    "Minimum element count has increased",
                    "min_items",
                    Value::from(old),
                    Value::from(new),
                ));
            }
        }
    }
    match (old_max, new_max) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Element count restriction has been added",
            "max_items",
            Value::Null,
            Value::from(added),
        )),
        (Some(old), Some(new)) => {
            if new < old {
                return Some(Incompat::new(
                    "Maximum element count has decreased",
                    "max_items",
                    Value::from(old),
                    Value::from(new),
                ));
            }
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Rule section
// ---------------------------------------------------------------------------

fn compare_rule(original: &RuleSection, updated: &RuleSection) -> Option<Incompat> {
    let old_required = original.required.clone().unwrap_or_default();
    let new_required = updated.required.clone().unwrap_or_default();

    // one / one_or_none / any admit listed choices; removing a choice can
    // orphan stored data, so the updated list must cover the original.
    for (field, old_list, new_list) in [
        ("required.one", &old_required.one, &new_required.one),
        (
            "required.one_or_none",
            &old_required.one_or_none,
            &new_required.one_or_none,
        ),
        ("required.any", &old_required.any, &new_required.any),
    ] {
        if let Some(incompat) = choices_must_cover(field, old_list.as_deref(), new_list.as_deref())
        {
            return Some(incompat);
        }
    }

    // all: every listed property is mandatory, so the updated list must not
    // require anything the original did not.
    match (&old_required.all, &new_required.all) {
        (None, None) | (Some(_), None) => {}
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Required selector has been added",
                "required.all",
                Value::Null,
                to_value(&added),
            ));
        }
        (Some(old), Some(new)) => {
            if new.iter().any(|p| !old.contains(p)) {
                return Some(Incompat::new(
                    "Mandatory properties have been added",
                    "required.all",
                    to_value(&old),
                    to_value(&new),
                ));
            }
        }
    }

    // one_or_none_set: compared by aggregate set size.
    match (
        &old_required.one_or_none_set,
        &new_required.one_or_none_set,
    ) {
        (None, None) | (Some(_), None) => {}
        (None, Some(added)) => {
            return Some(Incompat::new(
                "Required selector has been added",
                "required.one_or_none_set",
                Value::Null,
                to_value(&added),
            ));
        }
        (Some(old), Some(new)) => {
            let old_size: usize = old.iter().map(Vec::len).sum();
            let new_size: usize = new.iter().map(Vec::len).sum();
            if new_size > old_size {
                return Some(Incompat::new(
                    "Choice-set constraints have grown",
                    "required.one_or_none_set",
                    to_value(&old),
                    to_value(&new),
                ));
            }
        }
    }

    // banned may only shrink.
    match (&original.banned, &updated.banned) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Banned properties have been added",
            "banned",
            Value::Null,
            to_value(&added),
        )),
        (Some(old), Some(new)) => {
            if new.iter().any(|p| !old.contains(p)) {
                return Some(Incompat::new(
                    "Banned properties have been added",
                    "banned",
                    to_value(&old),
                    to_value(&new),
                ));
            }
            None
        }
    }
}

/// A choice-list selector may gain alternatives but never lose one, and may
/// not appear where none existed.
fn choices_must_cover(
    field: &str,
    old: Option<&[String]>,
    new: Option<&[String]>,
) -> Option<Incompat> {
    match (old, new) {
        (None, None) | (Some(_), None) => None,
        (None, Some(added)) => Some(Incompat::new(
            "Required selector has been added",
            field,
            Value::Null,
            to_value(&added),
        )),
        (Some(old), Some(new)) => {
            if old.iter().all(|p| new.contains(p)) {
                return None;
            }
            Some(Incompat::new(
                "Required choices have been removed",
                field,
                to_value(&old),
                to_value(&new),
            ))
        }
    }
}

/// Serializes a section fragment for diff output; sections are plain data
/// and cannot fail to serialize.
fn to_value<T: Serialize>(fragment: &T) -> Value {
    serde_json::to_value(fragment).unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
