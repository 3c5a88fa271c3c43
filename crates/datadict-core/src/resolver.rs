//! In-place value coercion.
//!
//! Two coercions exist: an enum code that fails to resolve as a term key is
//! probed against the code sections of the declared enum types, and a date
//! string on a timestamp leaf becomes unix milliseconds. Both replace the
//! value in place and log the replacement on the report; the log is keyed by
//! a hash of (descriptor, resolved value), so repeats collapse to one entry.

use serde_json::Value;

use crate::cache::TermCache;
use crate::repository::StoreError;
use crate::status::{ChangeEntry, ValueReport};
use crate::term::CodeField;

/// Resolves a raw enum code to a term key.
///
/// Queries each declared enum type in order and returns the key of the first
/// type whose query yields exactly one hit. The order of `enum_types` is
/// normative: when two types each yield a single different term, the earlier
/// type wins. Returns `None` when no type yields exactly one hit.
pub(crate) fn resolve_enum_code(
    cache: &TermCache<'_>,
    field: CodeField,
    enum_types: &[String],
    raw: &str,
) -> Result<Option<String>, StoreError> {
    for enum_type in enum_types {
        let hits = cache.find_enum_by_code(field, raw, enum_type)?;
        if hits.len() == 1 {
            return Ok(hits.into_iter().next());
        }
    }
    Ok(None)
}

/// Replaces `value` with `resolved` and logs the change on `report`.
pub(crate) fn apply_coercion(
    language: &str,
    descriptor: &str,
    value: &mut Value,
    resolved: Value,
    report: &mut ValueReport,
) {
    tracing::debug!(descriptor, %resolved, "coercing value in place");
    let original = std::mem::replace(value, resolved.clone());
    report.record_change(
        language,
        descriptor,
        ChangeEntry {
            field: descriptor.to_owned(),
            original,
            resolved,
        },
    );
}
