//! Implementation of `datadict compare`.
//!
//! Parses two term records and runs the update-compatibility checker. The
//! verdict is printed to stdout as JSON: `{"ok": true, "updated": ...}` for
//! a compatible update (carrying the repaired record), or the
//! incompatibility's message and minimal diff.
//!
//! Exit codes:
//! - 0 = compatible
//! - 1 = incompatible update
//! - 2 = unreadable/unparseable input
use datadict_core::{Term, compare};

use crate::error::CliError;

/// Runs the `compare` command over already-read file contents.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] — either record is not a valid term.
/// - [`CliError::IncompatibleUpdate`] — the checker rejected the update.
pub fn run(original: &str, updated: &str) -> Result<(), CliError> {
    let original: Term = parse_term(original, "original")?;
    let mut updated: Term = parse_term(updated, "updated")?;

    match compare(&original, &mut updated) {
        None => {
            let rendered = serde_json::json!({"ok": true, "updated": updated});
            println!(
                "{}",
                serde_json::to_string_pretty(&rendered).unwrap_or_default()
            );
            Ok(())
        }
        Some(incompat) => {
            let rendered = serde_json::json!({
                "ok": false,
                "message": incompat.message,
                "diff": incompat.diff,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&rendered).unwrap_or_default()
            );
            Err(CliError::IncompatibleUpdate)
        }
    }
}

fn parse_term(content: &str, source: &str) -> Result<Term, CliError> {
    serde_json::from_str(content).map_err(|e| CliError::ParseFailed {
        source: source.to_owned(),
        detail: format!("line {}, column {}: {e}", e.line(), e.column()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    const ORIGINAL: &str = r#"{
        "key": "age",
        "data": {"scalar": {"type": "integer", "range": {"min_incl": 0, "max_incl": 10}}}
    }"#;

    #[test]
    fn widened_update_is_compatible() {
        let updated = r#"{
            "key": "age",
            "data": {"scalar": {"type": "integer", "range": {"min_incl": 0, "max_incl": 20}}}
        }"#;
        assert!(run(ORIGINAL, updated).is_ok());
    }

    #[test]
    fn tightened_update_maps_to_incompatible() {
        let updated = r#"{
            "key": "age",
            "data": {"scalar": {"type": "integer", "range": {"min_incl": 0, "max_incl": 5}}}
        }"#;
        let err = run(ORIGINAL, updated).expect_err("must fail");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn malformed_record_maps_to_parse_failed() {
        let err = run("{]", ORIGINAL).expect_err("must fail");
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("original"), "{err}");
    }
}
