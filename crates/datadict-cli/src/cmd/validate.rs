//! Implementation of `datadict validate`.
//!
//! Loads the dictionary into a [`MemoryTermStore`], builds a [`Validator`]
//! from the flags, validates the input value, and prints the batch report as
//! JSON to stdout.
//!
//! Exit codes:
//! - 0 = accepted (idle or accepted with coercions)
//! - 1 = validation errors
//! - 2 = unreadable/unparseable input, or the engine raised
use datadict_core::{MemoryTermStore, Validator, ValidatorOptions};
use serde_json::Value;

use crate::error::CliError;

/// Runs the `validate` command over already-read file contents.
///
/// `dictionary` is the JSON term list; `input` is the value to validate.
/// The printed report always includes the per-index statuses and the
/// valid/warnings/errors counters.
///
/// # Errors
///
/// - [`CliError::ParseFailed`] — dictionary or input is not the expected
///   JSON shape.
/// - [`CliError::EngineFailure`] — the validator raised (entry misuse or a
///   corrupt dictionary).
/// - [`CliError::ValidationErrors`] — the report contains errors.
pub fn run(
    dictionary: &str,
    input: &str,
    descriptor: Option<&str>,
    options: ValidatorOptions,
) -> Result<(), CliError> {
    let store = MemoryTermStore::from_json(dictionary).map_err(|e| CliError::ParseFailed {
        source: "dictionary".to_owned(),
        detail: e.detail,
    })?;

    let mut value: Value = serde_json::from_str(input).map_err(|e| CliError::ParseFailed {
        source: "input".to_owned(),
        detail: format!("line {}, column {}: {e}", e.line(), e.column()),
    })?;

    let validator = Validator::with_options(&store, options);
    let batch = validator
        .validate(&mut value, descriptor)
        .map_err(|e| CliError::EngineFailure {
            detail: e.to_string(),
        })?;

    let rendered = serde_json::json!({
        "resolution": batch.resolution(),
        "valid": batch.valid,
        "warnings": batch.warnings,
        "errors": batch.errors,
        "reports": batch.reports,
        "value": value,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&rendered).unwrap_or_default()
    );

    if batch.resolution() < 0 {
        return Err(CliError::ValidationErrors);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
