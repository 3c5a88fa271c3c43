//! Scalar predicates and the range / regex / date helpers.
//!
//! Everything here is pure: predicates over `serde_json::Value`, lexical
//! date-pattern matching, range evaluation against a [`RangeSpec`], and the
//! date-string parsing used by timestamp coercion. The walker owns all
//! reporting; these helpers only answer yes/no/where.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::term::{Bound, RangeSpec};

// ---------------------------------------------------------------------------
// Scalar predicates
// ---------------------------------------------------------------------------

/// Returns `true` for a whole number. Floats with a zero fractional part
/// count: the wire format does not distinguish `3` from `3.0`.
pub fn is_integer(value: &Value) -> bool {
    if value.is_i64() || value.is_u64() {
        return true;
    }
    value
        .as_f64()
        .is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Returns `true` for any finite number.
pub fn is_number(value: &Value) -> bool {
    value.as_f64().is_some_and(f64::is_finite)
}

/// Numeric view of a value, for range evaluation.
pub fn as_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Matches the admissible lexical date forms: `YYYY`, `YYYYMM`, `YYYYMMDD`,
/// `YYYY-YYYY`. Semantic calendar validity (months, leap years) is out of
/// scope.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}|\d{6}|\d{8}|\d{4}-\d{4})$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Returns `true` if `value` matches one of the lexical date forms.
pub fn check_date_format(value: &str) -> bool {
    DATE_RE.is_match(value)
}

/// Parses a date string into unix milliseconds.
///
/// Accepts RFC 3339 (`2023-01-15T10:30:00Z`), a bare datetime without zone
/// (`2023-01-15T10:30:00`, read as UTC), and a bare calendar date
/// (`2023-01-15`, read as UTC midnight). Returns `None` for anything else.
pub fn parse_timestamp_millis(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = d.and_hms_opt(0, 0, 0)?;
        return Some(midnight.and_utc().timestamp_millis());
    }
    None
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// Where a value fell relative to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    /// All declared bounds were satisfied.
    Within,
    /// A minimum bound was violated.
    BelowMinimum,
    /// A maximum bound was violated.
    AboveMaximum,
}

/// Evaluates a numeric value against the declared bounds. Non-numeric
/// bounds on a numeric leaf are ignored rather than coerced.
pub fn check_number_range(value: f64, range: &RangeSpec) -> RangeCheck {
    if let Some(min) = range.min_incl.as_ref().and_then(Bound::as_number) {
        if value < min {
            return RangeCheck::BelowMinimum;
        }
    }
    if let Some(min) = range.min_excl.as_ref().and_then(Bound::as_number) {
        if value <= min {
            return RangeCheck::BelowMinimum;
        }
    }
    if let Some(max) = range.max_incl.as_ref().and_then(Bound::as_number) {
        if value > max {
            return RangeCheck::AboveMaximum;
        }
    }
    if let Some(max) = range.max_excl.as_ref().and_then(Bound::as_number) {
        if value >= max {
            return RangeCheck::AboveMaximum;
        }
    }
    RangeCheck::Within
}

/// Evaluates a string (or lexical date) against the declared bounds using
/// lexicographic order, which agrees with chronological order for the
/// fixed-width date forms.
pub fn check_text_range(value: &str, range: &RangeSpec) -> RangeCheck {
    if let Some(min) = range.min_incl.as_ref().and_then(Bound::as_text) {
        if value < min {
            return RangeCheck::BelowMinimum;
        }
    }
    if let Some(min) = range.min_excl.as_ref().and_then(Bound::as_text) {
        if value <= min {
            return RangeCheck::BelowMinimum;
        }
    }
    if let Some(max) = range.max_incl.as_ref().and_then(Bound::as_text) {
        if value > max {
            return RangeCheck::AboveMaximum;
        }
    }
    if let Some(max) = range.max_excl.as_ref().and_then(Bound::as_text) {
        if value >= max {
            return RangeCheck::AboveMaximum;
        }
    }
    RangeCheck::Within
}

// ---------------------------------------------------------------------------
// Regex
// ---------------------------------------------------------------------------

/// Matches `text` against a descriptor-declared pattern, anchoring it on
/// both sides when the author left it unanchored.
///
/// # Errors
///
/// Returns the compilation error for a malformed pattern; the walker raises
/// that as dictionary corruption.
pub fn match_pattern(pattern: &str, text: &str) -> Result<bool, regex::Error> {
    let anchored = if pattern.starts_with('^') && pattern.ends_with('$') {
        pattern.to_owned()
    } else {
        format!("^(?:{pattern})$")
    };
    Ok(Regex::new(&anchored)?.is_match(text))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
