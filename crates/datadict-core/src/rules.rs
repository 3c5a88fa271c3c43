//! Structural rule evaluation for object values.
//!
//! A structure definition's rule section lists property-presence selectors.
//! An object conforms to the structure iff every selector it declares
//! passes. Candidate admission (an object against the list of structures
//! named in a descriptor's `kind`) is first-match OR and lives in the
//! walker; nothing here produces reports.

use serde_json::{Map, Value};

use crate::term::{RequiredSelectors, RuleSection};

/// Returns `true` if `object` satisfies every selector `rule` declares.
pub fn conforms(rule: &RuleSection, object: &Map<String, Value>) -> bool {
    if let Some(required) = &rule.required {
        if !required_selectors_pass(required, object) {
            return false;
        }
    }
    if let Some(banned) = &rule.banned {
        if banned.iter().any(|p| object.contains_key(p)) {
            return false;
        }
    }
    true
}

fn required_selectors_pass(required: &RequiredSelectors, object: &Map<String, Value>) -> bool {
    if let Some(list) = &required.one {
        if present_count(list, object) != 1 {
            return false;
        }
    }
    if let Some(list) = &required.one_or_none {
        if present_count(list, object) > 1 {
            return false;
        }
    }
    if let Some(list) = &required.any {
        if present_count(list, object) == 0 {
            return false;
        }
    }
    if let Some(sets) = &required.one_or_none_set {
        if sets.iter().any(|set| present_count(set, object) > 1) {
            return false;
        }
    }
    if let Some(list) = &required.all {
        if list.iter().any(|p| !object.contains_key(p)) {
            return false;
        }
    }
    true
}

/// Number of `properties` present on `object`.
fn present_count(properties: &[String], object: &Map<String, Value>) -> usize {
    properties.iter().filter(|p| object.contains_key(*p)).count()
}
