#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cache;
pub mod compat;
pub mod primitives;
pub mod repository;
pub mod resolver;
pub mod rules;
pub mod status;
pub mod store;
pub mod term;
pub mod walker;

#[cfg(test)]
pub mod test_helpers;

pub use cache::{
    DEFAULT_NAMESPACE_KEY, NAMESPACE_DESCRIPTOR, TermCache, TermProjection, check_collection_name,
    check_handle_syntax, check_key, default_namespace_key, split_handle,
};
pub use compat::{FieldChange, Incompat, compare};
pub use repository::{StoreError, TermRepository};
pub use status::{BatchReport, ChangeEntry, Status, StatusCode, ValueReport, change_key};
pub use store::{MemoryTermStore, TERMS_COLLECTION};
pub use term::{
    ANY_DESCRIPTOR, ANY_ENUM, ANY_STRUCTURE, ANY_TERM, ArraySpec, Bound, CodeField, CodeSection,
    DataSection, DictSpec, Dimension, KeyLeafType, KeySpec, LeafType, RangeSpec,
    RequiredSelectors, RuleSection, ScalarSpec, SetSpec, Term,
};
pub use walker::{ValidateError, Validator, ValidatorOptions};

/// Returns the current version of the datadict-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
