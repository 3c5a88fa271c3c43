//! The consumed contract of the term repository.
//!
//! The validation engine performs no I/O of its own. Everything it needs from
//! the document store arrives through [`TermRepository`], an object-safe
//! trait the caller implements: the service wires in its database client,
//! tests and the CLI use [`crate::store::MemoryTermStore`].
//!
//! Lookups are synchronous and idempotent. A store failure is not a property
//! of the input data, so it propagates as [`StoreError`] through every layer
//! rather than being folded into a validation report.

use std::fmt;

use crate::term::{CodeField, Term};

/// A failure reaching or querying the term repository.
///
/// Unrecoverable from the validator's position; the engine does not retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// Human-readable description of the failure.
    pub detail: String,
}

impl StoreError {
    /// Constructs a [`StoreError`] from a message string.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term store error: {}", self.detail)
    }
}

impl std::error::Error for StoreError {}

/// Read access to the term repository.
///
/// Implementations may query a database, a local snapshot, or fixed data.
/// The trait is object-safe; the engine holds it as `&dyn TermRepository`.
pub trait TermRepository {
    /// Fetch the full term record under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Term>, StoreError>;

    /// Returns `true` if document `key` exists in `collection`.
    fn exists(&self, collection: &str, key: &str) -> Result<bool, StoreError>;

    /// Returns `true` if the named collection exists in the store.
    fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Keys of terms whose code-section `field` equals `value` and whose
    /// enum path contains `enum_type`. Zero, one, or many keys may match.
    fn query_enum_by_code(
        &self,
        field: CodeField,
        value: &str,
        enum_type: &str,
    ) -> Result<Vec<String>, StoreError>;
}
