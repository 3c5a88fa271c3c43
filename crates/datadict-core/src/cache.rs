//! Term cache and reference-syntax predicates.
//!
//! [`TermCache`] fronts a [`TermRepository`] with a run- or process-scoped
//! memo of minimal term projections (key, data section, rule section, enum
//! path — never more). Entries are effectively write-once for the lifetime
//! of a store snapshot: concurrent lookups of the same key observe a single
//! final state. Negative results are memoized only when the caller asks.
//!
//! The pure predicates ([`check_key`], [`check_handle_syntax`],
//! [`check_collection_name`]) validate reference syntax without touching the
//! store.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;

use crate::repository::{StoreError, TermRepository};
use crate::term::{CodeField, DataSection, RuleSection, Term};

// ---------------------------------------------------------------------------
// Dictionary constants
// ---------------------------------------------------------------------------

/// The reserved key denoting the default namespace. Never admissible as an
/// ordinary term reference inside validated data.
pub const DEFAULT_NAMESPACE_KEY: &str = ":";

/// Key of the descriptor describing namespace references. The empty string
/// is admissible as a value of this descriptor alone, and only when the
/// validator permits default-namespace references.
pub const NAMESPACE_DESCRIPTOR: &str = "namespace";

/// Returns the reserved default-namespace key.
pub fn default_namespace_key() -> &'static str {
    DEFAULT_NAMESPACE_KEY
}

// ---------------------------------------------------------------------------
// Regex statics
//
// All patterns are compile-time string literals; Regex::new never returns Err
// for them. The fallback chain exists because the workspace bans expect() and
// unwrap(); "a^" never matches and is always a valid pattern.
// ---------------------------------------------------------------------------

/// Matches a document key.
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9\-._@+,=;$!*'%()]{1,254}$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Matches a collection name.
static COLLECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]{1,128}$").unwrap_or_else(|_| {
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Returns `true` if `key` is a well-formed document key.
pub fn check_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// Returns `true` if `name` is a well-formed collection name.
pub fn check_collection_name(name: &str) -> bool {
    COLLECTION_RE.is_match(name)
}

/// Returns `true` if `handle` has well-formed `collection/key` syntax:
/// exactly one `/`, with both halves individually well-formed.
pub fn check_handle_syntax(handle: &str) -> bool {
    match split_handle(handle) {
        Some((collection, key)) => check_collection_name(collection) && check_key(key),
        None => false,
    }
}

/// Splits `handle` at its single `/`, or returns `None` when the separator
/// count is not exactly one.
pub fn split_handle(handle: &str) -> Option<(&str, &str)> {
    let mut parts = handle.splitn(3, '/');
    let collection = parts.next()?;
    let key = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((collection, key))
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// The minimal projection of a term the validator is allowed to rely on.
///
/// Growing this set is an explicit design decision; the code section in
/// particular stays behind [`TermRepository::query_enum_by_code`].
#[derive(Debug, Clone, PartialEq)]
pub struct TermProjection {
    /// Document key.
    pub key: String,
    /// Data section, if the term is a descriptor.
    pub data: Option<DataSection>,
    /// Rule section, if the term is a structure definition.
    pub rule: Option<RuleSection>,
    /// Enum path, if the term is an enum element.
    pub path: Option<Vec<String>>,
}

impl From<Term> for TermProjection {
    fn from(term: Term) -> Self {
        Self {
            key: term.key,
            data: term.data,
            rule: term.rule,
            path: term.path,
        }
    }
}

impl TermProjection {
    /// Returns `true` if this projection carries a data section.
    pub fn is_descriptor(&self) -> bool {
        self.data.is_some()
    }

    /// Returns `true` if this projection carries an enum path.
    pub fn is_enum_element(&self) -> bool {
        self.path.is_some()
    }

    /// Returns `true` if this projection carries a rule section.
    pub fn is_structure(&self) -> bool {
        self.rule.is_some()
    }
}

// ---------------------------------------------------------------------------
// TermCache
// ---------------------------------------------------------------------------

/// A memoizing front over a [`TermRepository`].
///
/// Shared across validation runs; interior locking gives concurrent runs a
/// consistent read of each entry. `None` entries record memoized misses.
pub struct TermCache<'a> {
    repo: &'a dyn TermRepository,
    terms: RwLock<HashMap<String, Option<Arc<TermProjection>>>>,
    handles: RwLock<HashMap<(String, String), bool>>,
}

impl<'a> TermCache<'a> {
    /// Creates an empty cache over `repo`.
    pub fn new(repo: &'a dyn TermRepository) -> Self {
        Self {
            repo,
            terms: RwLock::new(HashMap::new()),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves `key` to its minimal projection.
    ///
    /// With `cache` set, a positive result is memoized; with `cache_misses`
    /// also set, a miss is memoized as well. With `cache` unset the
    /// repository is consulted directly and nothing is inserted.
    pub fn lookup(
        &self,
        key: &str,
        cache: bool,
        cache_misses: bool,
    ) -> Result<Option<Arc<TermProjection>>, StoreError> {
        if cache {
            if let Some(hit) = read_guard(&self.terms).get(key) {
                return Ok(hit.clone());
            }
        }
        let fetched = self.repo.get(key)?.map(|t| Arc::new(TermProjection::from(t)));
        if cache && (fetched.is_some() || cache_misses) {
            write_guard(&self.terms).insert(key.to_owned(), fetched.clone());
        }
        Ok(fetched)
    }

    /// Resolves `key` like [`lookup`][TermCache::lookup], but treats a term
    /// without a data section as not found.
    pub fn lookup_descriptor(
        &self,
        key: &str,
        cache: bool,
        cache_misses: bool,
    ) -> Result<Option<Arc<TermProjection>>, StoreError> {
        Ok(self
            .lookup(key, cache, cache_misses)?
            .filter(|t| t.is_descriptor()))
    }

    /// Returns `true` if the document referenced by an already
    /// syntax-checked `collection`/`key` pair exists in the store.
    pub fn exists(
        &self,
        collection: &str,
        key: &str,
        cache: bool,
        cache_misses: bool,
    ) -> Result<bool, StoreError> {
        let map_key = (collection.to_owned(), key.to_owned());
        if cache {
            if let Some(hit) = read_guard(&self.handles).get(&map_key) {
                return Ok(*hit);
            }
        }
        let found = self.repo.exists(collection, key)?;
        if cache && (found || cache_misses) {
            write_guard(&self.handles).insert(map_key, found);
        }
        Ok(found)
    }

    /// Returns `true` if the named collection exists in the store.
    pub fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.repo.collection_exists(name)
    }

    /// Keys of enum elements whose code-section `field` equals `value` and
    /// whose path contains `enum_type`. Uncached: resolution queries are
    /// rare and value-dependent.
    pub fn find_enum_by_code(
        &self,
        field: CodeField,
        value: &str,
        enum_type: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.repo.query_enum_by_code(field, value, enum_type)
    }

    /// Number of memoized term entries, hits and misses combined.
    pub fn len(&self) -> usize {
        read_guard(&self.terms).len()
    }

    /// Returns `true` if no term entry has been memoized.
    pub fn is_empty(&self) -> bool {
        read_guard(&self.terms).is_empty()
    }
}

/// Acquires a read guard, recovering the inner map if a writer panicked.
fn read_guard<K, V>(lock: &RwLock<HashMap<K, V>>) -> RwLockReadGuard<'_, HashMap<K, V>> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Acquires a write guard, recovering the inner map if a writer panicked.
fn write_guard<K, V>(lock: &RwLock<HashMap<K, V>>) -> RwLockWriteGuard<'_, HashMap<K, V>> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
