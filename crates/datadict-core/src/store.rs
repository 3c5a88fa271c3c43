//! An in-memory term repository.
//!
//! Backs the CLI (`--dictionary terms.json`) and every test in this crate.
//! Terms live in a key-indexed map; collections and non-term documents can be
//! registered explicitly so handle validation has something to resolve
//! against without a real document store.

use std::collections::{BTreeMap, BTreeSet};

use crate::repository::{StoreError, TermRepository};
use crate::term::{CodeField, Term};

/// The collection name under which terms themselves are addressable via
/// handles.
pub const TERMS_COLLECTION: &str = "terms";

/// A [`TermRepository`] backed by in-memory maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryTermStore {
    terms: BTreeMap<String, Term>,
    collections: BTreeSet<String>,
    documents: BTreeSet<(String, String)>,
}

impl MemoryTermStore {
    /// Creates an empty store containing only the terms collection.
    pub fn new() -> Self {
        let mut store = Self::default();
        store.collections.insert(TERMS_COLLECTION.to_owned());
        store
    }

    /// Creates a store from a list of term records.
    pub fn with_terms(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut store = Self::new();
        for term in terms {
            store.insert(term);
        }
        store
    }

    /// Parses a JSON array of term records into a store.
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        let terms: Vec<Term> = serde_json::from_str(content)
            .map_err(|e| StoreError::new(format!("invalid term list: {e}")))?;
        Ok(Self::with_terms(terms))
    }

    /// Inserts or replaces a term record, keyed by `term.key`.
    pub fn insert(&mut self, term: Term) {
        self.terms.insert(term.key.clone(), term);
    }

    /// Registers a collection name.
    pub fn add_collection(&mut self, name: impl Into<String>) {
        self.collections.insert(name.into());
    }

    /// Registers a non-term document under `collection`/`key`. The
    /// collection is registered as a side effect.
    pub fn add_document(&mut self, collection: impl Into<String>, key: impl Into<String>) {
        let collection = collection.into();
        self.collections.insert(collection.clone());
        self.documents.insert((collection, key.into()));
    }

    /// Number of term records held.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the store holds no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl TermRepository for MemoryTermStore {
    fn get(&self, key: &str) -> Result<Option<Term>, StoreError> {
        Ok(self.terms.get(key).cloned())
    }

    fn exists(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        if collection == TERMS_COLLECTION {
            return Ok(self.terms.contains_key(key));
        }
        Ok(self
            .documents
            .contains(&(collection.to_owned(), key.to_owned())))
    }

    fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.collections.contains(name))
    }

    fn query_enum_by_code(
        &self,
        field: CodeField,
        value: &str,
        enum_type: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for term in self.terms.values() {
            let code_matches = term
                .code
                .as_ref()
                .and_then(|c| c.field(field))
                .is_some_and(|v| v == value);
            let in_enum_type = term
                .path
                .as_ref()
                .is_some_and(|p| p.iter().any(|k| k == enum_type));
            if code_matches && in_enum_type {
                keys.push(term.key.clone());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::term::CodeSection;

    fn enum_term(key: &str, local_id: &str, path: &[&str]) -> Term {
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

    #[test]
    fn get_returns_inserted_term() {
        let store = MemoryTermStore::with_terms([enum_term("male", "male", &["sexEnum"])]);
        let term = store.get("male").expect("store").expect("term");
        assert_eq!(term.key, "male");
        assert!(store.get("missing").expect("store").is_none());
    }

    #[test]
    fn terms_are_addressable_as_documents() {
        let store = MemoryTermStore::with_terms([enum_term("male", "male", &["sexEnum"])]);
        assert!(store.exists(TERMS_COLLECTION, "male").expect("store"));
        assert!(!store.exists(TERMS_COLLECTION, "nope").expect("store"));
    }

    #[test]
    fn registered_documents_resolve() {
        let mut store = MemoryTermStore::new();
        store.add_document("patients", "p-001");
        assert!(store.collection_exists("patients").expect("store"));
        assert!(store.exists("patients", "p-001").expect("store"));
        assert!(!store.exists("patients", "p-002").expect("store"));
        assert!(!store.collection_exists("visits").expect("store"));
    }

    #[test]
    fn enum_query_filters_by_code_and_path() {
        let store = MemoryTermStore::with_terms([
            enum_term("male", "m", &["sexEnum", "bioEnum"]),
            enum_term("meter", "m", &["unitEnum"]),
        ]);
        let hits = store
            .query_enum_by_code(CodeField::LocalId, "m", "sexEnum")
            .expect("store");
        assert_eq!(hits, vec!["male".to_owned()]);
        let none = store
            .query_enum_by_code(CodeField::LocalId, "m", "colorEnum")
            .expect("store");
        assert!(none.is_empty());
    }

    #[test]
    fn from_json_parses_term_list() {
        let json = r#"[{"key":"age","data":{"scalar":{"type":"integer"}}}]"#;
        let store = MemoryTermStore::from_json(json).expect("parse");
        assert_eq!(store.len(), 1);
        let age = store.get("age").expect("store").expect("term");
        assert!(age.is_descriptor());
    }

    #[test]
    fn from_json_rejects_non_array() {
        assert!(MemoryTermStore::from_json("{}").is_err());
    }
}
