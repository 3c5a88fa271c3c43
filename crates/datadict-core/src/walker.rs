//! The recursive validation walker.
//!
//! [`Validator::validate`] is the single entry point. It classifies the
//! input into one of four modes — zipped array with a shared descriptor,
//! array of unqualified objects, single unqualified object, or a descriptor
//! with a value of any shape — sizes the batch report accordingly, and
//! descends each value through the descriptor's data section.
//!
//! Two failure channels never mix: everything about the *input data* is
//! recorded on the report and returned, while a malformed dictionary (an
//! ambiguous data section, an unknown kind qualifier, a structure candidate
//! without rules, a bad descriptor regex) raises [`ValidateError`]. The
//! dictionary must be repaired before validation can mean anything.
//!
//! The recursion returns `bool`: a failure records exactly one status for
//! the innermost offending position and propagates `false` upward without
//! further writes.

use std::fmt;

use serde_json::{Map, Value};

use crate::cache::{DEFAULT_NAMESPACE_KEY, NAMESPACE_DESCRIPTOR, TermCache};
use crate::cache::{check_collection_name, check_key, split_handle};
use crate::primitives::{self, RangeCheck};
use crate::repository::{StoreError, TermRepository};
use crate::resolver;
use crate::rules;
use crate::status::{BatchReport, StatusCode, ValueReport};
use crate::term::{
    ANY_DESCRIPTOR, ANY_ENUM, ANY_STRUCTURE, ANY_TERM, CodeField, DataSection, DictSpec,
    Dimension, LeafType, RangeSpec, ScalarSpec,
};

// ---------------------------------------------------------------------------
// ValidateError
// ---------------------------------------------------------------------------

/// A raised failure: a misuse of the entry point or a corrupt dictionary.
///
/// Unlike a validation outcome, none of these describe the input data. The
/// caller either fixed the call or must repair the dictionary.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidateError {
    /// Zipped mode was requested but the input is not an array.
    ZipExpectsArray,
    /// Descriptor-less array mode found a non-object element.
    MultiExpectsObjects {
        /// Index of the offending element.
        index: usize,
    },
    /// No descriptor was given and the input is neither object nor array.
    MissingDescriptor,
    /// The entry descriptor key resolves to no term.
    UnknownDescriptor {
        /// The unresolved key.
        key: String,
    },
    /// The entry term exists but carries no data section.
    NotADescriptor {
        /// The offending key.
        key: String,
    },
    /// A data section with more than one dimensionality selector.
    AmbiguousDataSection {
        /// Descriptor owning the section.
        descriptor: String,
    },
    /// A descriptor-declared regex that does not compile.
    BadPattern {
        /// Descriptor owning the pattern.
        descriptor: String,
        /// The malformed pattern.
        pattern: String,
        /// Compiler detail.
        detail: String,
    },
    /// A kind qualifier outside the documented vocabulary.
    UnknownKindQualifier {
        /// Descriptor owning the kind array.
        descriptor: String,
        /// The unrecognized qualifier.
        qualifier: String,
    },
    /// An object descriptor whose kind names a term that does not exist.
    UnknownStructure {
        /// Descriptor owning the kind array.
        descriptor: String,
        /// The unresolved structure key.
        structure: String,
    },
    /// A declared structure candidate without a rule section.
    MissingRuleSection {
        /// Descriptor owning the kind array.
        descriptor: String,
        /// The structure term lacking rules.
        structure: String,
    },
    /// The term store failed.
    Store(StoreError),
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZipExpectsArray => f.write_str("zipped validation expects an array of values"),
            Self::MultiExpectsObjects { index } => {
                write!(f, "element {index} is not an object")
            }
            Self::MissingDescriptor => {
                f.write_str("input without a descriptor must be an object or an array of objects")
            }
            Self::UnknownDescriptor { key } => write!(f, "descriptor \"{key}\" not found"),
            Self::NotADescriptor { key } => {
                write!(f, "term \"{key}\" carries no data section")
            }
            Self::AmbiguousDataSection { descriptor } => {
                write!(
                    f,
                    "descriptor \"{descriptor}\" declares more than one data dimension"
                )
            }
            Self::BadPattern {
                descriptor,
                pattern,
                detail,
            } => write!(
                f,
                "descriptor \"{descriptor}\" declares a malformed pattern {pattern:?}: {detail}"
            ),
            Self::UnknownKindQualifier {
                descriptor,
                qualifier,
            } => write!(
                f,
                "descriptor \"{descriptor}\" declares unknown kind qualifier \"{qualifier}\""
            ),
            Self::UnknownStructure {
                descriptor,
                structure,
            } => write!(
                f,
                "descriptor \"{descriptor}\" names unknown structure \"{structure}\""
            ),
            Self::MissingRuleSection {
                descriptor,
                structure,
            } => write!(
                f,
                "structure \"{structure}\" named by \"{descriptor}\" has no rule section"
            ),
            Self::Store(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for ValidateError {}

impl From<StoreError> for ValidateError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// ValidatorOptions
// ---------------------------------------------------------------------------

/// Per-instance validation options.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorOptions {
    /// Treat the input as an array of values sharing one descriptor.
    pub zip: bool,
    /// Memoize term lookups across the validator's lifetime.
    pub cache: bool,
    /// Also memoize lookups that found nothing.
    pub cache_missing: bool,
    /// Unmatched object properties are errors instead of being ignored.
    pub expect_terms: bool,
    /// Leaves without a declared type (or dimension) are errors.
    pub expect_type: bool,
    /// Enable enum-code resolution.
    pub resolve: bool,
    /// Permit the empty string as a reference to the default namespace, on
    /// the namespace descriptor only.
    pub allow_default_namespace: bool,
    /// Code-section field probed during enum resolution.
    pub resolve_field: CodeField,
    /// Language tag for report messages.
    pub language: String,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            zip: false,
            cache: true,
            cache_missing: false,
            expect_terms: false,
            expect_type: false,
            resolve: false,
            allow_default_namespace: false,
            resolve_field: CodeField::default(),
            language: "en".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// The validation engine: a term cache plus the options of one instance.
///
/// Single-threaded and re-entrant: a validation run owns its input value
/// tree (mutated in place when coercions apply) and its report. The cache
/// is the only state shared between runs.
pub struct Validator<'a> {
    cache: TermCache<'a>,
    options: ValidatorOptions,
}

impl<'a> Validator<'a> {
    /// Creates a validator with default options.
    pub fn new(repo: &'a dyn TermRepository) -> Self {
        Self::with_options(repo, ValidatorOptions::default())
    }

    /// Creates a validator with explicit options.
    pub fn with_options(repo: &'a dyn TermRepository, options: ValidatorOptions) -> Self {
        Self {
            cache: TermCache::new(repo),
            options,
        }
    }

    /// The options of this instance.
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// The shared term cache of this instance.
    pub fn cache(&self) -> &TermCache<'a> {
        &self.cache
    }

    /// Validates `value`, classified by the presence of `descriptor` and the
    /// `zip` option:
    ///
    /// - descriptor + `zip` — array of values sharing the descriptor, one
    ///   report per element;
    /// - descriptor alone — one value of any shape, a one-element batch;
    /// - no descriptor, object input — each property is validated against
    ///   the descriptor its name resolves to;
    /// - no descriptor, array input — an array of such objects.
    ///
    /// Coercions mutate `value` in place. Use [`BatchReport::resolution`]
    /// for the −1/0/1 run outcome.
    ///
    /// # Errors
    ///
    /// Raises [`ValidateError`] for entry misuse, dictionary corruption, or
    /// a failing term store; never for a problem with the input data.
    pub fn validate(
        &self,
        value: &mut Value,
        descriptor: Option<&str>,
    ) -> Result<BatchReport, ValidateError> {
        tracing::debug!(descriptor, zip = self.options.zip, "validation run");
        match descriptor {
            Some(key) => self.validate_with_descriptor(value, key),
            None => self.validate_unqualified(value),
        }
    }

    fn validate_with_descriptor(
        &self,
        value: &mut Value,
        key: &str,
    ) -> Result<BatchReport, ValidateError> {
        let opts = &self.options;
        let term = self
            .cache
            .lookup(key, opts.cache, opts.cache_missing)?
            .ok_or_else(|| ValidateError::UnknownDescriptor { key: key.to_owned() })?;
        let section = term
            .data
            .clone()
            .ok_or_else(|| ValidateError::NotADescriptor { key: key.to_owned() })?;

        if opts.zip {
            let Some(items) = value.as_array_mut() else {
                return Err(ValidateError::ZipExpectsArray);
            };
            let mut batch = BatchReport::idle(items.len(), &opts.language);
            for (index, item) in items.iter_mut().enumerate() {
                let Some(report) = batch.report_mut(index) else {
                    continue;
                };
                self.walk_data_section(key, item, &section, report)?;
            }
            batch.recount();
            return Ok(batch);
        }

        let mut batch = BatchReport::idle(1, &opts.language);
        if let Some(report) = batch.report_mut(0) {
            self.walk_data_section(key, value, &section, report)?;
        }
        batch.recount();
        Ok(batch)
    }

    fn validate_unqualified(&self, value: &mut Value) -> Result<BatchReport, ValidateError> {
        let language = self.options.language.clone();
        if value.is_object() {
            let mut batch = BatchReport::idle(1, &language);
            if let Some(report) = batch.report_mut(0) {
                self.walk_properties(value, StatusCode::UnknownDescriptor, report)?;
            }
            batch.recount();
            return Ok(batch);
        }
        if let Some(items) = value.as_array_mut() {
            for (index, item) in items.iter().enumerate() {
                if !item.is_object() {
                    return Err(ValidateError::MultiExpectsObjects { index });
                }
            }
            let mut batch = BatchReport::idle(items.len(), &language);
            for (index, item) in items.iter_mut().enumerate() {
                let Some(report) = batch.report_mut(index) else {
                    continue;
                };
                self.walk_properties(item, StatusCode::UnknownDescriptor, report)?;
            }
            batch.recount();
            return Ok(batch);
        }
        Err(ValidateError::MissingDescriptor)
    }

    // -----------------------------------------------------------------------
    // Recursion
    // -----------------------------------------------------------------------

    /// Walks one value through one data section, recording at most one
    /// status on `report`.
    fn walk_data_section(
        &self,
        descriptor: &str,
        value: &mut Value,
        section: &DataSection,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        tracing::trace!(descriptor, "descending data section");
        if section.selector_count() > 1 {
            return Err(ValidateError::AmbiguousDataSection {
                descriptor: descriptor.to_owned(),
            });
        }
        match section.selector() {
            None => {
                if self.options.expect_type {
                    self.fail(
                        report,
                        StatusCode::ExpectingDataDimension,
                        descriptor,
                        value,
                        Map::new(),
                    );
                    return Ok(false);
                }
                Ok(true)
            }
            Some(Dimension::Scalar(spec)) => self.walk_scalar(descriptor, value, spec, report),
            Some(Dimension::Array(spec)) => {
                if !self.admit_container(descriptor, value, spec.min_items, spec.max_items, report)
                {
                    return Ok(false);
                }
                let Some(items) = value.as_array_mut() else {
                    return Ok(false);
                };
                for item in items {
                    if !self.walk_data_section(descriptor, item, &spec.data, report)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Some(Dimension::Set(spec)) => {
                if !self.admit_container(descriptor, value, spec.min_items, spec.max_items, report)
                {
                    return Ok(false);
                }
                let element_spec = spec.scalar.clone().unwrap_or_default();
                let Some(items) = value.as_array_mut() else {
                    return Ok(false);
                };
                for item in items {
                    if !self.walk_scalar(descriptor, item, &element_spec, report)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Some(Dimension::Dict(spec)) => self.walk_dict(descriptor, value, spec, report),
        }
    }

    /// Checks that a container value is an array within its element-count
    /// bounds.
    fn admit_container(
        &self,
        descriptor: &str,
        value: &Value,
        min_items: Option<u64>,
        max_items: Option<u64>,
        report: &mut ValueReport,
    ) -> bool {
        let Some(items) = value.as_array() else {
            self.fail(
                report,
                StatusCode::ValueNotAnArray,
                descriptor,
                value,
                Map::new(),
            );
            return false;
        };
        let len = items.len() as u64;
        let mut context = Map::new();
        if let Some(min) = min_items {
            context.insert("min_items".to_owned(), Value::from(min));
        }
        if let Some(max) = max_items {
            context.insert("max_items".to_owned(), Value::from(max));
        }
        if min_items.is_some_and(|min| len < min) {
            self.fail(
                report,
                StatusCode::ArrayTooFewElements,
                descriptor,
                value,
                context,
            );
            return false;
        }
        if max_items.is_some_and(|max| len > max) {
            self.fail(
                report,
                StatusCode::ArrayTooManyElements,
                descriptor,
                value,
                context,
            );
            return false;
        }
        true
    }

    fn walk_dict(
        &self,
        descriptor: &str,
        value: &mut Value,
        spec: &DictSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        if !value.is_object() {
            self.fail(report, StatusCode::NotAnObject, descriptor, value, Map::new());
            return Ok(false);
        }
        let Some(key_spec) = &spec.key else {
            self.fail(
                report,
                StatusCode::MissingDictKeySection,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        };
        let Some(value_section) = &spec.value else {
            self.fail(
                report,
                StatusCode::MissingDictValueSection,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        };
        let key_scalar = key_spec.as_scalar();

        let keys: Vec<String> = value
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        let mut renames: Vec<(String, String)> = Vec::new();

        for key in keys {
            let mut key_value = Value::String(key.clone());
            if !self.walk_scalar(descriptor, &mut key_value, &key_scalar, report)? {
                return Ok(false);
            }
            if let Some(new_key) = key_value.as_str() {
                if new_key != key {
                    renames.push((key.clone(), new_key.to_owned()));
                }
            }
            let Some(child) = value.as_object_mut().and_then(|o| o.get_mut(&key)) else {
                continue;
            };
            if !self.walk_data_section(descriptor, child, value_section, report)? {
                return Ok(false);
            }
        }

        // Coerced keys rebuild the object, keeping insertion order.
        if !renames.is_empty() {
            if let Some(obj) = value.as_object_mut() {
                let mut rebuilt = Map::new();
                for (key, child) in obj.iter() {
                    let renamed = renames
                        .iter()
                        .find(|(old, _)| old == key)
                        .map_or_else(|| key.clone(), |(_, new)| new.clone());
                    rebuilt.insert(renamed, child.clone());
                }
                *obj = rebuilt;
            }
        }
        Ok(true)
    }

    fn walk_scalar(
        &self,
        descriptor: &str,
        value: &mut Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        if value.is_array() {
            self.fail(report, StatusCode::NotAScalar, descriptor, value, Map::new());
            return Ok(false);
        }
        match spec.leaf_type {
            None => {
                if self.options.expect_type {
                    self.fail(
                        report,
                        StatusCode::MissingDataType,
                        descriptor,
                        value,
                        Map::new(),
                    );
                    return Ok(false);
                }
                Ok(true)
            }
            Some(leaf) => self.validate_leaf(descriptor, leaf, value, spec, report),
        }
    }

    // -----------------------------------------------------------------------
    // Leaf handlers
    // -----------------------------------------------------------------------

    fn validate_leaf(
        &self,
        descriptor: &str,
        leaf: LeafType,
        value: &mut Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        match leaf {
            LeafType::Boolean => {
                if !value.is_boolean() {
                    self.fail(report, StatusCode::NotABoolean, descriptor, value, Map::new());
                    return Ok(false);
                }
                Ok(true)
            }
            LeafType::Integer => {
                if !primitives::is_integer(value) {
                    self.fail(report, StatusCode::NotAnInteger, descriptor, value, Map::new());
                    return Ok(false);
                }
                Ok(self.check_numeric_range(descriptor, value, spec.range.as_ref(), report))
            }
            LeafType::Number => {
                if !primitives::is_number(value) {
                    self.fail(report, StatusCode::NotANumber, descriptor, value, Map::new());
                    return Ok(false);
                }
                Ok(self.check_numeric_range(descriptor, value, spec.range.as_ref(), report))
            }
            LeafType::Timestamp => self.validate_timestamp(descriptor, value, spec, report),
            LeafType::String => self.validate_string(descriptor, value, spec, report),
            LeafType::Key => self.validate_key(descriptor, value, spec, report),
            LeafType::Handle => self.validate_handle(descriptor, value, report),
            LeafType::Enum => self.validate_enum(descriptor, value, spec, report),
            LeafType::Date => self.validate_date(descriptor, value, spec, report),
            LeafType::Struct => {
                if !value.is_object() {
                    self.fail(report, StatusCode::NotAnObject, descriptor, value, Map::new());
                    return Ok(false);
                }
                Ok(true)
            }
            LeafType::Object => self.validate_object(descriptor, value, spec, report),
            LeafType::Geojson => {
                let ok = self.validate_geojson(descriptor, value, report);
                Ok(ok)
            }
        }
    }

    fn check_numeric_range(
        &self,
        descriptor: &str,
        value: &Value,
        range: Option<&RangeSpec>,
        report: &mut ValueReport,
    ) -> bool {
        let Some(range) = range else {
            return true;
        };
        let Some(number) = primitives::as_number(value) else {
            return true;
        };
        let code = match primitives::check_number_range(number, range) {
            RangeCheck::Within => return true,
            RangeCheck::BelowMinimum => StatusCode::LowRange,
            RangeCheck::AboveMaximum => StatusCode::HighRange,
        };
        self.fail(report, code, descriptor, value, range_context(range));
        false
    }

    fn check_text_range(
        &self,
        descriptor: &str,
        text: &str,
        value: &Value,
        range: Option<&RangeSpec>,
        report: &mut ValueReport,
    ) -> bool {
        let Some(range) = range else {
            return true;
        };
        match primitives::check_text_range(text, range) {
            RangeCheck::Within => true,
            RangeCheck::BelowMinimum | RangeCheck::AboveMaximum => {
                self.fail(
                    report,
                    StatusCode::OutOfRange,
                    descriptor,
                    value,
                    range_context(range),
                );
                false
            }
        }
    }

    fn validate_timestamp(
        &self,
        descriptor: &str,
        value: &mut Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        if primitives::is_number(value) {
            return Ok(self.check_numeric_range(descriptor, value, spec.range.as_ref(), report));
        }
        let parsed = value.as_str().and_then(primitives::parse_timestamp_millis);
        let Some(millis) = parsed else {
            self.fail(report, StatusCode::NotATimestamp, descriptor, value, Map::new());
            return Ok(false);
        };
        resolver::apply_coercion(
            &self.options.language,
            descriptor,
            value,
            Value::from(millis),
            report,
        );
        Ok(self.check_numeric_range(descriptor, value, spec.range.as_ref(), report))
    }

    fn validate_string(
        &self,
        descriptor: &str,
        value: &Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let Some(text) = value.as_str() else {
            self.fail(report, StatusCode::NotAString, descriptor, value, Map::new());
            return Ok(false);
        };
        if let Some(pattern) = &spec.regex {
            let matched = primitives::match_pattern(pattern, text).map_err(|e| {
                ValidateError::BadPattern {
                    descriptor: descriptor.to_owned(),
                    pattern: pattern.clone(),
                    detail: e.to_string(),
                }
            })?;
            if !matched {
                let mut context = Map::new();
                context.insert("regex".to_owned(), Value::String(pattern.clone()));
                self.fail(report, StatusCode::NoRegexMatch, descriptor, value, context);
                return Ok(false);
            }
        }
        Ok(self.check_text_range(descriptor, text, value, spec.range.as_ref(), report))
    }

    fn validate_key(
        &self,
        descriptor: &str,
        value: &Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let opts = &self.options;
        let Some(text) = value.as_str() else {
            self.fail(report, StatusCode::NotAString, descriptor, value, Map::new());
            return Ok(false);
        };
        if text.is_empty() {
            if descriptor == NAMESPACE_DESCRIPTOR {
                if opts.allow_default_namespace {
                    return Ok(true);
                }
                self.fail(
                    report,
                    StatusCode::NoReferenceDefaultNamespace,
                    descriptor,
                    value,
                    Map::new(),
                );
                return Ok(false);
            }
            self.fail(report, StatusCode::EmptyKey, descriptor, value, Map::new());
            return Ok(false);
        }
        if text == DEFAULT_NAMESPACE_KEY {
            self.fail(
                report,
                StatusCode::NoRefDefaultNamespaceKey,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        }
        if !check_key(text) {
            self.fail(report, StatusCode::BadKeyValue, descriptor, value, Map::new());
            return Ok(false);
        }
        let Some(qualifiers) = spec.kind.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(true);
        };
        let Some(term) = self.cache.lookup(text, opts.cache, opts.cache_missing)? else {
            self.fail(report, StatusCode::ValueNotTerm, descriptor, value, Map::new());
            return Ok(false);
        };
        let mut last_mismatch = None;
        for qualifier in qualifiers {
            let mismatch = match qualifier.as_str() {
                ANY_TERM => None,
                ANY_ENUM => (!term.is_enum_element()).then_some(StatusCode::NotAnEnum),
                ANY_DESCRIPTOR => (!term.is_descriptor()).then_some(StatusCode::UnknownDescriptor),
                ANY_STRUCTURE => {
                    (!term.is_structure()).then_some(StatusCode::NotAStructureDefinition)
                }
                other => {
                    return Err(ValidateError::UnknownKindQualifier {
                        descriptor: descriptor.to_owned(),
                        qualifier: other.to_owned(),
                    });
                }
            };
            match mismatch {
                None => return Ok(true),
                Some(code) => last_mismatch = Some(code),
            }
        }
        // Every qualifier mismatched; the last mismatch is reported.
        if let Some(code) = last_mismatch {
            self.fail(report, code, descriptor, value, Map::new());
            return Ok(false);
        }
        Ok(true)
    }

    fn validate_handle(
        &self,
        descriptor: &str,
        value: &Value,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let opts = &self.options;
        let Some(text) = value.as_str() else {
            self.fail(report, StatusCode::NotAString, descriptor, value, Map::new());
            return Ok(false);
        };
        let Some((collection, key)) = split_handle(text) else {
            self.fail(report, StatusCode::BadHandleValue, descriptor, value, Map::new());
            return Ok(false);
        };
        if !check_collection_name(collection) {
            self.fail(
                report,
                StatusCode::BadCollectionName,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        }
        if !self.cache.collection_exists(collection)? {
            self.fail(
                report,
                StatusCode::UnknownCollection,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        }
        if !check_key(key) {
            self.fail(report, StatusCode::BadKeyValue, descriptor, value, Map::new());
            return Ok(false);
        }
        if !self.cache.exists(collection, key, opts.cache, opts.cache_missing)? {
            self.fail(
                report,
                StatusCode::UnknownDocument,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn validate_enum(
        &self,
        descriptor: &str,
        value: &mut Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let opts = &self.options;
        let Some(text) = value.as_str().map(str::to_owned) else {
            self.fail(report, StatusCode::NotAString, descriptor, value, Map::new());
            return Ok(false);
        };
        if text == DEFAULT_NAMESPACE_KEY {
            self.fail(
                report,
                StatusCode::NoRefDefaultNamespaceKey,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        }
        let mut term = self.cache.lookup(&text, opts.cache, opts.cache_missing)?;
        if term.is_none() && opts.resolve {
            if let Some(enum_types) = spec.kind.as_deref() {
                if let Some(resolved) = resolver::resolve_enum_code(
                    &self.cache,
                    opts.resolve_field,
                    enum_types,
                    &text,
                )? {
                    resolver::apply_coercion(
                        &opts.language,
                        descriptor,
                        value,
                        Value::String(resolved.clone()),
                        report,
                    );
                    term = self.cache.lookup(&resolved, opts.cache, opts.cache_missing)?;
                }
            }
        }
        let Some(term) = term else {
            self.fail(report, StatusCode::ValueNotTerm, descriptor, value, Map::new());
            return Ok(false);
        };
        let Some(path) = &term.path else {
            self.fail(report, StatusCode::NotAnEnum, descriptor, value, Map::new());
            return Ok(false);
        };
        if let Some(enum_types) = spec.kind.as_deref().filter(|k| !k.is_empty()) {
            if !enum_types.iter().any(|t| path.contains(t)) {
                let mut context = Map::new();
                if let Ok(kinds) = serde_json::to_value(enum_types) {
                    context.insert("kind".to_owned(), kinds);
                }
                self.fail(
                    report,
                    StatusCode::NotCorrectEnumType,
                    descriptor,
                    value,
                    context,
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn validate_date(
        &self,
        descriptor: &str,
        value: &Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let Some(text) = value.as_str() else {
            self.fail(report, StatusCode::NotAString, descriptor, value, Map::new());
            return Ok(false);
        };
        if !primitives::check_date_format(text) {
            self.fail(
                report,
                StatusCode::InvalidDateFormat,
                descriptor,
                value,
                Map::new(),
            );
            return Ok(false);
        }
        Ok(self.check_text_range(descriptor, text, value, spec.range.as_ref(), report))
    }

    fn validate_geojson(&self, descriptor: &str, value: &Value, report: &mut ValueReport) -> bool {
        let Some(obj) = value.as_object() else {
            self.fail(report, StatusCode::NotAnObject, descriptor, value, Map::new());
            return false;
        };
        if !obj.contains_key("type") {
            self.fail(
                report,
                StatusCode::GeojsonMissingType,
                descriptor,
                value,
                Map::new(),
            );
            return false;
        }
        let Some(coordinates) = obj.get("coordinates") else {
            self.fail(
                report,
                StatusCode::GeojsonMissingCoordinates,
                descriptor,
                value,
                Map::new(),
            );
            return false;
        };
        if !coordinates.is_array() {
            self.fail(
                report,
                StatusCode::GeojsonInvalidCoordinates,
                descriptor,
                value,
                Map::new(),
            );
            return false;
        }
        true
    }

    fn validate_object(
        &self,
        descriptor: &str,
        value: &mut Value,
        spec: &ScalarSpec,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let opts = &self.options;
        if !value.is_object() {
            self.fail(report, StatusCode::NotAnObject, descriptor, value, Map::new());
            return Ok(false);
        }

        // Structural admission: first candidate structure that conforms
        // admits the object. Candidates report nothing individually.
        if let Some(candidates) = spec.kind.as_deref().filter(|k| !k.is_empty()) {
            let mut admitted = false;
            if let Some(obj) = value.as_object() {
                for structure_key in candidates {
                    let term = self
                        .cache
                        .lookup(structure_key, opts.cache, opts.cache_missing)?
                        .ok_or_else(|| ValidateError::UnknownStructure {
                            descriptor: descriptor.to_owned(),
                            structure: structure_key.clone(),
                        })?;
                    let Some(rule) = &term.rule else {
                        return Err(ValidateError::MissingRuleSection {
                            descriptor: descriptor.to_owned(),
                            structure: structure_key.clone(),
                        });
                    };
                    if rules::conforms(rule, obj) {
                        admitted = true;
                        break;
                    }
                }
            }
            if !admitted {
                let mut context = Map::new();
                if let Ok(section) = serde_json::to_value(spec) {
                    context.insert("section".to_owned(), section);
                }
                self.fail(
                    report,
                    StatusCode::InvalidObjectStructure,
                    descriptor,
                    value,
                    context,
                );
                return Ok(false);
            }
        }

        self.walk_properties(value, StatusCode::UnknownProperty, report)
    }

    /// Recurses every property of an object through the descriptor its name
    /// resolves to. `missing_code` is recorded for unresolved properties
    /// when terms are expected: [`StatusCode::UnknownProperty`] inside
    /// object leaves, [`StatusCode::UnknownDescriptor`] at the unqualified
    /// top level.
    fn walk_properties(
        &self,
        value: &mut Value,
        missing_code: StatusCode,
        report: &mut ValueReport,
    ) -> Result<bool, ValidateError> {
        let opts = &self.options;
        let keys: Vec<String> = value
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        for property in keys {
            let term = self.cache.lookup(&property, opts.cache, opts.cache_missing)?;
            let Some(term) = term else {
                if opts.expect_terms {
                    let offending = Value::String(property.clone());
                    self.fail(report, missing_code, &property, &offending, Map::new());
                    return Ok(false);
                }
                continue;
            };
            let Some(section) = term.data.clone() else {
                let offending = Value::String(property.clone());
                self.fail(
                    report,
                    StatusCode::PropertyNotDescriptor,
                    &property,
                    &offending,
                    Map::new(),
                );
                return Ok(false);
            };
            let Some(child) = value.as_object_mut().and_then(|o| o.get_mut(&property)) else {
                continue;
            };
            if !self.walk_data_section(&property, child, &section, report)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Records an error status for the innermost offending position.
    fn fail(
        &self,
        report: &mut ValueReport,
        code: StatusCode,
        descriptor: &str,
        value: &Value,
        context: Map<String, Value>,
    ) {
        report.record_error(
            code,
            &self.options.language,
            Some(descriptor),
            Some(value),
            context,
        );
    }
}

/// Side-channel context carrying the violated range.
fn range_context(range: &RangeSpec) -> Map<String, Value> {
    let mut context = Map::new();
    if let Ok(spec) = serde_json::to_value(range) {
        context.insert("range".to_owned(), spec);
    }
    context
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
