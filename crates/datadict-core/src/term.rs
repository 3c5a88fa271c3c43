//! Term records and their sections.
//!
//! A term is the unit of the data dictionary: a record under a globally
//! unique key that may carry a code section (identifiers), a data section
//! (the shape of values it describes), a rule section (structural
//! constraints for objects), and an enum path (the ordered enum-type
//! ancestors computed by the graph maintenance layer outside this crate).
//!
//! A term with a data section is a *descriptor*; one with a rule section is
//! a *structure definition*; one with a path is an *enum element*. The three
//! qualifications are independent and may coexist on a single record.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kind qualifiers
// ---------------------------------------------------------------------------

/// Kind qualifier: any term in the dictionary is admissible.
pub const ANY_TERM: &str = "any-term";
/// Kind qualifier: the referenced term must be an enum element.
pub const ANY_ENUM: &str = "any-enum";
/// Kind qualifier: the referenced term must carry a data section.
pub const ANY_DESCRIPTOR: &str = "any-descriptor";
/// Kind qualifier: the referenced term must carry a rule section.
pub const ANY_STRUCTURE: &str = "any-structure";

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// A full term record as stored in the term repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Globally unique document key.
    pub key: String,
    /// Identifier strings (local/namespace/global) and official identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeSection>,
    /// Data specification. Present iff this term is a descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSection>,
    /// Structural rules. Present iff this term is a structure definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleSection>,
    /// Ordered enum-type ancestor keys. Present iff this term is an enum
    /// element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl Term {
    /// Returns `true` if this term carries a data section.
    pub fn is_descriptor(&self) -> bool {
        self.data.is_some()
    }

    /// Returns `true` if this term carries an enum path.
    pub fn is_enum_element(&self) -> bool {
        self.path.is_some()
    }

    /// Returns `true` if this term carries a rule section.
    pub fn is_structure(&self) -> bool {
        self.rule.is_some()
    }
}

// ---------------------------------------------------------------------------
// Code section
// ---------------------------------------------------------------------------

/// Selects a code-section identifier field, used when resolving enum codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeField {
    /// The local identifier (default resolution field).
    #[default]
    LocalId,
    /// The namespace identifier.
    NamespaceId,
    /// The global identifier.
    GlobalId,
}

/// The identifier block of a term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeSection {
    /// Identifier local to the enclosing namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    /// Key of the namespace term this term belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
    /// Namespace-qualified global identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    /// All official identifiers, conventionally including the local id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub official_ids: Vec<String>,
}

impl CodeSection {
    /// Returns the identifier selected by `field`, if set.
    pub fn field(&self, field: CodeField) -> Option<&str> {
        match field {
            CodeField::LocalId => self.local_id.as_deref(),
            CodeField::NamespaceId => self.namespace_id.as_deref(),
            CodeField::GlobalId => self.global_id.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Data section
// ---------------------------------------------------------------------------

/// The data specification of a descriptor.
///
/// Exactly one of the four dimensionality selectors should be present; a
/// section with none is legal (it accepts any value unless the validator is
/// told types are required), and a section with more than one is dictionary
/// corruption, raised by the walker rather than reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Single leaf value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<ScalarSpec>,
    /// Ordered container; elements follow a nested data section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<Box<ArraySpec>>,
    /// Unordered container; elements follow a set-scalar section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<SetSpec>,
    /// Keyed container with a key section and a value section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict: Option<Box<DictSpec>>,
}

/// A borrowed view of the single dimensionality selector of a [`DataSection`].
#[derive(Debug, Clone, Copy)]
pub enum Dimension<'a> {
    /// The scalar selector.
    Scalar(&'a ScalarSpec),
    /// The array selector.
    Array(&'a ArraySpec),
    /// The set selector.
    Set(&'a SetSpec),
    /// The dict selector.
    Dict(&'a DictSpec),
}

impl Dimension<'_> {
    /// Name of the selector, for diff output and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Array(_) => "array",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
        }
    }
}

impl DataSection {
    /// Number of dimensionality selectors present. Anything above one is
    /// dictionary corruption.
    pub fn selector_count(&self) -> usize {
        usize::from(self.scalar.is_some())
            + usize::from(self.array.is_some())
            + usize::from(self.set.is_some())
            + usize::from(self.dict.is_some())
    }

    /// The dimensionality selector, if exactly zero or one is present.
    ///
    /// When more than one selector is set this returns the first in
    /// scalar/array/set/dict order; callers that care check
    /// [`selector_count`][DataSection::selector_count] first and raise.
    pub fn selector(&self) -> Option<Dimension<'_>> {
        if let Some(s) = &self.scalar {
            return Some(Dimension::Scalar(s));
        }
        if let Some(a) = self.array.as_deref() {
            return Some(Dimension::Array(a));
        }
        if let Some(s) = &self.set {
            return Some(Dimension::Set(s));
        }
        if let Some(d) = self.dict.as_deref() {
            return Some(Dimension::Dict(d));
        }
        None
    }
}

/// The leaf types a scalar specification may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafType {
    /// `true` / `false`.
    Boolean,
    /// Whole number; floats with a zero fractional part are admitted.
    Integer,
    /// Any finite number.
    Number,
    /// Unix milliseconds, or a parseable date string coerced to them.
    Timestamp,
    /// UTF-8 string.
    String,
    /// Reference to a term by key.
    Key,
    /// `collection/key` reference to a document in the store.
    Handle,
    /// Reference to an enum element, optionally restricted by enum type.
    Enum,
    /// Lexical date: `YYYY`, `YYYYMM`, `YYYYMMDD` or `YYYY-YYYY`.
    Date,
    /// Object whose deeper validation is delegated to the caller.
    Struct,
    /// Object validated against the structure definitions named in `kind`.
    Object,
    /// Shallow GeoJSON shape: object with `type` and array `coordinates`.
    Geojson,
}

impl LeafType {
    /// Lowercase name as it appears in stored data sections.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Timestamp => "timestamp",
            Self::String => "string",
            Self::Key => "key",
            Self::Handle => "handle",
            Self::Enum => "enum",
            Self::Date => "date",
            Self::Struct => "struct",
            Self::Object => "object",
            Self::Geojson => "geojson",
        }
    }
}

/// Leaf types admissible in a dict key section. Key sections never contain
/// nested containers, and keys are always strings on the wire, so only the
/// string-shaped leaves qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLeafType {
    /// Plain string key.
    String,
    /// Term-key reference.
    Key,
    /// `collection/key` handle.
    Handle,
    /// Enum element reference.
    Enum,
    /// Lexical date.
    Date,
}

impl KeyLeafType {
    /// The equivalent scalar leaf type.
    pub fn as_leaf(self) -> LeafType {
        match self {
            Self::String => LeafType::String,
            Self::Key => LeafType::Key,
            Self::Handle => LeafType::Handle,
            Self::Enum => LeafType::Enum,
            Self::Date => LeafType::Date,
        }
    }
}

/// A single leaf specification: type plus the optional leaf annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarSpec {
    /// Declared leaf type. Absent types are accepted unless the validator is
    /// told types are required.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub leaf_type: Option<LeafType>,
    /// Free-form format annotation; immutable across descriptor updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Unit annotation; immutable across descriptor updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Anchored match pattern applied to string-shaped values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Numeric/string/date range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSpec>,
    /// Admissible term qualifiers (wildcards or enum-type keys) for
    /// reference-shaped leaves, or candidate structure keys for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Vec<String>>,
}

/// Element specification for ordered containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArraySpec {
    /// Minimum element count, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum element count, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// The data section each element follows.
    #[serde(default)]
    pub data: DataSection,
}

/// Element specification for sets: leaf elements only, no nested containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetSpec {
    /// Minimum element count, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum element count, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// The set-scalar section each element follows. Absent accepts any
    /// non-container element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<ScalarSpec>,
}

/// Specification for keyed containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictSpec {
    /// Key section. A dict without one is reported with a negative status
    /// code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeySpec>,
    /// Value section, an arbitrary nested data section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Box<DataSection>>,
}

/// Key section of a dict: a restricted leaf specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Declared key leaf type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub leaf_type: Option<KeyLeafType>,
    /// Anchored match pattern applied to keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// String/date range applied to keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSpec>,
    /// Admissible term qualifiers for key/enum-typed keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Vec<String>>,
}

impl KeySpec {
    /// View of this key section as a scalar specification, for the shared
    /// leaf handlers.
    pub fn as_scalar(&self) -> ScalarSpec {
        ScalarSpec {
            leaf_type: self.leaf_type.map(KeyLeafType::as_leaf),
            format: None,
            unit: None,
            regex: self.regex.clone(),
            range: self.range.clone(),
            kind: self.kind.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// One endpoint of a range: a number for numeric leaves, a string for
/// string and date leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    /// Numeric endpoint.
    Number(f64),
    /// String or lexical-date endpoint, compared lexicographically.
    Text(String),
}

impl Bound {
    /// Numeric value of the endpoint, if it is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// String value of the endpoint, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s.as_str()),
        }
    }
}

/// A range with four independent bounds. Inclusive and exclusive variants
/// of the same side may in principle coexist; both are enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// Values below this bound are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_incl: Option<Bound>,
    /// Values at or below this bound are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_excl: Option<Bound>,
    /// Values above this bound are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_incl: Option<Bound>,
    /// Values at or above this bound are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_excl: Option<Bound>,
}

// ---------------------------------------------------------------------------
// Rule section
// ---------------------------------------------------------------------------

/// Structural constraints of a structure definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSection {
    /// Property-presence selectors; every declared selector must pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<RequiredSelectors>,
    /// Properties that must not appear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned: Option<Vec<String>>,
}

/// The required-property selectors of a rule section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredSelectors {
    /// Exactly one of the listed properties must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one: Option<Vec<String>>,
    /// Zero or one of the listed properties may be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_or_none: Option<Vec<String>>,
    /// At least one of the listed properties must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<String>>,
    /// Each choice set independently admits at most one present property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_or_none_set: Option<Vec<Vec<String>>>,
    /// Every listed property must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn term_qualifications_are_independent() {
        let t = Term {
            key: "color".to_owned(),
            code: None,
            data: Some(DataSection::default()),
            rule: None,
            path: Some(vec!["colorEnum".to_owned()]),
        };
        assert!(t.is_descriptor());
        assert!(t.is_enum_element());
        assert!(!t.is_structure());
    }

    #[test]
    fn data_section_selector_dispatch() {
        let section = DataSection {
            scalar: Some(ScalarSpec {
                leaf_type: Some(LeafType::Integer),
                ..ScalarSpec::default()
            }),
            ..DataSection::default()
        };
        assert_eq!(section.selector_count(), 1);
        match section.selector() {
            Some(Dimension::Scalar(s)) => assert_eq!(s.leaf_type, Some(LeafType::Integer)),
            Some(Dimension::Array(_) | Dimension::Set(_) | Dimension::Dict(_)) | None => {
                unreachable!("scalar selector expected")
            }
        }
    }

    #[test]
    fn empty_data_section_has_no_selector() {
        let section = DataSection::default();
        assert_eq!(section.selector_count(), 0);
        assert!(section.selector().is_none());
    }

    #[test]
    fn data_section_round_trips_json() {
        let json = r#"{"array":{"min_items":1,"data":{"scalar":{"type":"string"}}}}"#;
        let section: DataSection = serde_json::from_str(json).expect("deserialize");
        let array = section.array.as_ref().expect("array selector");
        assert_eq!(array.min_items, Some(1));
        assert_eq!(
            array.data.scalar.as_ref().and_then(|s| s.leaf_type),
            Some(LeafType::String)
        );
        let back = serde_json::to_string(&section).expect("serialize");
        let reparsed: DataSection = serde_json::from_str(&back).expect("reparse");
        assert_eq!(section, reparsed);
    }

    #[test]
    fn leaf_type_names_match_wire_form() {
        let t: LeafType = serde_json::from_str("\"geojson\"").expect("deserialize");
        assert_eq!(t, LeafType::Geojson);
        assert_eq!(t.name(), "geojson");
    }

    #[test]
    fn key_leaf_types_restrict_to_string_shapes() {
        let err = serde_json::from_str::<KeyLeafType>("\"object\"");
        assert!(err.is_err(), "object must not be a key leaf type");
        let ok: KeyLeafType = serde_json::from_str("\"handle\"").expect("deserialize");
        assert_eq!(ok.as_leaf(), LeafType::Handle);
    }

    #[test]
    fn bound_accepts_numbers_and_text() {
        let range: RangeSpec =
            serde_json::from_str(r#"{"min_incl":0,"max_incl":"2024"}"#).expect("deserialize");
        assert_eq!(range.min_incl.and_then(|b| b.as_number()), Some(0.0));
        assert_eq!(
            range.max_incl.as_ref().and_then(|b| b.as_text()),
            Some("2024")
        );
    }

    #[test]
    fn code_section_field_selection() {
        let code = CodeSection {
            local_id: Some("cm".to_owned()),
            namespace_id: Some("iso".to_owned()),
            global_id: Some("iso:cm".to_owned()),
            official_ids: vec!["cm".to_owned()],
        };
        assert_eq!(code.field(CodeField::LocalId), Some("cm"));
        assert_eq!(code.field(CodeField::NamespaceId), Some("iso"));
        assert_eq!(code.field(CodeField::GlobalId), Some("iso:cm"));
    }
}
