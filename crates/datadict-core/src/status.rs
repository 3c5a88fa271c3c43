//! Status codes, per-value reports and batch reports.
//!
//! The integer codes are public and stable; messages are presentation only
//! and localized at report time. Everything about the *input data* flows
//! through these types — the walker never raises for a data problem.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// StatusCode
// ---------------------------------------------------------------------------

/// Every outcome the validation walker can record for a value.
///
/// [`StatusCode::code`] returns the stable public integer. Codes 16 and 17
/// are unassigned; the negative codes cover malformed dict sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 0 — idle; the value passed untouched.
    Ok,
    /// 1 — the value passed after one or more coercions.
    ModifiedValue,
    /// 2 — an array was expected.
    NotAnArray,
    /// 3 — a scalar was expected but an array arrived.
    NotAScalar,
    /// 4 — a boolean was expected.
    NotABoolean,
    /// 5 — an integer was expected.
    NotAnInteger,
    /// 6 — a number was expected.
    NotANumber,
    /// 7 — a string was expected.
    NotAString,
    /// 8 — the leaf declares no type and types are required.
    MissingDataType,
    /// 9 — the data section declares no dimension and types are required.
    ExpectingDataDimension,
    /// 10 — neither a numeric timestamp nor a parseable date string.
    NotATimestamp,
    /// 11 — a string or date fell outside its range.
    OutOfRange,
    /// 12 — a number fell below its minimum bound.
    LowRange,
    /// 13 — a number rose above its maximum bound.
    HighRange,
    /// 14 — the value does not match the declared pattern.
    NoRegexMatch,
    /// 15 — an empty namespace reference without the enabling flag.
    NoReferenceDefaultNamespace,
    /// 18 — an empty key outside the namespace descriptor.
    EmptyKey,
    /// 19 — the referenced term carries no enum path.
    NotAnEnum,
    /// 20 — the referenced term carries no rule section.
    NotAStructureDefinition,
    /// 21 — the reserved `":"` key was referenced.
    NoRefDefaultNamespaceKey,
    /// 22 — a handle's document does not exist.
    UnknownDocument,
    /// 23 — a key fails the key regex.
    BadKeyValue,
    /// 24 — a handle fails the `collection/key` syntax.
    BadHandleValue,
    /// 25 — a handle's collection name fails the collection regex.
    BadCollectionName,
    /// 26 — a handle's collection does not exist.
    UnknownCollection,
    /// 27 — an enum element outside every declared enum type.
    NotCorrectEnumType,
    /// 28 — a property of an unqualified object resolves to no descriptor.
    UnknownDescriptor,
    /// 29 — a matched property's term is not a descriptor.
    PropertyNotDescriptor,
    /// 30 — the value references no known term.
    ValueNotTerm,
    /// 31 — an object was expected.
    NotAnObject,
    /// 32 — an unmatched property while terms are expected.
    UnknownProperty,
    /// 33 — the string is not a lexical date.
    InvalidDateFormat,
    /// 34 — the object conforms to none of its candidate structures.
    InvalidObjectStructure,
    /// 35 — a container value is not an array.
    ValueNotAnArray,
    /// 36 — fewer elements than the declared minimum.
    ArrayTooFewElements,
    /// 37 — more elements than the declared maximum.
    ArrayTooManyElements,
    /// 38 — a geojson object without a `type` property.
    GeojsonMissingType,
    /// 39 — a geojson object without a `coordinates` property.
    GeojsonMissingCoordinates,
    /// 40 — geojson `coordinates` that are not an array.
    GeojsonInvalidCoordinates,
    /// −1 — a dict without a key section.
    MissingDictKeySection,
    /// −2 — a dict without a value section.
    MissingDictValueSection,
    /// −3 — a dict key section with an inadmissible type.
    InvalidDictKeyType,
}

impl StatusCode {
    /// The stable public integer for this status.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::ModifiedValue => 1,
            Self::NotAnArray => 2,
            Self::NotAScalar => 3,
            Self::NotABoolean => 4,
            Self::NotAnInteger => 5,
            Self::NotANumber => 6,
            Self::NotAString => 7,
            Self::MissingDataType => 8,
            Self::ExpectingDataDimension => 9,
            Self::NotATimestamp => 10,
            Self::OutOfRange => 11,
            Self::LowRange => 12,
            Self::HighRange => 13,
            Self::NoRegexMatch => 14,
            Self::NoReferenceDefaultNamespace => 15,
            Self::EmptyKey => 18,
            Self::NotAnEnum => 19,
            Self::NotAStructureDefinition => 20,
            Self::NoRefDefaultNamespaceKey => 21,
            Self::UnknownDocument => 22,
            Self::BadKeyValue => 23,
            Self::BadHandleValue => 24,
            Self::BadCollectionName => 25,
            Self::UnknownCollection => 26,
            Self::NotCorrectEnumType => 27,
            Self::UnknownDescriptor => 28,
            Self::PropertyNotDescriptor => 29,
            Self::ValueNotTerm => 30,
            Self::NotAnObject => 31,
            Self::UnknownProperty => 32,
            Self::InvalidDateFormat => 33,
            Self::InvalidObjectStructure => 34,
            Self::ValueNotAnArray => 35,
            Self::ArrayTooFewElements => 36,
            Self::ArrayTooManyElements => 37,
            Self::GeojsonMissingType => 38,
            Self::GeojsonMissingCoordinates => 39,
            Self::GeojsonInvalidCoordinates => 40,
            Self::MissingDictKeySection => -1,
            Self::MissingDictValueSection => -2,
            Self::InvalidDictKeyType => -3,
        }
    }

    /// The canonical constant name, matching the public documentation.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ModifiedValue => "MODIFIED_VALUE",
            Self::NotAnArray => "NOT_AN_ARRAY",
            Self::NotAScalar => "NOT_A_SCALAR",
            Self::NotABoolean => "NOT_A_BOOLEAN",
            Self::NotAnInteger => "NOT_AN_INTEGER",
            Self::NotANumber => "NOT_A_NUMBER",
            Self::NotAString => "NOT_A_STRING",
            Self::MissingDataType => "MISSING_DATA_TYPE",
            Self::ExpectingDataDimension => "EXPECTING_DATA_DIMENSION",
            Self::NotATimestamp => "NOT_A_TIMESTAMP",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::LowRange => "LOW_RANGE",
            Self::HighRange => "HIGH_RANGE",
            Self::NoRegexMatch => "NO_REGEX_MATCH",
            Self::NoReferenceDefaultNamespace => "NO_REFERENCE_DEFAULT_NAMESPACE",
            Self::EmptyKey => "EMPTY_KEY",
            Self::NotAnEnum => "NOT_AN_ENUM",
            Self::NotAStructureDefinition => "NOT_A_STRUCTURE_DEFINITION",
            Self::NoRefDefaultNamespaceKey => "NO_REF_DEFAULT_NAMESPACE_KEY",
            Self::UnknownDocument => "UNKNOWN_DOCUMENT",
            Self::BadKeyValue => "BAD_KEY_VALUE",
            Self::BadHandleValue => "BAD_HANDLE_VALUE",
            Self::BadCollectionName => "BAD_COLLECTION_NAME",
            Self::UnknownCollection => "UNKNOWN_COLLECTION",
            Self::NotCorrectEnumType => "NOT_CORRECT_ENUM_TYPE",
            Self::UnknownDescriptor => "UNKNOWN_DESCRIPTOR",
            Self::PropertyNotDescriptor => "PROPERTY_NOT_DESCRIPTOR",
            Self::ValueNotTerm => "VALUE_NOT_TERM",
            Self::NotAnObject => "NOT_AN_OBJECT",
            Self::UnknownProperty => "UNKNOWN_PROPERTY",
            Self::InvalidDateFormat => "INVALID_DATE_FORMAT",
            Self::InvalidObjectStructure => "INVALID_OBJECT_STRUCTURE",
            Self::ValueNotAnArray => "VALUE_NOT_AN_ARRAY",
            Self::ArrayTooFewElements => "ARRAY_HAS_TOO_FEW_ELEMENTS",
            Self::ArrayTooManyElements => "ARRAY_HAS_TOO_MANY_ELEMENTS",
            Self::GeojsonMissingType => "MISSING_TYPE",
            Self::GeojsonMissingCoordinates => "MISSING_COORDINATES",
            Self::GeojsonInvalidCoordinates => "INVALID_COORDINATES",
            Self::MissingDictKeySection => "MISSING_DICT_KEY_SECTION",
            Self::MissingDictValueSection => "MISSING_DICT_VALUE_SECTION",
            Self::InvalidDictKeyType => "INVALID_DICT_KEY_TYPE",
        }
    }

    /// Localized message. Italian for `it*` tags, English otherwise.
    pub fn message(self, language: &str) -> &'static str {
        if language.starts_with("it") {
            return self.message_it();
        }
        self.message_en()
    }

    fn message_en(self) -> &'static str {
        match self {
            Self::Ok => "idle",
            Self::ModifiedValue => "value was accepted with modifications",
            Self::NotAnArray => "value is not an array",
            Self::NotAScalar => "value is not a scalar",
            Self::NotABoolean => "value is not a boolean",
            Self::NotAnInteger => "value is not an integer",
            Self::NotANumber => "value is not a number",
            Self::NotAString => "value is not a string",
            Self::MissingDataType => "data section declares no type",
            Self::ExpectingDataDimension => "data section declares no dimension",
            Self::NotATimestamp => "value is not a timestamp",
            Self::OutOfRange => "value is out of range",
            Self::LowRange => "value is below the minimum of its range",
            Self::HighRange => "value is above the maximum of its range",
            Self::NoRegexMatch => "value does not match the expected pattern",
            Self::NoReferenceDefaultNamespace => "cannot reference the default namespace",
            Self::EmptyKey => "key is empty",
            Self::NotAnEnum => "term is not an enumeration element",
            Self::NotAStructureDefinition => "term is not a structure definition",
            Self::NoRefDefaultNamespaceKey => "cannot reference the default namespace key",
            Self::UnknownDocument => "document not found",
            Self::BadKeyValue => "invalid key value",
            Self::BadHandleValue => "invalid handle value",
            Self::BadCollectionName => "invalid collection name",
            Self::UnknownCollection => "collection not found",
            Self::NotCorrectEnumType => "term does not belong to the expected enumeration type",
            Self::UnknownDescriptor => "descriptor not found",
            Self::PropertyNotDescriptor => "property is not a descriptor",
            Self::ValueNotTerm => "value does not reference a known term",
            Self::NotAnObject => "value is not an object",
            Self::UnknownProperty => "unknown property",
            Self::InvalidDateFormat => "invalid date format",
            Self::InvalidObjectStructure => "object does not conform to any declared structure",
            Self::ValueNotAnArray => "container value is not an array",
            Self::ArrayTooFewElements => "array has too few elements",
            Self::ArrayTooManyElements => "array has too many elements",
            Self::GeojsonMissingType => "geojson value has no type",
            Self::GeojsonMissingCoordinates => "geojson value has no coordinates",
            Self::GeojsonInvalidCoordinates => "geojson coordinates are not an array",
            Self::MissingDictKeySection => "dictionary has no key section",
            Self::MissingDictValueSection => "dictionary has no value section",
            Self::InvalidDictKeyType => "dictionary key section has an inadmissible type",
        }
    }

    fn message_it(self) -> &'static str {
        match self {
            Self::Ok => "inattivo",
            Self::ModifiedValue => "valore accettato con modifiche",
            Self::NotAnArray => "il valore non è un array",
            Self::NotAScalar => "il valore non è uno scalare",
            Self::NotABoolean => "il valore non è un booleano",
            Self::NotAnInteger => "il valore non è un intero",
            Self::NotANumber => "il valore non è un numero",
            Self::NotAString => "il valore non è una stringa",
            Self::MissingDataType => "la sezione dati non dichiara un tipo",
            Self::ExpectingDataDimension => "la sezione dati non dichiara una dimensione",
            Self::NotATimestamp => "il valore non è un timestamp",
            Self::OutOfRange => "valore fuori intervallo",
            Self::LowRange => "valore sotto il minimo dell'intervallo",
            Self::HighRange => "valore sopra il massimo dell'intervallo",
            Self::NoRegexMatch => "il valore non corrisponde al modello previsto",
            Self::NoReferenceDefaultNamespace => {
                "impossibile riferire il namespace predefinito"
            }
            Self::EmptyKey => "la chiave è vuota",
            Self::NotAnEnum => "il termine non è un elemento di enumerazione",
            Self::NotAStructureDefinition => "il termine non è una definizione di struttura",
            Self::NoRefDefaultNamespaceKey => {
                "impossibile riferire la chiave del namespace predefinito"
            }
            Self::UnknownDocument => "documento non trovato",
            Self::BadKeyValue => "valore di chiave non valido",
            Self::BadHandleValue => "valore di handle non valido",
            Self::BadCollectionName => "nome di collezione non valido",
            Self::UnknownCollection => "collezione non trovata",
            Self::NotCorrectEnumType => {
                "il termine non appartiene al tipo di enumerazione previsto"
            }
            Self::UnknownDescriptor => "descrittore non trovato",
            Self::PropertyNotDescriptor => "la proprietà non è un descrittore",
            Self::ValueNotTerm => "il valore non riferisce un termine conosciuto",
            Self::NotAnObject => "il valore non è un oggetto",
            Self::UnknownProperty => "proprietà sconosciuta",
            Self::InvalidDateFormat => "formato di data non valido",
            Self::InvalidObjectStructure => {
                "l'oggetto non è conforme ad alcuna struttura dichiarata"
            }
            Self::ValueNotAnArray => "il valore contenitore non è un array",
            Self::ArrayTooFewElements => "l'array ha troppo pochi elementi",
            Self::ArrayTooManyElements => "l'array ha troppi elementi",
            Self::GeojsonMissingType => "il valore geojson non ha il tipo",
            Self::GeojsonMissingCoordinates => "il valore geojson non ha le coordinate",
            Self::GeojsonInvalidCoordinates => "le coordinate geojson non sono un array",
            Self::MissingDictKeySection => "il dizionario non ha la sezione chiave",
            Self::MissingDictValueSection => "il dizionario non ha la sezione valore",
            Self::InvalidDictKeyType => {
                "la sezione chiave del dizionario ha un tipo non ammesso"
            }
        }
    }

    /// Returns `true` for anything other than idle or modified-value.
    pub fn is_error(self) -> bool {
        !matches!(self, Self::Ok | Self::ModifiedValue)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A status code paired with its localized message, fixed at report time.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// The status code.
    pub code: StatusCode,
    /// The message in the run's language.
    pub message: String,
}

impl Status {
    /// Builds a status for `code` localized to `language`.
    pub fn new(code: StatusCode, language: &str) -> Self {
        Self {
            code,
            message: code.message(language).to_owned(),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("code", &self.code.code())?;
        map.serialize_entry("message", &self.message)?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Change log
// ---------------------------------------------------------------------------

/// One applied coercion: which field changed, from what, to what.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEntry {
    /// The descriptor or property whose value was replaced.
    pub field: String,
    /// The raw value before the coercion.
    pub original: Value,
    /// The canonical value after the coercion.
    pub resolved: Value,
}

/// Log key for a coercion: SHA-256 over the descriptor key and the
/// canonical JSON of the resolved value. Applying the same resolution many
/// times lands on the same key, keeping the log idempotent.
pub fn change_key(descriptor: &str, resolved: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(descriptor.as_bytes());
    hasher.update([0u8]);
    hasher.update(serde_json::to_string(resolved).unwrap_or_default().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ---------------------------------------------------------------------------
// ValueReport
// ---------------------------------------------------------------------------

/// The status record for one value (or one indexed element of a batch).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueReport {
    /// Outcome status.
    pub status: Status,
    /// Key of the descriptor that produced the status, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    /// The offending value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Side-channel context: the failing regex, the enclosing section, the
    /// violated range.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
    /// Idempotent coercion log, keyed by [`change_key`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub changes: BTreeMap<String, ChangeEntry>,
}

impl ValueReport {
    /// An idle report in the given language.
    pub fn idle(language: &str) -> Self {
        Self {
            status: Status::new(StatusCode::Ok, language),
            descriptor: None,
            value: None,
            context: Map::new(),
            changes: BTreeMap::new(),
        }
    }

    /// Returns `true` if an error status has been recorded.
    pub fn is_error(&self) -> bool {
        self.status.code.is_error()
    }

    /// Returns `true` if at least one coercion has been logged.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Records an error for the innermost offending position.
    ///
    /// The first error wins: once set, later attempts leave the report
    /// untouched so outer recursion levels cannot overwrite the innermost
    /// finding. An error replaces an idle or modified-value status together
    /// with its coercion log.
    pub fn record_error(
        &mut self,
        code: StatusCode,
        language: &str,
        descriptor: Option<&str>,
        value: Option<&Value>,
        context: Map<String, Value>,
    ) {
        if self.is_error() {
            return;
        }
        self.status = Status::new(code, language);
        self.descriptor = descriptor.map(str::to_owned);
        self.value = value.cloned();
        self.context = context;
        self.changes.clear();
    }

    /// Logs a coercion and lifts an idle status to modified-value.
    pub fn record_change(&mut self, language: &str, descriptor: &str, entry: ChangeEntry) {
        if self.is_error() {
            return;
        }
        self.changes.insert(change_key(descriptor, &entry.resolved), entry);
        if self.status.code == StatusCode::Ok {
            self.status = Status::new(StatusCode::ModifiedValue, language);
        }
    }
}

// ---------------------------------------------------------------------------
// BatchReport
// ---------------------------------------------------------------------------

/// The ordered, indexed outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// One report per input position.
    pub reports: Vec<ValueReport>,
    /// Count of idle reports.
    pub valid: usize,
    /// Count of reports that passed with coercions.
    pub warnings: usize,
    /// Count of reports with an error status.
    pub errors: usize,
}

impl BatchReport {
    /// Prepares `len` idle reports in the given language.
    pub fn idle(len: usize, language: &str) -> Self {
        Self {
            reports: (0..len).map(|_| ValueReport::idle(language)).collect(),
            valid: len,
            warnings: 0,
            errors: 0,
        }
    }

    /// Mutable access to the report at `index`.
    pub fn report_mut(&mut self, index: usize) -> Option<&mut ValueReport> {
        self.reports.get_mut(index)
    }

    /// Recomputes the valid/warnings/errors counters from the reports.
    pub fn recount(&mut self) {
        self.valid = 0;
        self.warnings = 0;
        self.errors = 0;
        for report in &self.reports {
            if report.is_error() {
                self.errors += 1;
            } else if report.has_changes() {
                self.warnings += 1;
            } else {
                self.valid += 1;
            }
        }
    }

    /// The batch return code: `-1` if any index errored, `1` if any index
    /// logged a coercion and none errored, `0` otherwise.
    pub fn resolution(&self) -> i32 {
        if self.reports.iter().any(ValueReport::is_error) {
            return -1;
        }
        if self.reports.iter().any(ValueReport::has_changes) {
            return 1;
        }
        0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
