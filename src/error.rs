// ⚠️ Error taxonomy for the APD codec
// Codec, schema, catalog and parse failures share one typed enum so callers
// (CLI, report layer) can match on the condition and still print context.

use thiserror::Error;

/// Every failure the library can produce.
///
/// Record-level failures are wrapped in [`ApdError::Field`] (which column, which
/// raw record) and [`ApdError::Line`] (which input line). Use [`ApdError::root`]
/// to get at the underlying condition.
#[derive(Debug, Error)]
pub enum ApdError {
    /// Encoded text would not fit in the column.
    #[error("value {value:?} does not fit in {width} characters")]
    ValueTooWide { width: usize, value: String },

    /// Slice or value violates the column grammar.
    #[error("malformed value {value:?}: {reason}")]
    MalformedValue { value: String, reason: String },

    /// The value variant is not accepted by the codec.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("line {line:?} does not start with prefix {prefix:?}")]
    PrefixMismatch { prefix: String, line: String },

    #[error("record length is {actual}, schema expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Registration-time programmer error.
    #[error("duplicate schema: {0}")]
    DuplicateSchema(String),

    #[error("record type {name:?} has an empty prefix")]
    EmptyPrefix { name: String },

    #[error("prefixes {first:?} and {second:?} are ambiguous (one is a prefix of the other)")]
    AmbiguousPrefix { first: String, second: String },

    #[error("line {line}: no record type registered for {content:?}")]
    UnknownRecordType { line: usize, content: String },

    /// A record whose prefix the document's catalog does not know.
    #[error("no record type registered for prefix {prefix:?}")]
    UnregisteredPrefix { prefix: String },

    #[error("field {field:?} is not part of this record")]
    UnknownField { field: String },

    /// Record order violates the declaration layout (header first, terminator last, ...).
    #[error("line {line}: {message}")]
    Layout { line: usize, message: String },

    #[error("document has no header record")]
    MissingHeader,

    #[error("character {character:?} cannot be written in the Windows-1253 codepage")]
    Unencodable { character: char },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field {field:?} in record {record:?}: {source}")]
    Field {
        field: String,
        record: String,
        #[source]
        source: Box<ApdError>,
    },

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ApdError>,
    },
}

impl ApdError {
    pub(crate) fn malformed(value: impl Into<String>, reason: impl Into<String>) -> Self {
        ApdError::MalformedValue {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn in_field(self, field: &str, record: &str) -> Self {
        ApdError::Field {
            field: field.to_string(),
            record: record.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn at_line(self, line: usize) -> Self {
        ApdError::Line {
            line,
            source: Box::new(self),
        }
    }

    /// Strip the `Field` / `Line` context wrappers.
    pub fn root(&self) -> &ApdError {
        match self {
            ApdError::Field { source, .. } | ApdError::Line { source, .. } => source.root(),
            other => other,
        }
    }

    /// Input line number, if the error was raised while parsing.
    pub fn line(&self) -> Option<usize> {
        match self {
            ApdError::Line { line, .. }
            | ApdError::UnknownRecordType { line, .. }
            | ApdError::Layout { line, .. } => Some(*line),
            ApdError::Field { source, .. } => source.line(),
            _ => None,
        }
    }

    /// Name of the column the error is attributed to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ApdError::Field { field, .. } => Some(field),
            ApdError::Line { source, .. } => source.field(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApdError>;
