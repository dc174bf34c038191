// APD Codec - Core Library
// Fixed-width employer contribution declarations: codec, document model,
// reconciliation and report projections. Used by the `apd` CLI and tests.

pub mod error;
pub mod value;
pub mod locale;          // Greek display formatting
pub mod column;          // Column codecs + column schema
pub mod record;          // Records + record schemas
pub mod catalog;         // Schema registry + the declaration layout
pub mod reconciliation;  // Header totals vs. detail sums
pub mod document;        // Parse / render / group / split
pub mod codepage;        // Windows-1253 wire bytes
pub mod report;          // Text blocks for the printed declaration
pub mod export;          // CSV + JSON
pub mod config;          // CLI configuration

// Re-export commonly used types
pub use error::{ApdError, Result};
pub use value::FieldValue;
pub use column::{ColumnCodec, ColumnSchema};
pub use record::{Record, RecordKind, RecordSchema};
pub use catalog::{apd_catalog, SchemaCatalog, CATEGORY_18};
pub use reconciliation::{
    CategoryTotals, Discrepancy, ReconciliationReport, Totals, TotalsField,
};
pub use document::{Document, EmployeeGroup, LineEnding};
pub use codepage::{
    decode_wire, encode_wire, fingerprint, read_document, render_bytes, write_document,
};
pub use report::{generate_report_blocks, labelled_dump, ReportBlocks};
pub use export::{contributions_csv, document_json};
pub use config::{ApdConfig, LineEndingChoice};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
