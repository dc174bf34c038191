// 🧱 Record schemas - the positional layout of one record kind
// A schema is plain data: kind tag + prefix + ordered columns.

use crate::column::ColumnSchema;
use crate::error::{ApdError, Result};
use crate::value::FieldValue;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// RECORD KIND
// ============================================================================

/// RecordKind - what role a record plays in the declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Employer summary with the declared totals (first line)
    Header,
    /// Employee identity; opens a group
    Employee,
    /// Per-period contribution detail; belongs to the last employee
    Contribution,
    /// End marker (last line)
    Terminator,
    /// Anything else; appended without grouping
    Other,
}

impl RecordKind {
    pub fn name(&self) -> &str {
        match self {
            RecordKind::Header => "header",
            RecordKind::Employee => "employee",
            RecordKind::Contribution => "contribution",
            RecordKind::Terminator => "terminator",
            RecordKind::Other => "other",
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Record - one decoded line, tagged with its schema's prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    line_code: String,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub(crate) fn new(line_code: impl Into<String>) -> Self {
        Record {
            line_code: line_code.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Prefix of the schema that produced this record
    pub fn line_code(&self) -> &str {
        &self.line_code
    }

    pub fn get(&self, field: &str) -> Result<&FieldValue> {
        self.fields.get(field).ok_or_else(|| ApdError::UnknownField {
            field: field.to_string(),
        })
    }

    pub fn text(&self, field: &str) -> Result<&str> {
        let value = self.get(field)?;
        value.as_text().ok_or(ApdError::TypeMismatch {
            expected: "text",
            found: value.kind(),
        })
    }

    pub fn integer(&self, field: &str) -> Result<i64> {
        let value = self.get(field)?;
        value.as_integer().ok_or(ApdError::TypeMismatch {
            expected: "integer",
            found: value.kind(),
        })
    }

    pub fn amount(&self, field: &str) -> Result<Decimal> {
        let value = self.get(field)?;
        value.as_amount().ok_or(ApdError::TypeMismatch {
            expected: "amount",
            found: value.kind(),
        })
    }

    pub fn date(&self, field: &str) -> Result<Option<NaiveDate>> {
        let value = self.get(field)?;
        value.as_date().ok_or(ApdError::TypeMismatch {
            expected: "date",
            found: value.kind(),
        })
    }

    /// Fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite an existing field. Only the document's mutation paths use this.
    pub(crate) fn set(&mut self, field: &str, value: FieldValue) -> Result<()> {
        match self.fields.get_mut(field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ApdError::UnknownField {
                field: field.to_string(),
            }),
        }
    }

    fn insert(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }
}

// ============================================================================
// RECORD SCHEMA
// ============================================================================

/// RecordSchema - ordered columns behind a prefix code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub kind: RecordKind,
    pub name: String,
    pub prefix: String,
    columns: Vec<ColumnSchema>,
}

impl RecordSchema {
    /// Build a schema; field names must be unique and the prefix non-empty.
    pub fn new(
        kind: RecordKind,
        name: impl Into<String>,
        prefix: impl Into<String>,
        columns: Vec<ColumnSchema>,
    ) -> Result<Self> {
        let name = name.into();
        let prefix = prefix.into();

        if prefix.is_empty() {
            return Err(ApdError::EmptyPrefix { name });
        }

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(ApdError::DuplicateSchema(format!(
                    "column {:?} declared twice in record type {:?}",
                    col.name, name
                )));
            }
        }

        Ok(RecordSchema {
            kind,
            name,
            prefix,
            columns,
        })
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Prefix length + sum of column widths, in characters
    pub fn width(&self) -> usize {
        self.prefix.chars().count() + self.columns.iter().map(|c| c.width).sum::<usize>()
    }

    /// Build a record from explicit values; every declared column must be given
    /// and nothing else.
    pub fn build_record<'a>(
        &self,
        values: impl IntoIterator<Item = (&'a str, FieldValue)>,
    ) -> Result<Record> {
        let mut record = Record::new(&self.prefix);
        for (name, value) in values {
            if self.column(name).is_none() {
                return Err(ApdError::UnknownField {
                    field: name.to_string(),
                });
            }
            record.insert(name, value);
        }
        self.check_fields(&record)?;
        Ok(record)
    }

    /// The record carries this schema's prefix and exactly its columns.
    pub fn check_fields(&self, record: &Record) -> Result<()> {
        if record.line_code != self.prefix {
            return Err(ApdError::PrefixMismatch {
                prefix: self.prefix.clone(),
                line: record.line_code.clone(),
            });
        }
        for col in &self.columns {
            if !record.fields.contains_key(&col.name) {
                return Err(ApdError::UnknownField {
                    field: col.name.clone(),
                }
                .in_field(&col.name, &self.name));
            }
        }
        if let Some(extra) = record.fields.keys().find(|k| self.column(k).is_none()) {
            return Err(ApdError::UnknownField {
                field: extra.clone(),
            });
        }
        Ok(())
    }

    /// Prefix followed by every column in declared order
    pub fn encode(&self, record: &Record) -> Result<String> {
        let mut out = String::with_capacity(self.width());
        out.push_str(&self.prefix);
        for col in &self.columns {
            let encoded = record
                .get(&col.name)
                .and_then(|value| col.encode(value))
                .map_err(|e| e.in_field(&col.name, &self.name))?;
            out.push_str(&encoded);
        }
        Ok(out)
    }

    pub fn decode(&self, text: &str) -> Result<Record> {
        if !text.starts_with(&self.prefix) {
            return Err(ApdError::PrefixMismatch {
                prefix: self.prefix.clone(),
                line: text.to_string(),
            });
        }

        // byte offset of every char boundary, so columns can be cut by char position
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let actual = bounds.len() - 1;
        if actual != self.width() {
            return Err(ApdError::LengthMismatch {
                expected: self.width(),
                actual,
            });
        }

        let mut record = Record::new(&self.prefix);
        let mut start = self.prefix.chars().count();
        for col in &self.columns {
            let end = start + col.width;
            let slice = &text[bounds[start]..bounds[end]];
            let value = col
                .decode(slice)
                .map_err(|e| e.in_field(&col.name, text))?;
            record.insert(&col.name, value);
            start = end;
        }
        Ok(record)
    }

    /// One `label value` line per column, in declared order
    pub fn labelled_lines(&self, record: &Record) -> Vec<String> {
        self.columns
            .iter()
            .map(|col| match record.get(&col.name) {
                Ok(value) => col.labelled(value),
                Err(_) => format!("{:25}", col.label),
            })
            .collect()
    }

    /// Layout listing: header line, prefix, then one row per column
    pub fn describe(&self) -> String {
        let mut out = format!("LineType {:?}, lineSize={}\n", self.name, self.width());
        out.push_str(&format!("{:30} {:>4}\n", "prefix", self.prefix));
        for col in &self.columns {
            out.push_str(&col.describe());
            out.push('\n');
        }
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================
