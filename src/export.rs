// 📤 Export - CSV detail rows and a JSON view of a parsed document

use crate::catalog::employee;
use crate::document::{Document, EmployeeGroup};
use crate::error::Result;
use crate::reconciliation::{CategoryTotals, Totals};
use crate::record::{Record, RecordKind};
use crate::value::FieldValue;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Employee columns repeated on every CSV row
const EMPLOYEE_COLUMNS: [&str; 4] = [
    employee::INSURANCE_NO,
    employee::AMKA,
    employee::SURNAME,
    employee::FIRST_NAME,
];

// ============================================================================
// CSV
// ============================================================================

/// One CSV row per contribution record, prefixed with its employee's identity.
///
/// Amounts are written with a `.` decimal point and dates as ISO, so the file
/// is machine-readable rather than a copy of the printed report.
pub fn contributions_csv(doc: &Document) -> Result<String> {
    let contribution_schema = match doc.catalog().by_kind(RecordKind::Contribution) {
        Some(schema) => schema,
        None => return Ok(String::new()),
    };

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut headers: Vec<&str> = EMPLOYEE_COLUMNS.to_vec();
    headers.extend(contribution_schema.columns().iter().map(|c| c.name.as_str()));
    writer.write_record(&headers)?;

    let records = doc.records();
    let mut rows = 0;
    for group in doc.groups() {
        let employee_record = &records[group.employee];
        for &idx in &group.contributions {
            let line = &records[idx];
            let mut row: Vec<String> = EMPLOYEE_COLUMNS
                .iter()
                .map(|name| cell(employee_record, name))
                .collect();
            row.extend(contribution_schema.columns().iter().map(|c| cell(line, &c.name)));
            writer.write_record(&row)?;
            rows += 1;
        }
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    debug!(rows, "exported contribution rows");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cell(record: &Record, name: &str) -> String {
    record.get(name).map(|v| v.to_string()).unwrap_or_default()
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RecordView<'a> {
    pub kind: RecordKind,
    pub record_type: &'a str,
    pub fields: BTreeMap<&'a str, &'a FieldValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView<'a> {
    pub records: Vec<RecordView<'a>>,
    pub groups: &'a [EmployeeGroup],
    pub declared: Totals,
    pub computed: Totals,
    pub by_category: CategoryTotals,
}

pub fn document_view(doc: &Document) -> Result<DocumentView<'_>> {
    let mut records = Vec::with_capacity(doc.records().len());
    for record in doc.records() {
        let schema = doc.schema_for(record)?;
        records.push(RecordView {
            kind: schema.kind,
            record_type: &schema.name,
            fields: record.fields().collect(),
        });
    }

    Ok(DocumentView {
        records,
        groups: doc.groups(),
        declared: doc.declared_totals()?,
        computed: doc.compute_totals()?,
        by_category: doc.totals_by_category()?,
    })
}

pub fn document_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(&document_view(doc)?)?)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::apd_catalog;
    use crate::document::tests::sample_text;

    fn sample_doc() -> Document {
        Document::parse(apd_catalog().unwrap(), &sample_text()).unwrap()
    }

    #[test]
    fn test_csv_one_row_per_contribution() {
        let csv_text = contributions_csv(&sample_doc()).unwrap();
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "insurance_no");
        assert_eq!(&headers[1], "amka");
        assert!(headers.iter().any(|h| h == "payable_contributions"));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);

        let earnings_idx = headers.iter().position(|h| h == "earnings").unwrap();
        let from_idx = headers.iter().position(|h| h == "employment_from").unwrap();
        assert_eq!(&rows[0][1], "01018012345");
        assert_eq!(&rows[0][2], "ΠΑΠΑΔΟΠΟΥΛΟΣ");
        assert_eq!(&rows[0][earnings_idx], "1000.00");
        assert_eq!(&rows[1][earnings_idx], "500.00");
        assert_eq!(&rows[0][from_idx], "2020-03-01");
    }

    #[test]
    fn test_json_view() {
        let json = document_json(&sample_doc()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["records"].as_array().unwrap().len(), 5);
        assert_eq!(value["records"][0]["record_type"], "Header");
        assert_eq!(value["groups"][0]["employee"], 1);
        assert_eq!(value["computed"]["insured_days"], 45);
        assert_eq!(value["declared"]["insured_days"], 45);
    }
}
