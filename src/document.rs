// 📄 Document - an ordered declaration file
// Parse → records in file order + employee grouping; render back byte-exact;
// totals, validation and the category-18 split mutation.

use crate::catalog::{contribution, header, SchemaCatalog, CATEGORY_18};
use crate::error::{ApdError, Result};
use crate::reconciliation::{self, CategoryTotals, Discrepancy, ReconciliationReport, Totals};
use crate::record::{Record, RecordKind, RecordSchema};
use crate::value::FieldValue;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// One employee record and the contribution records parsed after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeGroup {
    pub employee: usize,
    pub contributions: Vec<usize>,
}

/// Document - records in file order plus the derived grouping index
#[derive(Debug, Clone)]
pub struct Document {
    catalog: Arc<SchemaCatalog>,
    records: Vec<Record>,
    groups: Vec<EmployeeGroup>,
    line_ending: LineEnding,
    trailing_newline: bool,
    terminated: bool,
}

impl Document {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Document {
            catalog,
            records: Vec::new(),
            groups: Vec::new(),
            line_ending: LineEnding::Lf,
            trailing_newline: false,
            terminated: false,
        }
    }

    // ========================================================================
    // PARSING
    // ========================================================================

    /// Parse a whole file (already decoded from the wire codepage).
    ///
    /// Lines are split on `\n`; a `\r` before it is dropped and the document
    /// renders back with CRLF. Blank lines are tolerated only at the end.
    pub fn parse(catalog: Arc<SchemaCatalog>, text: &str) -> Result<Document> {
        let mut doc = Document::new(catalog);
        let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();

        if text.split('\n').next().is_some_and(|first| first.ends_with('\r')) {
            doc.line_ending = LineEnding::CrLf;
        }
        doc.trailing_newline = text.ends_with('\n');

        let last_content = lines.iter().rposition(|l| !l.trim().is_empty());

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                if last_content.map_or(true, |last| idx > last) {
                    trace!(line = line_no, "skipping trailing blank line");
                    continue;
                }
                return Err(ApdError::UnknownRecordType {
                    line: line_no,
                    content: line.to_string(),
                });
            }

            let schema = doc
                .catalog
                .dispatch(line)
                .ok_or_else(|| ApdError::UnknownRecordType {
                    line: line_no,
                    content: line.to_string(),
                })?;
            trace!(line = line_no, record_type = %schema.name, "dispatch");

            let record = schema.decode(line).map_err(|e| e.at_line(line_no))?;
            doc.append(record, line_no)?;
        }

        doc.finish(lines.len())?;
        debug!(
            records = doc.records.len(),
            employees = doc.groups.len(),
            "parsed document"
        );
        Ok(doc)
    }

    /// Build a document from records in file order, with the same layout
    /// checks as [`parse`](Self::parse).
    pub fn from_records(catalog: Arc<SchemaCatalog>, records: Vec<Record>) -> Result<Document> {
        let mut doc = Document::new(catalog);
        let count = records.len();
        for (idx, record) in records.into_iter().enumerate() {
            doc.append(record, idx + 1)?;
        }
        doc.finish(count)?;
        Ok(doc)
    }

    /// Append one record, updating the grouping index
    pub fn push(&mut self, record: Record) -> Result<()> {
        let line_no = self.records.len() + 1;
        self.append(record, line_no)
    }

    fn append(&mut self, record: Record, line_no: usize) -> Result<()> {
        let schema = match self.catalog.by_prefix(record.line_code()) {
            Some(schema) => schema,
            None => {
                return Err(ApdError::UnknownRecordType {
                    line: line_no,
                    content: record.line_code().to_string(),
                })
            }
        };
        schema.check_fields(&record).map_err(|e| e.at_line(line_no))?;
        let kind = schema.kind;

        if self.terminated {
            return Err(layout(line_no, "record after the terminator"));
        }
        if self.catalog.has_kind(RecordKind::Header) {
            let is_first = self.records.is_empty();
            if is_first && kind != RecordKind::Header {
                return Err(layout(line_no, "the first record must be the header"));
            }
            if !is_first && kind == RecordKind::Header {
                return Err(layout(line_no, "a second header record"));
            }
        }

        let index = self.records.len();
        match kind {
            RecordKind::Employee => self.groups.push(EmployeeGroup {
                employee: index,
                contributions: Vec::new(),
            }),
            RecordKind::Contribution => match self.groups.last_mut() {
                Some(group) => group.contributions.push(index),
                None => return Err(layout(line_no, "contribution record before any employee record")),
            },
            RecordKind::Terminator => self.terminated = true,
            RecordKind::Header | RecordKind::Other => {}
        }

        self.records.push(record);
        Ok(())
    }

    fn finish(&self, line_count: usize) -> Result<()> {
        if self.catalog.has_kind(RecordKind::Header) && self.records.is_empty() {
            return Err(ApdError::MissingHeader);
        }
        if self.catalog.has_kind(RecordKind::Terminator) && !self.terminated {
            return Err(layout(line_count.max(1), "missing terminator record"));
        }
        Ok(())
    }

    /// Recompute the grouping index from the records
    fn rebuild_groups(&mut self) {
        let mut groups: Vec<EmployeeGroup> = Vec::new();
        for (index, record) in self.records.iter().enumerate() {
            match self.catalog.kind_of(record.line_code()) {
                RecordKind::Employee => groups.push(EmployeeGroup {
                    employee: index,
                    contributions: Vec::new(),
                }),
                RecordKind::Contribution => {
                    if let Some(group) = groups.last_mut() {
                        group.contributions.push(index);
                    }
                }
                _ => {}
            }
        }
        self.groups = groups;
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn groups(&self) -> &[EmployeeGroup] {
        &self.groups
    }

    pub fn employee_count(&self) -> usize {
        self.groups.len()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn set_line_ending(&mut self, ending: LineEnding) {
        self.line_ending = ending;
    }

    pub fn kind_of(&self, record: &Record) -> RecordKind {
        self.catalog.kind_of(record.line_code())
    }

    pub fn schema_for(&self, record: &Record) -> Result<&RecordSchema> {
        self.catalog
            .by_prefix(record.line_code())
            .ok_or_else(|| ApdError::UnregisteredPrefix {
                prefix: record.line_code().to_string(),
            })
    }

    pub fn header(&self) -> Result<&Record> {
        self.records
            .iter()
            .find(|r| self.kind_of(r) == RecordKind::Header)
            .ok_or(ApdError::MissingHeader)
    }

    pub fn contributions(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(move |r| self.kind_of(r) == RecordKind::Contribution)
    }

    pub fn contribution_count(&self) -> usize {
        self.contributions().count()
    }

    // ========================================================================
    // RENDERING
    // ========================================================================

    /// Re-encode every record in order. Identity on an unmodified parse.
    pub fn render(&self) -> Result<String> {
        let ending = self.line_ending.as_str();
        let mut lines = Vec::with_capacity(self.records.len());
        for (idx, record) in self.records.iter().enumerate() {
            let line = self
                .schema_for(record)
                .and_then(|schema| schema.encode(record))
                .map_err(|e| e.at_line(idx + 1))?;
            lines.push(line);
        }
        let mut out = lines.join(ending);
        if self.trailing_newline {
            out.push_str(ending);
        }
        Ok(out)
    }

    // ========================================================================
    // TOTALS & VALIDATION
    // ========================================================================

    pub fn compute_totals(&self) -> Result<Totals> {
        Totals::from_contributions(self.contributions())
    }

    pub fn totals_by_category(&self) -> Result<CategoryTotals> {
        CategoryTotals::from_contributions(self.contributions())
    }

    pub fn declared_totals(&self) -> Result<Totals> {
        Totals::declared_by(self.header()?)
    }

    /// Header totals that disagree with the detail lines. Advisory only.
    pub fn validate(&self) -> Result<Vec<Discrepancy>> {
        let declared = self.declared_totals()?;
        let computed = self.compute_totals()?;
        Ok(reconciliation::compare(&declared, &computed))
    }

    pub fn reconciliation_report(&self) -> Result<ReconciliationReport> {
        let declared = self.declared_totals()?;
        let computed = self.compute_totals()?;
        Ok(ReconciliationReport {
            declared,
            computed,
            by_category: self.totals_by_category()?,
            discrepancies: reconciliation::compare(&declared, &computed),
            employee_count: self.employee_count(),
            contribution_count: self.contribution_count(),
            reconciled_at: Utc::now(),
        })
    }

    /// Overwrite the header's three totals with the computed ones
    pub fn reconcile_header(&mut self) -> Result<()> {
        let (idx, header_record, computed) = reconciled_header(&self.catalog, &self.records)?;
        self.records[idx] = header_record;
        log_reconciled(&computed);
        Ok(())
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Insert, right after every contribution record, a copy tagged with
    /// earnings type `18` and the given employment period; then reconcile
    /// the header. Returns the number of records inserted.
    pub fn split_contribution_records_by_category(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize> {
        let mut expanded = Vec::with_capacity(self.records.len() * 2);
        let mut inserted = 0;

        for record in &self.records {
            expanded.push(record.clone());
            if self.catalog.kind_of(record.line_code()) == RecordKind::Contribution {
                let mut duplicate = record.clone();
                duplicate.set(contribution::EARNINGS_TYPE, FieldValue::text(CATEGORY_18))?;
                duplicate.set(contribution::EMPLOYMENT_FROM, FieldValue::Date(Some(from)))?;
                duplicate.set(contribution::EMPLOYMENT_TO, FieldValue::Date(Some(to)))?;
                expanded.push(duplicate);
                inserted += 1;
            }
        }

        // nothing is committed until the header has been reconciled
        let (idx, header_record, computed) = reconciled_header(&self.catalog, &expanded)?;
        expanded[idx] = header_record;

        self.records = expanded;
        self.rebuild_groups();
        log_reconciled(&computed);

        debug!(inserted, %from, %to, "split contribution records into category 18");
        Ok(inserted)
    }
}

/// Header index and a copy of the header carrying the totals of `records`
fn reconciled_header(catalog: &SchemaCatalog, records: &[Record]) -> Result<(usize, Record, Totals)> {
    let computed = Totals::from_contributions(
        records
            .iter()
            .filter(|r| catalog.kind_of(r.line_code()) == RecordKind::Contribution),
    )?;
    let idx = records
        .iter()
        .position(|r| catalog.kind_of(r.line_code()) == RecordKind::Header)
        .ok_or(ApdError::MissingHeader)?;

    let mut header_record = records[idx].clone();
    header_record.set(header::TOTAL_EARNINGS, FieldValue::Amount(computed.amount))?;
    header_record.set(header::TOTAL_CONTRIBUTIONS, FieldValue::Amount(computed.contributions))?;
    header_record.set(header::TOTAL_INSURED_DAYS, FieldValue::Integer(computed.insured_days))?;
    Ok((idx, header_record, computed))
}

fn log_reconciled(computed: &Totals) {
    debug!(
        days = computed.insured_days,
        earnings = %computed.amount,
        contributions = %computed.contributions,
        "header totals reconciled"
    );
}

fn layout(line: usize, message: &str) -> ApdError {
    ApdError::Layout {
        line,
        message: message.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
