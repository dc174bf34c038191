// 🧾 Report projections - text blocks for the printed declaration
// Pure functions of a parsed document. Layout (pages, fonts) belongs to the
// consumer; these only produce aligned lines.

use crate::catalog::{contribution, header};
use crate::document::Document;
use crate::error::Result;
use crate::locale;
use crate::reconciliation::{is_category_18, CategoryTotals};
use crate::record::{Record, RecordKind, RecordSchema};
use serde::Serialize;

// ============================================================================
// PER-KIND DISPLAY LINES
// ============================================================================

/// Display lines for one record, chosen by record kind.
///
/// Contribution records get composite lines (branch/activity code, yes/no
/// flags, payroll period) and a trailing blank separator; the terminator has none.
pub fn display_lines(schema: &RecordSchema, record: &Record) -> Vec<String> {
    match schema.kind {
        RecordKind::Contribution => contribution_lines(schema, record),
        RecordKind::Terminator => Vec::new(),
        RecordKind::Header | RecordKind::Employee | RecordKind::Other => schema.labelled_lines(record),
    }
}

fn contribution_lines(schema: &RecordSchema, record: &Record) -> Vec<String> {
    let text = |name: &str| record.text(name).unwrap_or("").to_string();
    let mut lines = Vec::with_capacity(schema.columns().len() + 1);

    for col in schema.columns() {
        match col.name.as_str() {
            contribution::BRANCH_NO => lines.push(format!(
                "{:25} {}/{}",
                "ΑΡ.ΠΑΡΑΡΤ/ΚΑΔ",
                text(contribution::BRANCH_NO),
                text(contribution::ACTIVITY_CODE)
            )),
            contribution::ACTIVITY_CODE | contribution::PAYROLL_YEAR => {}
            contribution::FULL_TIME | contribution::ALL_WORKDAYS => {
                lines.push(format!("{:25} {}", col.label, locale::yes_no(&text(&col.name))))
            }
            contribution::PAYROLL_MONTH => lines.push(format!(
                "{:25} {} / {}",
                "ΜΙΣΘΟΛ.ΠΕΡΙΟΔΟΣ",
                text(contribution::PAYROLL_MONTH),
                text(contribution::PAYROLL_YEAR)
            )),
            _ => {
                if let Ok(value) = record.get(&col.name) {
                    lines.push(col.labelled(value));
                }
            }
        }
    }

    lines.push(String::new());
    lines
}

// ============================================================================
// HEADER BLOCKS
// ============================================================================

struct HeaderView<'a> {
    record: &'a Record,
}

impl<'a> HeaderView<'a> {
    fn text(&self, name: &str) -> Result<&'a str> {
        self.record.text(name)
    }

    fn period_from(&self) -> Result<String> {
        Ok(format!(
            "{}/{}",
            self.text(header::PERIOD_FROM_MONTH)?,
            self.text(header::PERIOD_FROM_YEAR)?
        ))
    }

    fn period_to(&self) -> Result<String> {
        Ok(format!(
            "{}/{}",
            self.text(header::PERIOD_TO_MONTH)?,
            self.text(header::PERIOD_TO_YEAR)?
        ))
    }

    fn days(&self) -> Result<i64> {
        self.record.integer(header::TOTAL_INSURED_DAYS)
    }

    fn earnings(&self) -> Result<String> {
        Ok(locale::format_amount(self.record.amount(header::TOTAL_EARNINGS)?))
    }

    fn contributions(&self) -> Result<String> {
        Ok(locale::format_amount(self.record.amount(header::TOTAL_CONTRIBUTIONS)?))
    }
}

fn header_view(doc: &Document) -> Result<HeaderView<'_>> {
    Ok(HeaderView { record: doc.header()? })
}

/// Employer identity, address, period and declared totals
pub fn employer_summary_block(doc: &Document) -> Result<String> {
    let h = header_view(doc)?;
    let period = h.period_from()?;
    let days = h.days()?;
    let earnings = h.earnings()?;
    let contributions = h.contributions()?;

    let mut out = String::new();
    out.push_str(&format!("ΤΥΠΟΣ ΔΗΛΩΣΗΣ:             {}\n", h.text(header::DECLARATION_TYPE)?));
    out.push_str(&format!(
        "ΥΠΟΚΑΤΑΣΤΗΜΑ ΙΚΑ ΥΠΟΒΟΛΗΣ: {} {}\n",
        h.text(header::IKA_BRANCH)?,
        h.text(header::IKA_BRANCH_NAME)?
    ));
    out.push_str(&format!("ΕΠΩΝΥΜΙΑ ΕΡΓΟΔΟΤΗ:         {}\n", h.text(header::EMPLOYER_NAME)?));
    out.push('\n');
    out.push_str(&format!(
        "Α.Μ.Ε.: {:10}             ΔΙΕΥΘΥΝΣΗ\n",
        h.text(header::EMPLOYER_REGISTRY_NO)?
    ));
    out.push_str(&format!(
        "Α.Φ.Μ.: {:10} {} {}\n",
        h.text(header::EMPLOYER_VAT_NO)?,
        h.text(header::STREET)?,
        h.text(header::STREET_NUMBER)?
    ));
    out.push_str(&format!(
        "        {:10} {} {}\n",
        "",
        h.text(header::POSTAL_CODE)?,
        h.text(header::CITY)?
    ));
    out.push('\n');
    out.push_str(&format!(
        "        {:10} ΑΠΟ ΜΗΝΑ/ΕΤΟΣ: {}   ΕΩΣ ΜΗΝΑ/ΕΤΟΣ: {}\n",
        "",
        period,
        h.period_to()?
    ));
    out.push('\n');
    out.push_str(&format!("{:19} {:>14} {:>14} {:>14} {:>14}\n", "ΣΥΝΟΛΑ ΑΝΑ ΜΗΝΑ:", period, "", "", "ΣΥΝΟΛΑ"));
    out.push_str(&format!("{:19} {:>14} {:>14} {:>14} {:>14}\n", "ΗΜΕΡΩΝ ΑΣΦΑΛΙΣΗΣ:", days, "", "", days));
    out.push_str(&format!("{:19} {:>14} {:>14} {:>14} {:>14}\n", "ΑΠΟΔΟΧΩΝ:", earnings, "", "", earnings));
    out.push_str(&format!(
        "{:19} {:>14} {:>14} {:>14} {:>14}\n",
        "ΚΑΤΑΒΛ.ΕΙΣΦΟΡΩΝ:", contributions, "", "", contributions
    ));
    Ok(out)
}

/// Two-line page header: employer numbers and period
pub fn period_header_block(doc: &Document) -> Result<String> {
    let h = header_view(doc)?;
    let mut out = String::new();
    out.push_str(&format!(
        "Α.Μ.Ε.:        {:24} Α.Φ.Μ.:        {}\n",
        h.text(header::EMPLOYER_REGISTRY_NO)?,
        h.text(header::EMPLOYER_VAT_NO)?
    ));
    out.push_str(&format!(
        "ΑΠΟ ΜΗΝΑ/ΕΤΟΣ: {:24} ΕΩΣ ΜΗΝΑ/ΕΤΟΣ: {}\n",
        h.period_from()?,
        h.period_to()?
    ));
    Ok(out)
}

/// Cover letter: employer data, declared totals, category-18 split and the
/// signature lines
pub fn cover_letter_block(doc: &Document) -> Result<String> {
    let h = header_view(doc)?;
    let period = h.period_from()?;
    let days = h.days()?;
    let earnings = h.earnings()?;
    let contributions = h.contributions()?;
    let by_category = doc.totals_by_category()?;

    let mut out = String::new();
    out.push_str(&format!("ΤΥΠΟΣ ΔΗΛΩΣΗΣ:     {}\n", h.text(header::DECLARATION_TYPE)?));
    out.push_str("ΥΠΟΚΑΤΑΣΤΗΜΑ ΙΚΑ \n");
    out.push_str(&format!(
        "ΥΠΟΒΟΛΗΣ:          {} {}\n",
        h.text(header::IKA_BRANCH)?,
        h.text(header::IKA_BRANCH_NAME)?
    ));
    out.push_str(&format!("ΕΠΩΝΥΜΙΑ ΕΡΓΟΔΟΤΗ: {}\n", h.text(header::EMPLOYER_NAME)?));
    out.push('\n');
    out.push_str(&format!("Α.Μ.Ε.: {}\n", h.text(header::EMPLOYER_REGISTRY_NO)?));
    out.push_str(&format!("Α.Φ.Μ.: {}\n", h.text(header::EMPLOYER_VAT_NO)?));
    out.push('\n');
    out.push_str(&format!(
        "ΔΙΕΥΘΥΝΣΗ :        {} {}\n",
        h.text(header::STREET)?,
        h.text(header::STREET_NUMBER)?
    ));
    out.push_str(&format!(
        "                   {} {}\n",
        h.text(header::POSTAL_CODE)?,
        h.text(header::CITY)?
    ));
    out.push('\n');
    out.push_str(&format!("ΑΠΟ ΜΗΝΑ/ΕΤΟΣ:     {}\n", period));
    out.push_str(&format!("ΕΩΣ ΜΗΝΑ/ΕΤΟΣ:     {}\n", h.period_to()?));
    out.push_str(&format!(
        "{:28}{:^9}{:^14}{:^14}{:^12}\n",
        "", "ΗΜΕΡΩΝ", "ΑΠΟΔΟΧΩΝ", "ΚΑΤΑΒΛΗΘΕΙΣΩΝ", "ΣΥΝΟΛΟ"
    ));
    out.push_str(&format!(
        "{:28}{:^9}{:^14}{:^14}{:^12}\n",
        "", "ΑΣΦΑΛΙΣΗΣ", "", "ΕΙΣΦΟΡΩΝ", "ΑΣΦΑΛΙΣΜΕΝΩΝ"
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:19}{:7}{:^9}{:>14}{:>14}\n",
        "ΣΥΝΟΛΑ ΑΝΑ ΜΗΝΑ:", period, days, earnings, contributions
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:19}{:7}{:^9}{:>14}{:>14}{:^12}\n",
        "",
        "ΣΥΝΟΛΑ:",
        days,
        earnings,
        contributions,
        doc.employee_count()
    ));
    out.push_str("\n\n");

    let has_category_18 = doc
        .contributions()
        .any(|r| is_category_18(r).unwrap_or(false));
    if has_category_18 {
        let other = CategoryTotals::display_row(&by_category.other);
        let cat18 = CategoryTotals::display_row(&by_category.category_18);
        out.push_str(&format!(
            "{:15}{:>11}{:^9}{:>14}{:>14}\n",
            "", "(ΧΩΡΙΣ 18):", other[0], other[1], other[2]
        ));
        out.push_str(&format!(
            "{:15}{:>11}{:^9}{:>14}{:>14}\n",
            "", "(ME 18):", cat18[0], cat18[1], cat18[2]
        ));
        out.push_str("\n\n");
    }

    out.push_str("Δηλώνω υπεύθυνα, ότι τα αναγραφόμενα συγκεντρωτικά στοιχεία του παρόντος εντύπου,\n");
    out.push_str("περιέχονται στο υποβαλλόμενο ηλεκτρονικό μέσο.\n");
    out.push_str("\n\n");
    out.push_str("Ο ΔΗΛΩΝ ΕΡΓΟΔΟΤΗΣ                                          Ο ΠΑΡΑΛΑΒΩΝ\n");
    out.push_str("\n\n\n");
    out.push_str("Ημερομηνία Υποβολής");
    Ok(out)
}

// ============================================================================
// DETAIL ROWS
// ============================================================================

/// Display lines per record, grouped: each employee followed by its
/// contribution records, in employee order.
pub fn grouped_report_rows(doc: &Document) -> Result<Vec<Vec<String>>> {
    let records = doc.records();
    let mut rows = Vec::new();
    for group in doc.groups() {
        let employee = &records[group.employee];
        rows.push(display_lines(doc.schema_for(employee)?, employee));
        for &idx in &group.contributions {
            let line = &records[idx];
            rows.push(display_lines(doc.schema_for(line)?, line));
        }
    }
    Ok(rows)
}

/// Every record's labelled columns, in file order
pub fn labelled_dump(doc: &Document) -> Result<String> {
    let mut blocks = Vec::with_capacity(doc.records().len());
    for record in doc.records() {
        blocks.push(doc.schema_for(record)?.labelled_lines(record).join("\n"));
    }
    Ok(blocks.join("\n"))
}

// ============================================================================
// REPORT BUNDLE
// ============================================================================

/// Everything the printed declaration needs, in print order
#[derive(Debug, Clone, Serialize)]
pub struct ReportBlocks {
    pub cover_letter: String,
    pub employer_summary: String,
    pub period_header: String,
    pub rows: Vec<Vec<String>>,
}

impl ReportBlocks {
    /// Plain-text rendition: cover letter, employer summary, then detail rows
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.cover_letter);
        out.push_str("\n\n");
        out.push_str(&self.period_header);
        out.push('\n');
        out.push_str(&self.employer_summary);
        out.push('\n');
        for row in &self.rows {
            for line in row {
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }
        out
    }
}

pub fn generate_report_blocks(doc: &Document) -> Result<ReportBlocks> {
    Ok(ReportBlocks {
        cover_letter: cover_letter_block(doc)?,
        employer_summary: employer_summary_block(doc)?,
        period_header: period_header_block(doc)?,
        rows: grouped_report_rows(doc)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
