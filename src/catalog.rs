// 📚 Schema catalog - the registry of record layouts
// Built once, validated at registration, then shared read-only by documents.

use crate::column::{ColumnCodec, ColumnSchema};
use crate::error::{ApdError, Result};
use crate::record::{RecordKind, RecordSchema};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// FIELD NAMES USED BY THE DOCUMENT LOGIC
// ============================================================================

/// Header record fields read or rewritten by reconciliation and reports
pub mod header {
    pub const DECLARATION_TYPE: &str = "declaration_type";
    pub const IKA_BRANCH: &str = "ika_branch";
    pub const IKA_BRANCH_NAME: &str = "ika_branch_name";
    pub const EMPLOYER_NAME: &str = "employer_name";
    pub const EMPLOYER_REGISTRY_NO: &str = "employer_registry_no";
    pub const EMPLOYER_VAT_NO: &str = "employer_vat_no";
    pub const STREET: &str = "street";
    pub const STREET_NUMBER: &str = "street_number";
    pub const POSTAL_CODE: &str = "postal_code";
    pub const CITY: &str = "city";
    pub const PERIOD_FROM_MONTH: &str = "period_from_month";
    pub const PERIOD_FROM_YEAR: &str = "period_from_year";
    pub const PERIOD_TO_MONTH: &str = "period_to_month";
    pub const PERIOD_TO_YEAR: &str = "period_to_year";
    pub const TOTAL_INSURED_DAYS: &str = "total_insured_days";
    pub const TOTAL_EARNINGS: &str = "total_earnings";
    pub const TOTAL_CONTRIBUTIONS: &str = "total_contributions";
}

/// Employee record fields
pub mod employee {
    pub const INSURANCE_NO: &str = "insurance_no";
    pub const AMKA: &str = "amka";
    pub const SURNAME: &str = "surname";
    pub const FIRST_NAME: &str = "first_name";
}

/// Contribution record fields
pub mod contribution {
    pub const BRANCH_NO: &str = "branch_no";
    pub const ACTIVITY_CODE: &str = "activity_code";
    pub const FULL_TIME: &str = "full_time";
    pub const ALL_WORKDAYS: &str = "all_workdays";
    pub const PAYROLL_MONTH: &str = "payroll_month";
    pub const PAYROLL_YEAR: &str = "payroll_year";
    pub const EMPLOYMENT_FROM: &str = "employment_from";
    pub const EMPLOYMENT_TO: &str = "employment_to";
    pub const EARNINGS_TYPE: &str = "earnings_type";
    pub const INSURED_DAYS: &str = "insured_days";
    pub const EARNINGS: &str = "earnings";
    pub const PAYABLE_CONTRIBUTIONS: &str = "payable_contributions";
}

/// Earnings type that is reported separately
pub const CATEGORY_18: &str = "18";

// ============================================================================
// SCHEMA CATALOG
// ============================================================================

/// SchemaCatalog - record schemas keyed by prefix, in registration order
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: Vec<RecordSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        SchemaCatalog { schemas: Vec::new() }
    }

    /// Register a schema.
    ///
    /// Rejects a repeated prefix or type name, a prefix that is a prefix of
    /// another one (dispatch would be order-dependent), and a second schema
    /// for a structural kind (header, employee, contribution, terminator).
    pub fn register(&mut self, schema: RecordSchema) -> Result<()> {
        for existing in &self.schemas {
            if existing.prefix == schema.prefix {
                return Err(ApdError::DuplicateSchema(format!(
                    "record type with code={:?} already exists",
                    schema.prefix
                )));
            }
            if existing.name == schema.name {
                return Err(ApdError::DuplicateSchema(format!(
                    "record type with name={:?} already exists",
                    schema.name
                )));
            }
            if existing.prefix.starts_with(&schema.prefix) || schema.prefix.starts_with(&existing.prefix) {
                return Err(ApdError::AmbiguousPrefix {
                    first: existing.prefix.clone(),
                    second: schema.prefix.clone(),
                });
            }
            if existing.kind == schema.kind && schema.kind != RecordKind::Other {
                return Err(ApdError::DuplicateSchema(format!(
                    "a {} record type is already registered ({:?})",
                    schema.kind.name(),
                    existing.name
                )));
            }
        }
        debug!(name = %schema.name, prefix = %schema.prefix, width = schema.width(), "registered record type");
        self.schemas.push(schema);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_schema(mut self, schema: RecordSchema) -> Result<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Finish building; the catalog is read-only from here on
    pub fn into_shared(self) -> Arc<SchemaCatalog> {
        Arc::new(self)
    }

    /// Schema whose prefix starts `line`
    pub fn dispatch(&self, line: &str) -> Option<&RecordSchema> {
        self.schemas.iter().find(|s| line.starts_with(&s.prefix))
    }

    pub fn by_prefix(&self, prefix: &str) -> Option<&RecordSchema> {
        self.schemas.iter().find(|s| s.prefix == prefix)
    }

    pub fn by_kind(&self, kind: RecordKind) -> Option<&RecordSchema> {
        self.schemas.iter().find(|s| s.kind == kind)
    }

    pub fn has_kind(&self, kind: RecordKind) -> bool {
        self.by_kind(kind).is_some()
    }

    pub fn schemas(&self) -> &[RecordSchema] {
        &self.schemas
    }

    pub fn names(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name.as_str()).collect()
    }

    /// Kind of the schema registered under `prefix` (`Other` if unknown)
    pub fn kind_of(&self, prefix: &str) -> RecordKind {
        self.by_prefix(prefix).map(|s| s.kind).unwrap_or(RecordKind::Other)
    }

    pub fn describe(&self) -> String {
        let mut out = String::from("Document with template lines:\n");
        let body: Vec<String> = self.schemas.iter().map(|s| s.describe()).collect();
        out.push_str(&body.join("\n"));
        out
    }
}

// ============================================================================
// APD CATALOG
// ============================================================================

fn col(name: &str, label: &str, codec: ColumnCodec, width: usize) -> ColumnSchema {
    ColumnSchema::new(name, label, codec, width)
}

/// The declaration layout: header `1`, employee `2`, contribution `3`, terminator `EOF`.
pub fn apd_catalog() -> Result<Arc<SchemaCatalog>> {
    use ColumnCodec::*;

    let header_schema = RecordSchema::new(
        RecordKind::Header,
        "Header",
        "1",
        vec![
            col("file_count", "ΠΛΗΘΟΣ", IntegerAsText, 2),
            col("file_seq", "ΑΑ", IntegerAsText, 2),
            col("file_name", "ΟΝΟΜΑ ΑΡΧΕΙΟΥ", Text, 8),
            col("format_version", "ΕΚΔΟΣΗ", IntegerAsText, 2),
            col(header::DECLARATION_TYPE, "ΤΥΠΟΣ ΔΗΛΩΣΗΣ", IntegerAsText, 2),
            col(header::IKA_BRANCH, "ΥΠΟΚΑΤΑΣΤΗΜΑ ΙΚΑ", IntegerAsText, 3),
            col(header::IKA_BRANCH_NAME, "ΟΝΟΜΑΣΙΑ ΥΠΟΚ/ΤΟΣ ΙΚΑ", Text, 50),
            col(header::EMPLOYER_NAME, "ΕΠΩΝΥΜΙΑ ΕΡΓΟΔΟΤΗ", Text, 80),
            col("employer_first_name", "ΟΝΟΜΑ ΕΡΓΟΔΟΤΗ", Text, 30),
            col("employer_father_name", "ΟΝΟΜΑ ΠΑΤΡΟΣ ΕΡΓ/ΤΗ", Text, 30),
            col(header::EMPLOYER_REGISTRY_NO, "Α.Μ.Ε.", IntegerAsText, 10),
            col(header::EMPLOYER_VAT_NO, "Α.Φ.Μ.", IntegerAsText, 9),
            col(header::STREET, "ΟΔΟΣ", Text, 50),
            col(header::STREET_NUMBER, "ΑΡΙΘΜΟΣ", Text, 10),
            col(header::POSTAL_CODE, "Τ.Κ.", IntegerAsText, 5),
            col(header::CITY, "ΠΟΛΗ", Text, 30),
            col(header::PERIOD_FROM_MONTH, "ΑΠΟ ΜΗΝΑ", IntegerAsText, 2),
            col(header::PERIOD_FROM_YEAR, "ΑΠΟ ΕΤΟΣ", IntegerAsText, 4),
            col(header::PERIOD_TO_MONTH, "ΕΩΣ ΜΗΝΑ", IntegerAsText, 2),
            col(header::PERIOD_TO_YEAR, "ΕΩΣ ΕΤΟΣ", IntegerAsText, 4),
            col(header::TOTAL_INSURED_DAYS, "ΣΥΝΟΛΟ ΗΜΕΡΩΝ ΑΣΦΑΛΙΣΗΣ", Integer, 8),
            col(header::TOTAL_EARNINGS, "ΣΥΝΟΛΟ ΑΠΟΔΟΧΩΝ", Amount, 12),
            col(header::TOTAL_CONTRIBUTIONS, "ΣΥΝΟΛΟ ΕΙΣΦΟΡΩΝ", Amount, 12),
            col("submission_date", "ΗΜ/ΝΙΑ ΥΠΟΒΟΛΗΣ", Date, 8),
            col("cessation_date", "ΗΜ/ΝΙΑ ΠΑΥΣΗΣ ΕΡΓΑΣΙΩΝ", Date, 8),
            col("filler", "ΚΕΝΑ", Text, 30),
        ],
    )?;

    let employee_schema = RecordSchema::new(
        RecordKind::Employee,
        "Employee",
        "2",
        vec![
            col(employee::INSURANCE_NO, "ΑΡ.ΜΗΤΡΩΟΥ ΑΣΦ.", IntegerAsText, 9),
            col(employee::AMKA, "Α.Μ.Κ.Α.", IntegerAsText, 11),
            col(employee::SURNAME, "ΕΠΩΝΥΜΟ", Text, 50),
            col(employee::FIRST_NAME, "ΟΝΟΜΑ", Text, 30),
            col("father_name", "ΟΝΟΜΑ ΠΑΤΡΟΣ", Text, 30),
            col("mother_name", "ΟΝΟΜΑ ΜΗΤΡΟΣ", Text, 30),
            col("birth_date", "ΗΜ/ΝΙΑ ΓΕΝΝΗΣΗΣ", Date, 8),
            col("vat_no", "Α.Φ.Μ.", IntegerAsText, 9),
        ],
    )?;

    let contribution_schema = RecordSchema::new(
        RecordKind::Contribution,
        "Contribution",
        "3",
        vec![
            col(contribution::BRANCH_NO, "ΑΡ.ΠΑΡΑΡΤ.", IntegerAsText, 4),
            col(contribution::ACTIVITY_CODE, "ΚΑΔ", IntegerAsText, 4),
            col(contribution::FULL_TIME, "ΠΛΗΡΕΣ ΩΡΑΡΙΟ", IntegerAsText, 1),
            col(contribution::ALL_WORKDAYS, "ΟΛΕΣ ΕΡΓΑΣΙΜΕΣ", IntegerAsText, 1),
            col("sundays", "ΚΥΡΙΑΚΕΣ", Integer, 1),
            col("specialty_code", "ΚΩΔ.ΕΙΔΙΚΟΤΗΤΑΣ", IntegerAsText, 6),
            col("special_case", "ΕΙΔ.ΠΕΡΙΠΤ.ΑΣΦΑΛ.", IntegerOrBlank, 2),
            col("coverage_package", "ΠΑΚΕΤΟ ΚΑΛΥΨΗΣ", Integer, 4),
            col(contribution::PAYROLL_MONTH, "ΜΙΣΘ.ΠΕΡ.ΜΗΝΑΣ", IntegerAsText, 2),
            col(contribution::PAYROLL_YEAR, "ΜΙΣΘ.ΠΕΡ.ΕΤΟΣ", IntegerAsText, 4),
            col(contribution::EMPLOYMENT_FROM, "ΑΠΟ ΗΜ/ΝΙΑ ΑΠΑΣΧ.", Date, 8),
            col(contribution::EMPLOYMENT_TO, "ΕΩΣ ΗΜ/ΝΙΑ ΑΠΑΣΧ.", Date, 8),
            col(contribution::EARNINGS_TYPE, "ΤΥΠΟΣ ΑΠΟΔΟΧΩΝ", IntegerAsText, 2),
            col(contribution::INSURED_DAYS, "ΗΜΕΡΕΣ ΑΣΦΑΛΙΣΗΣ", Integer, 3),
            col("daily_wage", "ΗΜΕΡΟΜΙΣΘΙΟ", Amount, 10),
            col(contribution::EARNINGS, "ΑΠΟΔΟΧΕΣ", Amount, 10),
            col("employee_contribution", "ΕΙΣΦΟΡΕΣ ΑΣΦΑΛΙΣΜ.", Amount, 10),
            col("employer_contribution", "ΕΙΣΦΟΡΕΣ ΕΡΓΟΔΟΤΗ", Amount, 10),
            col("total_contribution", "ΣΥΝΟΛΙΚΕΣ ΕΙΣΦΟΡΕΣ", Amount, 11),
            col("employee_subsidy_amount", "ΕΠΙΔΟΤ.ΑΣΦΑΛ.(ΠΟΣΟ)", Amount, 10),
            col("employer_subsidy_rate", "ΕΠΙΔΟΤ.ΕΡΓΟΔ.(%)", Amount, 5),
            col("employer_subsidy_amount", "ΕΠΙΔΟΤ.ΕΡΓΟΔ.(ΠΟΣΟ)", Amount, 10),
            col(contribution::PAYABLE_CONTRIBUTIONS, "ΚΑΤΑΒΛ.ΕΙΣΦΟΡΕΣ", Amount, 11),
        ],
    )?;

    let terminator = RecordSchema::new(RecordKind::Terminator, "Terminator", "EOF", Vec::new())?;

    Ok(SchemaCatalog::new()
        .with_schema(header_schema)?
        .with_schema(employee_schema)?
        .with_schema(contribution_schema)?
        .with_schema(terminator)?
        .into_shared())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn other(name: &str, prefix: &str) -> RecordSchema {
        RecordSchema::new(RecordKind::Other, name, prefix, Vec::new()).unwrap()
    }

    #[test]
    fn test_apd_catalog_widths() {
        let catalog = apd_catalog().unwrap();
        assert_eq!(catalog.names(), vec!["Header", "Employee", "Contribution", "Terminator"]);
        assert_eq!(catalog.by_prefix("1").unwrap().width(), 414);
        assert_eq!(catalog.by_prefix("2").unwrap().width(), 178);
        assert_eq!(catalog.by_prefix("3").unwrap().width(), 138);
        assert_eq!(catalog.by_prefix("EOF").unwrap().width(), 3);
    }

    #[test]
    fn test_dispatch_by_prefix() {
        let catalog = apd_catalog().unwrap();
        assert_eq!(catalog.dispatch("3000100").unwrap().kind, RecordKind::Contribution);
        assert_eq!(catalog.dispatch("EOF").unwrap().kind, RecordKind::Terminator);
        assert!(catalog.dispatch("9xyz").is_none());
        assert_eq!(catalog.kind_of("2"), RecordKind::Employee);
        assert_eq!(catalog.kind_of("Z"), RecordKind::Other);
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let mut catalog = SchemaCatalog::new();
        catalog.register(other("A", "7")).unwrap();
        let err = catalog.register(other("B", "7")).unwrap_err();
        assert!(matches!(err, ApdError::DuplicateSchema(_)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut catalog = SchemaCatalog::new();
        catalog.register(other("A", "7")).unwrap();
        let err = catalog.register(other("A", "8")).unwrap_err();
        assert!(matches!(err, ApdError::DuplicateSchema(_)));
    }

    #[test]
    fn test_mutually_prefixing_rejected() {
        let mut catalog = SchemaCatalog::new();
        catalog.register(other("A", "EO")).unwrap();
        let err = catalog.register(other("B", "EOF")).unwrap_err();
        assert!(matches!(err, ApdError::AmbiguousPrefix { .. }));
    }

    #[test]
    fn test_second_structural_kind_rejected() {
        let mut catalog = SchemaCatalog::new();
        catalog
            .register(RecordSchema::new(RecordKind::Employee, "E1", "2", Vec::new()).unwrap())
            .unwrap();
        let err = catalog
            .register(RecordSchema::new(RecordKind::Employee, "E2", "4", Vec::new()).unwrap())
            .unwrap_err();
        assert!(matches!(err, ApdError::DuplicateSchema(_)));
    }

    #[test]
    fn test_independent_catalogs() {
        let a = SchemaCatalog::new().with_schema(other("A", "7")).unwrap();
        let b = SchemaCatalog::new().with_schema(other("A", "7")).unwrap();
        assert_eq!(a.names(), b.names());
    }

    #[test]
    fn test_describe_lists_columns() {
        let catalog = apd_catalog().unwrap();
        let text = catalog.describe();
        assert!(text.starts_with("Document with template lines:"));
        assert!(text.contains("LineType \"Contribution\", lineSize=138"));
        assert!(text.contains("payable_contributions"));
    }
}
