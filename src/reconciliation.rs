// ⚖️ Reconciliation - header totals vs. detail sums
//
// The header declares three totals:
//   total_earnings      = Σ earnings               over contribution lines
//   total_contributions = Σ payable_contributions  over contribution lines
//   total_insured_days  = Σ insured_days           over contribution lines
//
// Money is accumulated as Decimal (exact cents), never as binary floats.

use crate::catalog::{contribution, header, CATEGORY_18};
use crate::error::Result;
use crate::locale;
use crate::record::Record;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub amount: Decimal,
    pub contributions: Decimal,
    pub insured_days: i64,
}

impl Totals {
    /// Add one contribution record
    pub fn add(&mut self, record: &Record) -> Result<()> {
        self.amount += record.amount(contribution::EARNINGS)?;
        self.contributions += record.amount(contribution::PAYABLE_CONTRIBUTIONS)?;
        self.insured_days += record.integer(contribution::INSURED_DAYS)?;
        Ok(())
    }

    /// Sum over contribution records, money rounded to 2 places
    pub fn from_contributions<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<Totals> {
        let mut totals = Totals::default();
        for record in records {
            totals.add(record)?;
        }
        Ok(totals.rounded())
    }

    /// Totals as declared in the header record
    pub fn declared_by(header_record: &Record) -> Result<Totals> {
        Ok(Totals {
            amount: header_record.amount(header::TOTAL_EARNINGS)?,
            contributions: header_record.amount(header::TOTAL_CONTRIBUTIONS)?,
            insured_days: header_record.integer(header::TOTAL_INSURED_DAYS)?,
        })
    }

    pub fn rounded(self) -> Totals {
        Totals {
            amount: round2(self.amount),
            contributions: round2(self.contributions),
            insured_days: self.insured_days,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero() && self.contributions.is_zero() && self.insured_days == 0
    }
}

fn round2(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(2);
    v
}

/// Contribution totals split by earnings type `18` vs. everything else
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub category_18: Totals,
    pub other: Totals,
}

impl CategoryTotals {
    pub fn from_contributions<'a>(records: impl IntoIterator<Item = &'a Record>) -> Result<CategoryTotals> {
        let mut totals = CategoryTotals::default();
        for record in records {
            if is_category_18(record)? {
                totals.category_18.add(record)?;
            } else {
                totals.other.add(record)?;
            }
        }
        Ok(CategoryTotals {
            category_18: totals.category_18.rounded(),
            other: totals.other.rounded(),
        })
    }

    /// Days / amount / contributions in Greek display form; zero days show blank
    pub fn display_row(totals: &Totals) -> [String; 3] {
        let days = if totals.insured_days == 0 {
            String::new()
        } else {
            totals.insured_days.to_string()
        };
        [
            days,
            locale::format_amount(totals.amount),
            locale::format_amount(totals.contributions),
        ]
    }
}

pub fn is_category_18(record: &Record) -> Result<bool> {
    Ok(record.text(contribution::EARNINGS_TYPE)?.trim() == CATEGORY_18)
}

// ============================================================================
// DISCREPANCIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalsField {
    Earnings,
    Contributions,
    InsuredDays,
}

impl TotalsField {
    /// Header column holding this total
    pub fn header_field(&self) -> &'static str {
        match self {
            TotalsField::Earnings => header::TOTAL_EARNINGS,
            TotalsField::Contributions => header::TOTAL_CONTRIBUTIONS,
            TotalsField::InsuredDays => header::TOTAL_INSURED_DAYS,
        }
    }
}

/// One header total that disagrees with the detail lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: TotalsField,
    pub declared: String,
    pub computed: String,
}

impl Discrepancy {
    pub fn message(&self) -> String {
        let name = self.field.header_field();
        format!(
            "header {} ({}) != computed {} ({})",
            name, self.declared, name, self.computed
        )
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Compare declared totals against computed ones, in header column order
pub fn compare(declared: &Totals, computed: &Totals) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();

    if declared.insured_days != computed.insured_days {
        discrepancies.push(Discrepancy {
            field: TotalsField::InsuredDays,
            declared: declared.insured_days.to_string(),
            computed: computed.insured_days.to_string(),
        });
    }
    if declared.amount != computed.amount {
        discrepancies.push(Discrepancy {
            field: TotalsField::Earnings,
            declared: format!("{:.2}", declared.amount),
            computed: format!("{:.2}", computed.amount),
        });
    }
    if declared.contributions != computed.contributions {
        discrepancies.push(Discrepancy {
            field: TotalsField::Contributions,
            declared: format!("{:.2}", declared.contributions),
            computed: format!("{:.2}", computed.contributions),
        });
    }

    discrepancies
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub declared: Totals,
    pub computed: Totals,
    pub by_category: CategoryTotals,
    pub discrepancies: Vec<Discrepancy>,
    pub employee_count: usize,
    pub contribution_count: usize,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn is_balanced(&self) -> bool {
        self.discrepancies.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} employees, {} contribution lines: days {} (declared {}), earnings {} (declared {}), contributions {} (declared {}) - {}",
            self.employee_count,
            self.contribution_count,
            self.computed.insured_days,
            self.declared.insured_days,
            locale::format_amount(self.computed.amount),
            locale::format_amount(self.declared.amount),
            locale::format_amount(self.computed.contributions),
            locale::format_amount(self.declared.contributions),
            if self.is_balanced() {
                "balanced".to_string()
            } else {
                format!("{} discrepancies", self.discrepancies.len())
            }
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(amount_cents: i64, contrib_cents: i64, days: i64) -> Totals {
        Totals {
            amount: Decimal::new(amount_cents, 2),
            contributions: Decimal::new(contrib_cents, 2),
            insured_days: days,
        }
    }

    #[test]
    fn test_compare_balanced() {
        let t = totals(100000, 25000, 25);
        assert!(compare(&t, &t).is_empty());
    }

    #[test]
    fn test_compare_reports_only_disagreeing_fields() {
        let declared = totals(100000, 25000, 26);
        let computed = totals(100000, 24999, 25);
        let found = compare(&declared, &computed);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].field, TotalsField::InsuredDays);
        assert_eq!(found[1].field, TotalsField::Contributions);
        assert_eq!(
            found[1].message(),
            "header total_contributions (250.00) != computed total_contributions (249.99)"
        );
    }

    #[test]
    fn test_decimal_sum_has_no_drift() {
        // 0.10 added 1000 times is exactly 100.00
        let mut t = Totals::default();
        for _ in 0..1000 {
            t.amount += Decimal::new(10, 2);
        }
        assert_eq!(t.rounded().amount, Decimal::new(10000, 2));
    }

    #[test]
    fn test_display_row_blanks_zero_days() {
        let row = CategoryTotals::display_row(&totals(123456, 0, 0));
        assert_eq!(row, [String::new(), "1.234,56".to_string(), "0,00".to_string()]);
    }
}
