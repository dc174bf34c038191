// 📏 Column codecs - one per semantic column kind
// Each codec turns a FieldValue into an exact-width text slice and back,
// and knows how to show the value in a Greek report.

use crate::error::{ApdError, Result};
use crate::locale;
use crate::value::FieldValue;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

// ============================================================================
// CODECS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnCodec {
    /// Left-justified, space-padded
    Text,
    /// As `Text`, upper-cased (Greek accents dropped) before encoding
    TextUppercase,
    /// ISO date in memory, `DDMMYYYY` on the wire; blank stays blank
    Date,
    /// Money with 2 implied decimals, zero-padded digits on the wire
    Amount,
    /// Zero-padded integer
    Integer,
    /// Zero-padded integer, shown blank when zero
    IntegerOrBlank,
    /// Zero-padded digit string whose identity is textual (codes, registry numbers)
    IntegerAsText,
}

impl ColumnCodec {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnCodec::Text => "text",
            ColumnCodec::TextUppercase => "text-upper",
            ColumnCodec::Date => "date",
            ColumnCodec::Amount => "amount",
            ColumnCodec::Integer => "integer",
            ColumnCodec::IntegerOrBlank => "integer-or-blank",
            ColumnCodec::IntegerAsText => "integer-as-text",
        }
    }

    /// Render `value` into exactly `width` characters.
    pub fn encode(&self, value: &FieldValue, width: usize) -> Result<String> {
        match self {
            ColumnCodec::Text => fill_back_spaces(self.expect_text(value)?, width),
            ColumnCodec::TextUppercase => {
                fill_back_spaces(&locale::greek_uppercase(self.expect_text(value)?), width)
            }
            ColumnCodec::Date => {
                let date = match value {
                    FieldValue::Date(d) => *d,
                    FieldValue::Text(s) if is_raw_date(s) => return fill_back_spaces(s, width),
                    FieldValue::Text(s) => parse_iso_date(s)?,
                    other => return Err(mismatch("date", other)),
                };
                match date {
                    Some(d) => fill_back_spaces(&d.format("%d%m%Y").to_string(), width),
                    None => fill_back_spaces("", width),
                }
            }
            ColumnCodec::Amount => {
                let amount = match value {
                    FieldValue::Amount(d) => *d,
                    FieldValue::Integer(n) => Decimal::from(*n),
                    other => return Err(mismatch("amount", other)),
                };
                fill_front_zeros(&amount_digits(amount)?, width)
            }
            ColumnCodec::Integer | ColumnCodec::IntegerOrBlank => {
                let n = value.as_integer().ok_or_else(|| mismatch("integer", value))?;
                if n < 0 {
                    return Err(ApdError::malformed(n.to_string(), "negative integers have no wire form"));
                }
                fill_front_zeros(&n.to_string(), width)
            }
            ColumnCodec::IntegerAsText => {
                let raw = match value {
                    FieldValue::Text(s) => s.trim().to_string(),
                    FieldValue::Integer(n) if *n >= 0 => n.to_string(),
                    other => return Err(mismatch("text", other)),
                };
                if raw.is_empty() {
                    return Ok(" ".repeat(width));
                }
                if !raw.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ApdError::malformed(raw, "expected digits only"));
                }
                let significant = raw.trim_start_matches('0');
                let digits = if significant.is_empty() { "0" } else { significant };
                fill_front_zeros(digits, width)
            }
        }
    }

    /// Decode one slice. The caller guarantees the slice has the column width.
    pub fn decode(&self, slice: &str) -> Result<FieldValue> {
        match self {
            ColumnCodec::Text | ColumnCodec::TextUppercase => {
                Ok(FieldValue::Text(slice.trim().to_string()))
            }
            ColumnCodec::Date => {
                if slice.trim().is_empty() {
                    return Ok(FieldValue::Date(None));
                }
                if slice.chars().count() != 8 || !slice.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ApdError::malformed(slice, "date must be blank or DDMMYYYY"));
                }
                // digits that are not a calendar day (e.g. `00000000`) are kept verbatim
                match NaiveDate::parse_from_str(slice, "%d%m%Y") {
                    Ok(d) => Ok(FieldValue::Date(Some(d))),
                    Err(_) => Ok(FieldValue::Text(slice.to_string())),
                }
            }
            ColumnCodec::Amount => {
                let cents = parse_digits(slice)?;
                let cents = i64::try_from(cents)
                    .map_err(|_| ApdError::malformed(slice, "amount out of range"))?;
                Ok(FieldValue::Amount(Decimal::new(cents, 2)))
            }
            ColumnCodec::Integer | ColumnCodec::IntegerOrBlank => {
                let n = parse_digits(slice.trim())?;
                let n = i64::try_from(n).map_err(|_| ApdError::malformed(slice, "integer out of range"))?;
                Ok(FieldValue::Integer(n))
            }
            ColumnCodec::IntegerAsText => {
                let trimmed = slice.trim();
                if !trimmed.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ApdError::malformed(slice, "expected digits only"));
                }
                Ok(FieldValue::Text(trimmed.to_string()))
            }
        }
    }

    /// Localized display form. Never fails; a value of an unexpected variant is shown as-is.
    pub fn display(&self, value: &FieldValue) -> String {
        match (self, value) {
            (ColumnCodec::Amount, FieldValue::Amount(d)) => locale::format_amount(*d),
            (ColumnCodec::Date, FieldValue::Date(d)) => locale::format_date(*d),
            (ColumnCodec::Date, FieldValue::Text(s)) if is_raw_date(s) => {
                format!("{}/{}/{}", &s[0..2], &s[2..4], &s[4..8])
            }
            (ColumnCodec::Date, FieldValue::Text(s)) => {
                locale::format_date(parse_iso_date(s).ok().flatten())
            }
            (ColumnCodec::IntegerOrBlank, FieldValue::Integer(0)) => String::new(),
            (_, FieldValue::Text(s)) => s.trim().to_string(),
            (_, other) => other.to_string(),
        }
    }

    fn expect_text<'a>(&self, value: &'a FieldValue) -> Result<&'a str> {
        value.as_text().ok_or_else(|| mismatch("text", value))
    }
}

fn mismatch(expected: &'static str, found: &FieldValue) -> ApdError {
    ApdError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

// ============================================================================
// PADDING HELPERS
// ============================================================================

/// Right-justify with `0`, failing instead of truncating
pub fn fill_front_zeros(text: &str, width: usize) -> Result<String> {
    let len = text.chars().count();
    if len > width {
        return Err(ApdError::ValueTooWide {
            width,
            value: text.to_string(),
        });
    }
    Ok(format!("{}{}", "0".repeat(width - len), text))
}

/// Left-justify with spaces, failing instead of truncating
pub fn fill_back_spaces(text: &str, width: usize) -> Result<String> {
    let len = text.chars().count();
    if len > width {
        return Err(ApdError::ValueTooWide {
            width,
            value: text.to_string(),
        });
    }
    Ok(format!("{}{}", text, " ".repeat(width - len)))
}

fn parse_digits(slice: &str) -> Result<u64> {
    if slice.is_empty() || !slice.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApdError::malformed(slice, "expected digits only"));
    }
    slice
        .parse::<u64>()
        .map_err(|e| ApdError::malformed(slice, e.to_string()))
}

/// `12.3` → `"1230"`
fn amount_digits(amount: Decimal) -> Result<String> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ApdError::malformed(amount.to_string(), "negative amounts have no wire form"));
    }
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    Ok(cents.mantissa().abs().to_string())
}

/// `DDMMYYYY` digits as read from the wire
fn is_raw_date(text: &str) -> bool {
    text.len() == 8 && text.chars().all(|c| c.is_ascii_digit())
}

fn parse_iso_date(text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ApdError::malformed(text, "expected an ISO date (YYYY-MM-DD)"))
}

// ============================================================================
// COLUMN SCHEMA
// ============================================================================

/// ColumnSchema - a named, labelled codec with a fixed width
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub label: String,
    pub codec: ColumnCodec,
    pub width: usize,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, label: impl Into<String>, codec: ColumnCodec, width: usize) -> Self {
        ColumnSchema {
            name: name.into(),
            label: label.into(),
            codec,
            width,
        }
    }

    pub fn encode(&self, value: &FieldValue) -> Result<String> {
        self.codec.encode(value, self.width)
    }

    pub fn decode(&self, slice: &str) -> Result<FieldValue> {
        self.codec.decode(slice)
    }

    /// `label` padded to 25 columns, then the localized value
    pub fn labelled(&self, value: &FieldValue) -> String {
        format!("{:25} {}", self.label, self.codec.display(value))
    }

    pub fn describe(&self) -> String {
        format!("{:30} {:4} {}", self.name, self.width, self.codec.name())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> FieldValue {
        FieldValue::Date(NaiveDate::from_ymd_opt(y, m, d))
    }

    #[test]
    fn test_text_pads_and_trims() {
        let c = ColumnCodec::Text;
        assert_eq!(c.encode(&"CSL01".into(), 8).unwrap(), "CSL01   ");
        assert_eq!(c.decode("  CSL01   ").unwrap(), FieldValue::text("CSL01"));
    }

    #[test]
    fn test_text_uppercase() {
        let c = ColumnCodec::TextUppercase;
        assert_eq!(c.encode(&"αργυρίου".into(), 10).unwrap(), "ΑΡΓΥΡΙΟΥ  ");
    }

    #[test]
    fn test_text_too_wide_fails() {
        let err = ColumnCodec::Text.encode(&"ABCDEF".into(), 5).unwrap_err();
        assert!(matches!(err, ApdError::ValueTooWide { width: 5, .. }));
    }

    #[test]
    fn test_date_round_trip() {
        let c = ColumnCodec::Date;
        let encoded = c.encode(&date(2020, 3, 15), 8).unwrap();
        assert_eq!(encoded, "15032020");
        assert_eq!(c.decode(&encoded).unwrap(), date(2020, 3, 15));
        assert_eq!(c.display(&date(2020, 3, 15)), "15/03/2020");
    }

    #[test]
    fn test_date_accepts_iso_text() {
        let c = ColumnCodec::Date;
        assert_eq!(c.encode(&"2020-03-15".into(), 8).unwrap(), "15032020");
        assert!(c.encode(&"15/03/2020".into(), 8).is_err());
    }

    #[test]
    fn test_date_blank_both_ways() {
        let c = ColumnCodec::Date;
        assert_eq!(c.encode(&FieldValue::Date(None), 8).unwrap(), "        ");
        assert_eq!(c.encode(&"".into(), 8).unwrap(), "        ");
        assert_eq!(c.decode("        ").unwrap(), FieldValue::Date(None));
        assert_eq!(c.display(&FieldValue::Date(None)), "");
    }

    #[test]
    fn test_date_malformed() {
        let c = ColumnCodec::Date;
        assert!(matches!(c.decode("1503202A").unwrap_err(), ApdError::MalformedValue { .. }));
        assert!(matches!(c.decode("1503 020").unwrap_err(), ApdError::MalformedValue { .. }));
    }

    #[test]
    fn test_date_non_calendar_digits_kept_raw() {
        let c = ColumnCodec::Date;
        for raw in ["00000000", "31022020"] {
            let value = c.decode(raw).unwrap();
            assert_eq!(value, FieldValue::text(raw));
            assert_eq!(c.encode(&value, 8).unwrap(), raw);
        }
        assert_eq!(c.display(&FieldValue::text("00000000")), "00/00/0000");
    }

    #[test]
    fn test_amount_codec() {
        let c = ColumnCodec::Amount;
        let v = FieldValue::Amount(Decimal::new(123, 1)); // 12.3
        let encoded = c.encode(&v, 10).unwrap();
        assert_eq!(encoded, "0000001230");
        assert_eq!(c.decode(&encoded).unwrap(), FieldValue::cents(1230));
        assert_eq!(c.encode(&FieldValue::Amount(Decimal::ZERO), 10).unwrap(), "0000000000");
        assert_eq!(c.decode("000000005").unwrap(), FieldValue::cents(5));
    }

    #[test]
    fn test_amount_display_greek() {
        let c = ColumnCodec::Amount;
        assert_eq!(c.display(&FieldValue::cents(123456)), "1.234,56");
    }

    #[test]
    fn test_amount_rejects_bad_input() {
        let c = ColumnCodec::Amount;
        assert!(c.decode("00001 230").is_err());
        assert!(c.encode(&FieldValue::cents(-100), 10).is_err());
        assert!(matches!(
            c.encode(&FieldValue::cents(12345678901), 10).unwrap_err(),
            ApdError::ValueTooWide { .. }
        ));
    }

    #[test]
    fn test_integer_codecs() {
        assert_eq!(ColumnCodec::Integer.encode(&FieldValue::Integer(25), 3).unwrap(), "025");
        assert_eq!(ColumnCodec::Integer.decode("025").unwrap(), FieldValue::Integer(25));
        assert_eq!(ColumnCodec::Integer.display(&FieldValue::Integer(0)), "0");
        assert_eq!(ColumnCodec::IntegerOrBlank.display(&FieldValue::Integer(0)), "");
        assert_eq!(ColumnCodec::IntegerOrBlank.display(&FieldValue::Integer(3)), "3");
        assert!(ColumnCodec::Integer.encode(&FieldValue::Integer(1000), 3).is_err());
    }

    #[test]
    fn test_integer_as_text_keeps_identity() {
        let c = ColumnCodec::IntegerAsText;
        assert_eq!(c.decode("0218").unwrap(), FieldValue::text("0218"));
        assert_eq!(c.encode(&"0218".into(), 4).unwrap(), "0218");
        assert_eq!(c.encode(&"218".into(), 4).unwrap(), "0218");
        assert_eq!(c.encode(&"0".into(), 2).unwrap(), "00");
        assert!(c.encode(&"12A".into(), 4).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let err = ColumnCodec::Amount.encode(&"12,30".into(), 10).unwrap_err();
        assert!(matches!(err, ApdError::TypeMismatch { expected: "amount", found: "text" }));
    }

    #[test]
    fn test_encode_is_stable_through_decode() {
        let cases = [
            (ColumnCodec::Text, FieldValue::text("ΠΑΡΟΥ"), 10),
            (ColumnCodec::Amount, FieldValue::cents(98765), 12),
            (ColumnCodec::IntegerAsText, FieldValue::text("7"), 3),
            (ColumnCodec::IntegerOrBlank, FieldValue::Integer(0), 2),
            (ColumnCodec::Date, date(1999, 12, 31), 8),
        ];
        for (codec, value, width) in cases {
            let once = codec.encode(&value, width).unwrap();
            assert_eq!(once.chars().count(), width);
            let twice = codec.encode(&codec.decode(&once).unwrap(), width).unwrap();
            assert_eq!(once, twice, "{:?} not stable", codec);
        }
    }

    #[test]
    fn test_column_schema_labelled() {
        let col = ColumnSchema::new("insured_days", "ΗΜΕΡΕΣ ΑΣΦΑΛΙΣΗΣ", ColumnCodec::Integer, 3);
        assert_eq!(col.labelled(&FieldValue::Integer(25)), format!("{:25} 25", "ΗΜΕΡΕΣ ΑΣΦΑΛΙΣΗΣ"));
    }
}
