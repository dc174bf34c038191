// 🧩 Field values - the typed contents of one decoded column

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// FieldValue - tagged value held by a record field
///
/// Amounts always carry exactly 2 fractional digits; `Date(None)` is a blank date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Amount(Decimal),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// Variant name, used in type mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Amount(_) => "amount",
            FieldValue::Date(_) => "date",
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Amount from integer cents (e.g. 1230 → 12.30)
    pub fn cents(cents: i64) -> Self {
        FieldValue::Amount(Decimal::new(cents, 2))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Option<NaiveDate>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Amount(d) => write!(f, "{:.2}", d),
            FieldValue::Date(Some(d)) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Date(None) => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Amount(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(FieldValue::cents(1230).to_string(), "12.30");
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        let d = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();
        assert_eq!(FieldValue::from(d).to_string(), "2020-03-15");
        assert_eq!(FieldValue::Date(None).to_string(), "");
    }

    #[test]
    fn test_accessors_by_variant() {
        let v = FieldValue::text("0218");
        assert_eq!(v.as_text(), Some("0218"));
        assert_eq!(v.as_integer(), None);
        assert_eq!(v.kind(), "text");
        assert_eq!(FieldValue::cents(5).as_amount(), Some(Decimal::new(5, 2)));
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_string(&FieldValue::Integer(7)).unwrap();
        assert_eq!(json, r#"{"type":"integer","value":7}"#);
    }
}
