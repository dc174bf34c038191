// 🇬🇷 Greek locale helpers
// Number and date display for reports, and accent-free upper-casing for the wire.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount the Greek way: `.` thousands separator, `,` decimal separator,
/// always 2 fractional digits (`1234.5` → `1.234,50`).
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{},{}", grouped, frac_part)
    } else {
        format!("{},{}", grouped, frac_part)
    }
}

/// `DD/MM/YYYY`, or empty for a blank date
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => String::new(),
    }
}

/// Upper-case text, dropping Greek accents (tonos, dialytika).
///
/// The declaration format expects names in plain capitals: `αργυρίου` → `ΑΡΓΥΡΙΟΥ`.
pub fn greek_uppercase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            // combining acute / diaeresis / greek tonos
            '\u{0301}' | '\u{0308}' | '\u{0344}' => continue,
            'ΐ' => out.push('Ι'),
            'ΰ' => out.push('Υ'),
            _ => {
                for up in ch.to_uppercase() {
                    out.push(strip_accent(up));
                }
            }
        }
    }
    out
}

fn strip_accent(ch: char) -> char {
    match ch {
        'Ά' => 'Α',
        'Έ' => 'Ε',
        'Ή' => 'Η',
        'Ί' | 'Ϊ' => 'Ι',
        'Ό' => 'Ο',
        'Ύ' | 'Ϋ' => 'Υ',
        'Ώ' => 'Ω',
        other => other,
    }
}

/// `NAI` / `OXI` for a `0`/`1` flag field (anything other than `0` is yes)
pub fn yes_no(flag: &str) -> &'static str {
    if flag.trim() == "0" {
        "OXI"
    } else {
        "NAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(Decimal::new(123456789, 2)), "1.234.567,89");
        assert_eq!(format_amount(Decimal::new(123450, 2)), "1.234,50");
        assert_eq!(format_amount(Decimal::new(99999, 2)), "999,99");
        assert_eq!(format_amount(Decimal::ZERO), "0,00");
        assert_eq!(format_amount(Decimal::new(5, 2)), "0,05");
    }

    #[test]
    fn test_format_amount_negative() {
        assert_eq!(format_amount(Decimal::new(-100050, 2)), "-1.000,50");
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 5).unwrap();
        assert_eq!(format_date(Some(d)), "05/03/2020");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_greek_uppercase_strips_accents() {
        assert_eq!(greek_uppercase("αργυρίου"), "ΑΡΓΥΡΙΟΥ");
        assert_eq!(greek_uppercase("Άρης Ρούσσος"), "ΑΡΗΣ ΡΟΥΣΣΟΣ");
        assert_eq!(greek_uppercase("ϊϋΐΰ"), "ΙΥΙΥ");
        assert_eq!(greek_uppercase("abc 12"), "ABC 12");
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no("0"), "OXI");
        assert_eq!(yes_no("1"), "NAI");
    }
}
