// Utility helpers for parsing and number formatting.
//
// Every numeric boundary of the normalizer goes through this module so that a
// bad cell always turns into a default instead of an error.
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;

/// `YYYY-MM-DD` anywhere in a file name (compiled once)
static FILENAME_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("Hardcoded regex pattern should be valid")
});

/// A number whose integer part uses well-formed `,` thousands groups
static THOUSANDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$")
        .expect("Hardcoded regex pattern should be valid")
});

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in billing exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional cells.
/// - Trims whitespace.
/// - Strips `,` only when it forms thousands groups (`1,234.5`); any other
///   comma (`2,5`, `1,2,3`) makes the value non-numeric.
/// - Returns `None` for empty cells, text, `NaN` and infinities.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = if s.contains(',') {
        if !THOUSANDS_RE.is_match(s) {
            return None;
        }
        s.replace(',', "").parse::<f64>()
    } else {
        s.parse::<f64>()
    };
    parsed.ok().filter(|v| v.is_finite())
}

/// Parse-or-default used at every numeric field of a billing row.
pub fn parse_number_or_default(s: Option<&str>, default: f64) -> f64 {
    parse_f64_safe(s).unwrap_or(default)
}

/// Round to a fixed number of decimal places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Find the first `YYYY-MM-DD` shaped substring in a file name.
///
/// Only the digit/dash shape is checked, so `2024-13-45` still matches.
pub fn extract_date(filename: &str) -> Option<&str> {
    FILENAME_DATE_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimals with locale-aware thousands separators
    // (e.g. `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_money(n: f64) -> String {
    format!("${}", format_number(n, 2))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64_safe() {
        assert_eq!(parse_f64_safe(Some(" 2.5 ")), Some(2.5));
        assert_eq!(parse_f64_safe(Some("1,024")), Some(1024.0));
        assert_eq!(parse_f64_safe(Some("1,234,567.25")), Some(1234567.25));
        assert_eq!(parse_f64_safe(Some("2,5")), None);
        assert_eq!(parse_f64_safe(Some("1,2,3")), None);
        assert_eq!(parse_f64_safe(Some("12,34.5")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn test_parse_number_or_default() {
        assert_eq!(parse_number_or_default(Some("65536"), 0.0), 65536.0);
        assert_eq!(parse_number_or_default(Some("abc"), 0.0), 0.0);
        assert_eq!(parse_number_or_default(None, 7.0), 7.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1234.5678, 2), 1234.57);
        assert_eq!(round_to(0.004, 2), 0.0);
        assert_eq!(round_to(21900.0, 2), 21900.0);
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(extract_date("acme_2024-03-01_usage.csv"), Some("2024-03-01"));
        assert_eq!(extract_date("2023-12-31.csv"), Some("2023-12-31"));
        assert_eq!(extract_date("usage-march.csv"), None);
        assert_eq!(extract_date("2024-3-01.csv"), None);
        assert_eq!(extract_date("short"), None);
        assert_eq!(extract_date("été_2024-07-14.csv"), Some("2024-07-14"));
        assert_eq!(extract_date("a_2024-01-01_b_2025-02-02.csv"), Some("2024-01-01"));
        assert_eq!(extract_date("x20240-01-01y"), Some("0240-01-01"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 2), "-1,500.00");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_money(21900.0), "$21,900.00");
        assert_eq!(format_int(9855_i64), "9,855");
    }
}
