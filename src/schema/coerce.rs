//! Value coercion
//!
//! Each function converts one JSON value into a semantic type, succeeding
//! only when the conversion is unambiguous and well-formed.

use super::error::{ErrorDetail, ErrorKind};
use chrono::NaiveDate;
use serde_json::Value;

/// Coerce to an integer.
///
/// Accepts JSON integers, floats with no fractional part, and strings of
/// decimal digits with an optional sign. Surrounding whitespace is ignored.
pub fn integer(value: &Value) -> Result<i64, ErrorDetail> {
    let reject = |kind| Err(ErrorDetail::at_root(kind, value.clone()));

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() != 0.0 => reject(ErrorKind::IntFromFloat),
                Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
                _ => reject(ErrorKind::IntRange),
            }
        }
        Value::String(s) => parse_integer(s).map_or_else(|| reject(ErrorKind::IntParsing), Ok),
        _ => reject(ErrorKind::IntType),
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Coerce to a string. Only JSON strings are accepted.
pub fn string(value: &Value) -> Result<String, ErrorDetail> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(ErrorDetail::at_root(ErrorKind::StringType, value.clone())),
    }
}

/// Coerce to a calendar date from a strict `YYYY-MM-DD` string.
pub fn date(value: &Value) -> Result<NaiveDate, ErrorDetail> {
    match value {
        Value::String(s) => parse_iso_date(s).map_err(|reason| {
            ErrorDetail::at_root(ErrorKind::DateParsing(reason.to_string()), value.clone())
        }),
        _ => Err(ErrorDetail::at_root(ErrorKind::DateType, value.clone())),
    }
}

/// Parse `YYYY-MM-DD` with exactly four year digits and two month and day
/// digits. The error is the reason the input was rejected.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, &'static str> {
    let bytes = raw.as_bytes();
    if bytes.len() < 10 {
        return Err("input is too short");
    }

    let year = digits(&bytes[0..4]).ok_or("invalid character in year")?;
    if bytes[4] != b'-' {
        return Err("invalid date separator, expected `-`");
    }
    let month = digits(&bytes[5..7]).ok_or("invalid character in month")?;
    if bytes[7] != b'-' {
        return Err("invalid date separator, expected `-`");
    }
    let day = digits(&bytes[8..10]).ok_or("invalid character in day")?;
    if bytes.len() > 10 {
        return Err("unexpected extra characters at the end of the input");
    }

    if year == 0 {
        return Err("year value is outside expected range of 1-9999");
    }
    if !(1..=12).contains(&month) {
        return Err("month value is outside expected range of 1-12");
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or("day value is outside expected range")
}

fn digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn code<T>(result: Result<T, ErrorDetail>) -> &'static str {
        match result {
            Ok(_) => "ok",
            Err(e) => e.kind.code(),
        }
    }

    #[test]
    fn test_integer_accepts_numbers_and_digit_strings() {
        assert_eq!(integer(&json!(1)).unwrap(), 1);
        assert_eq!(integer(&json!("1")).unwrap(), 1);
        assert_eq!(integer(&json!(" 123 ")).unwrap(), 123);
        assert_eq!(integer(&json!("-42")).unwrap(), -42);
        assert_eq!(integer(&json!("+7")).unwrap(), 7);
        assert_eq!(integer(&json!(3.0)).unwrap(), 3);
    }

    #[test]
    fn test_integer_rejects_non_numeric() {
        assert_eq!(code(integer(&json!("abc"))), "int_parsing");
        assert_eq!(code(integer(&json!("12a"))), "int_parsing");
        assert_eq!(code(integer(&json!(""))), "int_parsing");
        assert_eq!(code(integer(&json!("-"))), "int_parsing");
        assert_eq!(code(integer(&json!("1.5"))), "int_parsing");
        assert_eq!(code(integer(&json!("99999999999999999999"))), "int_parsing");
        assert_eq!(code(integer(&json!(1.5))), "int_from_float");
        assert_eq!(code(integer(&json!(18446744073709551615u64))), "int_range");
        assert_eq!(code(integer(&json!(1e30))), "int_range");
        assert_eq!(code(integer(&json!(true))), "int_type");
        assert_eq!(code(integer(&json!(null))), "int_type");
        assert_eq!(code(integer(&json!([1]))), "int_type");
    }

    #[test]
    fn test_string() {
        assert_eq!(string(&json!("John Doe")).unwrap(), "John Doe");
        assert_eq!(string(&json!("")).unwrap(), "");
        assert_eq!(code(string(&json!(1))), "string_type");
    }

    #[test]
    fn test_date_accepts_iso() {
        assert_eq!(
            date(&json!("1987-01-28")).unwrap(),
            NaiveDate::from_ymd_opt(1987, 1, 28).unwrap()
        );
        assert_eq!(
            date(&json!("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_date_rejects_malformed() {
        let err = date(&json!("198-1-28")).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DateParsing("input is too short".to_string())
        );

        assert_eq!(
            parse_iso_date("19a7-01-28").unwrap_err(),
            "invalid character in year"
        );
        assert_eq!(
            parse_iso_date("1987/01/28").unwrap_err(),
            "invalid date separator, expected `-`"
        );
        assert_eq!(
            parse_iso_date("1987-13-01").unwrap_err(),
            "month value is outside expected range of 1-12"
        );
        assert_eq!(
            parse_iso_date("2023-02-29").unwrap_err(),
            "day value is outside expected range"
        );
        assert_eq!(
            parse_iso_date("0000-01-01").unwrap_err(),
            "year value is outside expected range of 1-9999"
        );
        assert_eq!(code(date(&json!("0000-01-01"))), "date_from_datetime_parsing");
        assert_eq!(
            parse_iso_date("1987-01-28x").unwrap_err(),
            "unexpected extra characters at the end of the input"
        );
    }

    #[test]
    fn test_date_rejects_non_strings() {
        assert_eq!(code(date(&json!([1, 2]))), "date_type");
        assert_eq!(code(date(&json!(19870128))), "date_type");
    }

    proptest! {
        #[test]
        fn prop_decimal_string_round_trips(n: i64) {
            prop_assert_eq!(integer(&json!(n.to_string())).unwrap(), n);
            prop_assert_eq!(integer(&json!(format!(" {} ", n))).unwrap(), n);
        }

        #[test]
        fn prop_letters_fail_int_parsing(s in "[a-zA-Z]{1,24}") {
            prop_assert_eq!(code(integer(&json!(s))), "int_parsing");
        }

        #[test]
        fn prop_formatted_dates_parse(days in 0i64..3_652_059) {
            let d = NaiveDate::from_ymd_opt(1, 1, 1).unwrap() + chrono::Duration::days(days);
            prop_assert_eq!(parse_iso_date(&d.format("%Y-%m-%d").to_string()), Ok(d));
        }
    }
}
