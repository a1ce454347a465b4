//! Per-type value formatters.
//!
//! Raw values arrive as JSON with loose typing: absent values may be `null`
//! or `false`, numbers may be numeric strings. Formatters trust the declared
//! field type and report values of the wrong shape as [`Error::InvalidValue`].

use crate::config::Localization;
use crate::i18n::Catalog;
use crate::types::{Currency, CurrencyPosition};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt::{Display, Write};

/// Default number of decimals for floats and monetary amounts.
pub const DEFAULT_PRECISION: u32 = 2;

/// Most decimals ever printed; larger precisions are clamped.
pub const MAX_PRECISION: u32 = 20;

fn invalid(field_type: &str, value: &Value) -> Error {
    Error::InvalidValue {
        field_type: field_type.to_string(),
        value: value.to_string(),
    }
}

/// Loose truthiness: `null`, `false`, `0`, `""` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_absent(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// "True" or "False", translated.
pub fn format_boolean(value: &Value, catalog: &Catalog) -> String {
    if is_truthy(value) {
        catalog.t("True")
    } else {
        catalog.t("False")
    }
}

/// Strings as-is; anything else is empty.
pub fn format_char(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

pub fn format_text(value: &Value) -> String {
    format_char(value)
}

/// Interpret a raw value as a UTC calendar date; falsy values are absent.
pub fn parse_utc_date(value: &Value) -> Result<Option<NaiveDate>> {
    if !is_truthy(value) {
        return Ok(None);
    }
    let Value::String(raw) = value else {
        return Err(invalid("date", value));
    };
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    parse_datetime_str(raw)
        .map(|dt| Some(dt.date_naive()))
        .ok_or_else(|| invalid("date", value))
}

/// Interpret a raw value as a UTC timestamp; falsy values are absent.
pub fn parse_utc_datetime(value: &Value) -> Result<Option<DateTime<Utc>>> {
    if !is_truthy(value) {
        return Ok(None);
    }
    let Value::String(raw) = value else {
        return Err(invalid("datetime", value));
    };
    let raw = raw.trim();
    if let Some(dt) = parse_datetime_str(raw) {
        return Ok(Some(dt));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| invalid("datetime", value))
}

fn parse_datetime_str(raw: &str) -> Option<DateTime<Utc>> {
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(dt.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn render(item: impl Display, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{item}").map_err(|_| Error::InvalidFormat(pattern.to_string()))?;
    Ok(out)
}

/// Format a date with the locale date format; absent dates are empty.
pub fn format_date(date: Option<NaiveDate>, localization: &Localization) -> Result<String> {
    match date {
        Some(date) => render(
            date.format(&localization.date_format),
            &localization.date_format,
        ),
        None => Ok(String::new()),
    }
}

/// Format a timestamp in the user's timezone; absent timestamps are empty.
pub fn format_datetime(
    datetime: Option<DateTime<Utc>>,
    timezone: FixedOffset,
    localization: &Localization,
) -> Result<String> {
    match datetime {
        Some(datetime) => {
            let pattern = localization.datetime_format();
            render(datetime.with_timezone(&timezone).format(&pattern), &pattern)
        }
        None => Ok(String::new()),
    }
}

fn as_number(value: &Value, field_type: &str) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(field_type, value)),
        Value::String(s) => s.trim().parse().map_err(|_| invalid(field_type, value)),
        _ => Err(invalid(field_type, value)),
    }
}

/// Fixed-precision number with locale separators.
pub fn format_float(value: &Value, precision: u32, localization: &Localization) -> Result<String> {
    if is_absent(value) {
        return Ok(String::new());
    }
    let number = as_number(value, "float")?;
    Ok(format_number(number, precision, localization))
}

/// Truncated integer with locale grouping; absent values are empty.
pub fn format_integer(value: &Value, localization: &Localization) -> Result<String> {
    if is_absent(value) || value.as_str().is_some_and(str::is_empty) {
        return Ok(String::new());
    }
    let number = match value.as_i64() {
        Some(n) => n,
        None => as_number(value, "integer")?.trunc() as i64,
    };
    let digits = number.unsigned_abs().to_string();
    let sign = if number < 0 { "-" } else { "" };
    Ok(format!(
        "{sign}{}",
        insert_thousands_sep(&digits, &localization.thousands_sep, &localization.grouping)
    ))
}

/// Amount with the currency's decimals and symbol, separated by a plain space.
pub fn format_monetary(
    value: &Value,
    currency: Option<&Currency>,
    localization: &Localization,
) -> Result<String> {
    if is_absent(value) {
        return Ok(String::new());
    }
    let precision = currency.map(Currency::decimals).unwrap_or(DEFAULT_PRECISION);
    let amount = format_number(as_number(value, "monetary")?, precision, localization);
    Ok(match currency {
        None => amount,
        Some(currency) => match currency.position {
            CurrencyPosition::Before => format!("{} {amount}", currency.symbol),
            CurrencyPosition::After => format!("{amount} {}", currency.symbol),
        },
    })
}

fn format_number(number: f64, precision: u32, localization: &Localization) -> String {
    let precision = precision.min(MAX_PRECISION) as usize;
    let formatted = format!("{number:.precision$}");
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let grouped = insert_thousands_sep(int_part, &localization.thousands_sep, &localization.grouping);
    match frac_part {
        Some(frac) => format!("{sign}{grouped}{}{frac}", localization.decimal_point),
        None => format!("{sign}{grouped}"),
    }
}

/// Insert `separator` between digit groups counted from the right.
///
/// Each `grouping` entry is a group size; `0` repeats the previous size
/// for the rest of the number and a negative entry stops grouping.
pub fn insert_thousands_sep(digits: &str, separator: &str, grouping: &[i32]) -> String {
    let mut sections: Vec<&str> = Vec::new();
    let mut last = digits.len();
    let mut index = 0;
    let mut previous: Option<usize> = None;

    while index < grouping.len() && last > 0 {
        let size = match grouping[index] {
            size if size < 0 => break,
            0 => match previous {
                Some(size) => size,
                None => break,
            },
            size => {
                index += 1;
                size as usize
            }
        };
        previous = Some(size);
        let start = last.saturating_sub(size);
        sections.push(&digits[start..last]);
        last = start;
    }
    if last > 0 {
        sections.push(&digits[..last]);
    }
    sections.reverse();
    sections.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn french() -> Localization {
        Localization {
            decimal_point: ",".to_string(),
            thousands_sep: ".".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_thousands_sep() {
        assert_eq!(insert_thousands_sep("1234567", ",", &[3, 0]), "1,234,567");
        assert_eq!(insert_thousands_sep("123", ",", &[3, 0]), "123");
        assert_eq!(insert_thousands_sep("1234567", ",", &[3, 2, 0]), "12,34,567");
        assert_eq!(insert_thousands_sep("1234567", ",", &[3, -1]), "1234,567");
        assert_eq!(insert_thousands_sep("1234567", ",", &[3]), "1234,567");
        assert_eq!(insert_thousands_sep("1234567", ",", &[]), "1234567");
        assert_eq!(insert_thousands_sep("1234567", ",", &[0]), "1234567");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(2.5)));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn test_format_boolean() {
        let catalog = Catalog::default();
        assert_eq!(format_boolean(&json!(true), &catalog), "True");
        assert_eq!(format_boolean(&json!(false), &catalog), "False");
        assert_eq!(format_boolean(&json!(null), &catalog), "False");
    }

    #[test]
    fn test_format_char() {
        assert_eq!(format_char(&json!("Won")), "Won");
        assert_eq!(format_char(&json!(false)), "");
        assert_eq!(format_char(&json!(12)), "");
        assert_eq!(format_text(&json!("long\ntext")), "long\ntext");
    }

    #[test]
    fn test_format_float() {
        let loc = Localization::default();
        assert_eq!(format_float(&json!(1234.5), 2, &loc).unwrap(), "1,234.50");
        assert_eq!(format_float(&json!(-1234567.891), 2, &loc).unwrap(), "-1,234,567.89");
        assert_eq!(format_float(&json!("3.25"), 2, &loc).unwrap(), "3.25");
        assert_eq!(format_float(&json!(0), 2, &loc).unwrap(), "0.00");
        assert_eq!(format_float(&json!(false), 2, &loc).unwrap(), "");
        assert_eq!(format_float(&json!(1234.5), 2, &french()).unwrap(), "1.234,50");
        assert_eq!(format_float(&json!(7), 0, &loc).unwrap(), "7");
    }

    #[test]
    fn test_format_float_rejects_text() {
        let result = format_float(&json!("abc"), 2, &Localization::default());
        assert!(matches!(
            result,
            Err(Error::InvalidValue { ref field_type, .. }) if field_type == "float"
        ));
    }

    #[test]
    fn test_format_integer() {
        let loc = Localization::default();
        assert_eq!(format_integer(&json!(3), &loc).unwrap(), "3");
        assert_eq!(format_integer(&json!(1234567), &loc).unwrap(), "1,234,567");
        assert_eq!(format_integer(&json!(-4200), &loc).unwrap(), "-4,200");
        assert_eq!(format_integer(&json!(12.9), &loc).unwrap(), "12");
        assert_eq!(format_integer(&json!(0), &loc).unwrap(), "0");
        assert_eq!(format_integer(&json!(false), &loc).unwrap(), "");
        assert_eq!(format_integer(&json!(""), &loc).unwrap(), "");
        assert!(format_integer(&json!([1]), &loc).is_err());
    }

    #[test]
    fn test_format_monetary() {
        let loc = Localization::default();
        let dollar = Currency::new(1, "$");
        let euro = Currency::new(2, "€").with_position(CurrencyPosition::After);
        let yen = Currency::new(3, "¥").with_decimals(0);

        assert_eq!(format_monetary(&json!(10), Some(&dollar), &loc).unwrap(), "$ 10.00");
        assert_eq!(format_monetary(&json!(1500.5), Some(&euro), &loc).unwrap(), "1,500.50 €");
        assert_eq!(format_monetary(&json!(1500), Some(&yen), &loc).unwrap(), "¥ 1,500");
        assert_eq!(format_monetary(&json!(10), None, &loc).unwrap(), "10.00");
        assert_eq!(format_monetary(&json!(false), Some(&dollar), &loc).unwrap(), "");
    }

    #[test]
    fn test_huge_precision_is_clamped() {
        let loc = Localization::default();
        let odd = Currency::new(4, "$").with_decimals(4_000_000_000);
        let amount = format_monetary(&json!(1.5), Some(&odd), &loc).unwrap();
        let decimals = amount.rsplit('.').next().unwrap();
        assert_eq!(decimals.len(), MAX_PRECISION as usize);
        assert!(amount.starts_with("$ 1.5"));

        let float = format_float(&json!(2), u32::MAX, &loc).unwrap();
        assert_eq!(float, format!("2.{}", "0".repeat(MAX_PRECISION as usize)));
    }

    #[test]
    fn test_parse_and_format_date() {
        let loc = Localization::default();
        let date = parse_utc_date(&json!("2018-12-14")).unwrap();
        assert_eq!(format_date(date, &loc).unwrap(), "12/14/2018");
        assert_eq!(format_date(date, &french()).unwrap(), "14/12/2018");

        let from_datetime = parse_utc_date(&json!("2018-12-14 23:10:00")).unwrap();
        assert_eq!(from_datetime, date);

        assert_eq!(parse_utc_date(&json!(false)).unwrap(), None);
        assert_eq!(format_date(None, &loc).unwrap(), "");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            parse_utc_date(&json!("yesterday")),
            Err(Error::InvalidValue { .. })
        ));
        assert!(parse_utc_date(&json!(20181214)).is_err());
    }

    #[test]
    fn test_parse_and_format_datetime() {
        let loc = Localization::default();
        let utc = FixedOffset::east_opt(0).unwrap();
        let plus_one = FixedOffset::east_opt(3600).unwrap();

        let dt = parse_utc_datetime(&json!("2018-12-14 13:34:10")).unwrap();
        assert_eq!(format_datetime(dt, utc, &loc).unwrap(), "12/14/2018 13:34:10");
        assert_eq!(format_datetime(dt, plus_one, &loc).unwrap(), "12/14/2018 14:34:10");

        let rfc = parse_utc_datetime(&json!("2018-12-14T13:34:10+02:00")).unwrap();
        assert_eq!(format_datetime(rfc, utc, &loc).unwrap(), "12/14/2018 11:34:10");

        assert_eq!(parse_utc_datetime(&json!(null)).unwrap(), None);
        assert!(parse_utc_datetime(&json!("not a date")).is_err());
    }

    #[test]
    fn test_invalid_date_pattern() {
        let loc = Localization {
            date_format: "%Q".to_string(),
            ..Default::default()
        };
        let date = parse_utc_date(&json!("2018-12-14")).unwrap();
        assert!(matches!(format_date(date, &loc), Err(Error::InvalidFormat(_))));
    }
}
