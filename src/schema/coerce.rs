//! Type coercion of raw values to declared schema types.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::model::{FieldType, Value};

/// Numeric values above this are read as spreadsheet day serials.
const SERIAL_THRESHOLD: f64 = 30000.0;

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Coerce `raw` to `field_type`.
///
/// Empty input (null or blank text) is null whatever the declared type.
pub fn coerce(raw: &Value, field_type: FieldType) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }

    match field_type {
        FieldType::Text => Value::Text(raw.display_string()),
        FieldType::Number => Value::Number(raw.parse_float().unwrap_or(0.0)),
        FieldType::Boolean => {
            let s = raw.display_string().trim().to_ascii_lowercase();
            Value::Bool(matches!(s.as_str(), "true" | "1" | "yes"))
        }
        FieldType::Date => coerce_date(raw),
    }
}

/// Coerce to a date, or give back the raw value.
///
/// Numbers above 30000 are spreadsheet day serials, other numbers are epoch
/// milliseconds, text goes through a list of common formats. A result in
/// 1970 or earlier reverts to the raw value unless the raw value is the
/// number zero itself: ordinary small numbers and codes would otherwise all
/// turn into dates around the epoch. Legitimate dates up to 1970 are
/// therefore kept as their raw text.
pub fn coerce_date(raw: &Value) -> Value {
    if let Value::Date(_) = raw {
        return raw.clone();
    }

    let parsed = match numeric(raw) {
        Some(n) if n > SERIAL_THRESHOLD => from_serial(n),
        Some(n) if n.is_finite() => DateTime::from_timestamp_millis(n as i64),
        Some(_) => None,
        None => parse_date_text(&raw.display_string()),
    };

    let literal_zero = matches!(raw, Value::Number(n) if *n == 0.0);
    match parsed {
        Some(date) if date.year() > 1970 || literal_zero => Value::Date(date),
        _ => raw.clone(),
    }
}

/// Convert a spreadsheet day serial to a UTC timestamp.
pub fn from_serial(serial: f64) -> Option<DateTime<Utc>> {
    let millis = ((serial - SERIAL_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round();
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parse a date or date-time string; naive values are taken as UTC.
pub fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }

    None
}

/// Whole-value numeric reading: numbers, and text that is entirely a number.
fn numeric(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => Some(*n),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
