//! Best-effort cell coercion. Blank cells become `Missing`; cells that cannot
//! be read as the declared kind are reported so the loader can count them.
//! Text is kept verbatim so municipality names match exactly across tables.

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::table::{ColumnKind, Value};

/// A non-blank cell that could not be read as its declared kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot read '{raw}' as {kind:?}")]
pub struct CoerceError {
    pub raw: String,
    pub kind: ColumnKind,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

/// Coerce a raw cell into the declared kind.
pub fn coerce(raw: &str, kind: ColumnKind) -> Result<Value, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Missing);
    }
    let parsed = match kind {
        ColumnKind::Text => Some(Value::Text(raw.to_string())),
        ColumnKind::Number => parse_number(trimmed).map(Value::Number),
        ColumnKind::Integer => parse_integer(trimmed).map(Value::Integer),
        ColumnKind::Date => parse_date(trimmed).map(Value::Date),
    };
    parsed.ok_or_else(|| CoerceError {
        raw: trimmed.to_string(),
        kind,
    })
}

/// Parse a finite number, tolerating a trailing `%` and a comma decimal
/// separator when no dot is present.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.strip_suffix('%').unwrap_or(s).trim();
    let normalized = if s.contains(',') && !s.contains('.') {
        s.replace(',', ".")
    } else {
        s.to_string()
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an integer, accepting integral floats such as `12.0` from spreadsheets.
fn parse_integer(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    parse_number(s)
        .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
        .map(|n| n as i64)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}
