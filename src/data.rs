use std::sync::LazyLock;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::schema::ColumnType;

static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)$").expect("integer pattern"));

static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$")
        .expect("float pattern")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%dT%H:%M",
];

/// Boolean lexicon; `None` when the token is not a boolean spelling.
pub fn boolean_token(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// True for the word spellings (`true`/`false`/`yes`/`no`), excluding `1`/`0`.
pub fn is_boolean_word(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no"
    )
}

pub fn parse_integer(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if !INTEGER_PATTERN.is_match(trimmed) {
        bail!("Failed to parse '{value}' as integer");
    }
    trimmed
        .replace(',', "")
        .parse::<i64>()
        .map_err(|_| anyhow!("Integer '{value}' is out of range"))
}

pub fn parse_float(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if !FLOAT_PATTERN.is_match(trimmed) {
        bail!("Failed to parse '{value}' as float");
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| anyhow!("Failed to parse '{value}' as float"))
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    // Offsets such as `Z` or `+09:00` keep the local wall-clock time.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_local());
    }
    if let Some(stripped) = trimmed.strip_suffix('Z') {
        return parse_naive_datetime(stripped);
    }
    Err(anyhow!("Failed to parse '{value}' as timestamp"))
}

/// Blank cells are nulls: they never vote during inference and never
/// count as mismatches.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Whether a non-blank `value` parses under the rule for `ty`. Blank cells
/// match every type.
pub fn value_matches(value: &str, ty: ColumnType) -> bool {
    if is_blank(value) {
        return true;
    }
    match ty {
        ColumnType::Str => true,
        ColumnType::Int => parse_integer(value).is_ok(),
        ColumnType::Float => parse_float(value).is_ok(),
        ColumnType::Boolean => boolean_token(value).is_some(),
        ColumnType::Date => parse_naive_date(value).is_ok(),
        ColumnType::Timestamp => parse_naive_datetime(value).is_ok(),
    }
}
