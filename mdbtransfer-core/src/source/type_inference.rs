//! Best-effort type mapping for source columns.
//!
//! Exported text carries no declared types, so column types are inferred
//! from the values themselves. Driver readers instead get a declared type
//! name, mapped here with SQLite affinity rules:
//!
//! 1. Contains "INT" -> Integer
//! 2. Contains "CHAR", "CLOB" or "TEXT" -> Text
//! 3. Contains "BLOB" or no type -> Binary
//! 4. Contains "REAL", "FLOA" or "DOUB" -> Float
//! 5. Otherwise -> by name, falling back to Float for numeric names

use crate::models::{CellValue, ColumnType};
use chrono::{NaiveDate, NaiveDateTime};

/// Timestamp layout requested from `mdb-export -D`
pub const EXPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maps a declared column type name to a column type.
///
/// # Example
/// ```rust
/// use mdbtransfer_core::models::ColumnType;
/// use mdbtransfer_core::source::type_inference::map_declared_type;
///
/// assert_eq!(map_declared_type("VARCHAR(255)"), ColumnType::Text);
/// assert_eq!(map_declared_type("bigint"), ColumnType::Integer);
/// ```
pub fn map_declared_type(declared: &str) -> ColumnType {
    let upper = declared.trim().to_uppercase();
    let base = upper
        .split('(')
        .next()
        .map(str::trim)
        .unwrap_or_default();

    if base.is_empty() {
        return ColumnType::Binary;
    }
    if base.contains("INT") {
        return ColumnType::Integer;
    }
    if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") {
        return ColumnType::Text;
    }
    if base.contains("BLOB") {
        return ColumnType::Binary;
    }
    if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
        return ColumnType::Float;
    }

    match base {
        "BOOLEAN" | "BOOL" | "BIT" | "YESNO" => ColumnType::Boolean,
        "DATE" => ColumnType::Date,
        "DATETIME" | "TIMESTAMP" => ColumnType::DateTime,
        "BINARY" | "VARBINARY" => ColumnType::Binary,
        "STRING" | "MEMO" | "GUID" | "UUID" => ColumnType::Text,
        _ if base.contains("NUM") || base.contains("DEC") || base.contains("MONEY") => {
            ColumnType::Float
        }
        _ => ColumnType::Text,
    }
}

/// Infers the narrowest type able to hold every non-empty value.
///
/// A column with no non-empty values is Text.
pub fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut integer = true;
    let mut float = true;
    let mut datetime = true;
    let mut date = true;
    let mut seen = false;

    for value in values.into_iter().filter(|v| !v.is_empty()) {
        seen = true;
        let numeric = keeps_numeric_form(value);
        integer = integer && numeric && value.parse::<i64>().is_ok();
        float = float && numeric && parse_float(value).is_some();
        datetime = datetime && NaiveDateTime::parse_from_str(value, EXPORT_DATETIME_FORMAT).is_ok();
        date = date && NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok();

        if !(integer || float || datetime || date) {
            return ColumnType::Text;
        }
    }

    match (seen, integer, float, datetime, date) {
        (false, ..) => ColumnType::Text,
        (true, true, ..) => ColumnType::Integer,
        (true, false, true, ..) => ColumnType::Float,
        (true, false, false, true, _) => ColumnType::DateTime,
        (true, false, false, false, true) => ColumnType::Date,
        _ => ColumnType::Text,
    }
}

/// Returns false for numeric-looking text that would not survive a round
/// trip through a number: leading zeros (`007`), an explicit `+` sign and
/// surrounding whitespace.
fn keeps_numeric_form(value: &str) -> bool {
    if value.trim() != value || value.starts_with('+') {
        return false;
    }
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut chars = digits.chars();
    !matches!((chars.next(), chars.next()), (Some('0'), Some(c)) if c.is_ascii_digit())
}

/// Converts one exported text cell to a value of the inferred type.
///
/// Empty cells are NULL. A value that does not parse as the column type is
/// kept as text and left for the destination to reject.
pub fn parse_cell(raw: &str, column_type: ColumnType) -> CellValue {
    if raw.is_empty() {
        return CellValue::Null;
    }

    let parsed = match column_type {
        ColumnType::Integer => raw.parse().ok().map(CellValue::Integer),
        ColumnType::Float => parse_float(raw).map(CellValue::Float),
        ColumnType::Boolean => parse_bool(raw).map(CellValue::Boolean),
        ColumnType::DateTime => NaiveDateTime::parse_from_str(raw, EXPORT_DATETIME_FORMAT)
            .ok()
            .map(CellValue::DateTime),
        ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .map(CellValue::Date),
        ColumnType::Text | ColumnType::Binary => None,
    };

    parsed.unwrap_or_else(|| CellValue::Text(raw.to_string()))
}

/// Parses a finite decimal number; rejects `inf`/`NaN` spellings.
pub(crate) fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses the boolean spellings used by Access exports and SQLite.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "-1" => Some(true),
        "0" | "false" | "f" | "no" => Some(false),
        _ => None,
    }
}
