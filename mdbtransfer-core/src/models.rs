//! Core data models for a table-by-table transfer.
//!
//! A [`RowSet`] is read fresh for every table and dropped once the table has
//! been written. A [`TransferResult`] is produced once per table and never
//! modified afterwards.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Magnitude below which every whole `f64` converts to `i64` exactly.
///
/// Whole floats at or beyond it keep their float spelling as keys and are
/// not written into integer columns.
pub const MAX_EXACT_INTEGER_FLOAT: f64 = 9.0e15;

/// Name of a source table.
///
/// The source spelling is kept for reporting; the destination always uses
/// the lowercase form so that `Assets` and `ASSETS` land in one table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Creates a table name from the spelling reported by the source.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Source spelling of the table name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded identifier used on the destination.
    pub fn destination_name(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Column types a source can produce and the destination can store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    Date,
    DateTime,
    Binary,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A single cell read from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

impl CellValue {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short description used in type mismatch messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(v) => format!("integer {v}"),
            Self::Float(v) => format!("float {v}"),
            Self::Boolean(v) => format!("boolean {v}"),
            Self::Text(v) => format!("text '{v}'"),
            Self::Date(v) => format!("date {v}"),
            Self::DateTime(v) => format!("datetime {v}"),
            Self::Binary(v) => format!("{} bytes of binary data", v.len()),
        }
    }

    /// Canonical key form used for duplicate suppression.
    ///
    /// Integral floats compare equal to integers so that a source `1.0`
    /// matches a destination `1`. NULL has no key.
    pub fn key(&self) -> Option<KeyValue> {
        let text = match self {
            Self::Null => return None,
            Self::Integer(v) => v.to_string(),
            Self::Float(v)
                if v.fract() == 0.0 && v.is_finite() && v.abs() < MAX_EXACT_INTEGER_FLOAT =>
            {
                format!("{}", *v as i64)
            }
            Self::Float(v) => v.to_string(),
            Self::Boolean(v) => v.to_string(),
            Self::Text(v) => return Some(KeyValue::from_text(v)),
            Self::Date(v) => v.to_string(),
            Self::DateTime(v) => v.to_string(),
            Self::Binary(_) => return None,
        };
        Some(KeyValue::new(text))
    }
}

/// Primary key value in canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValue(String);

impl KeyValue {
    /// Wraps an already canonical key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Canonicalizes a key read back as text.
    ///
    /// Decimal spellings of whole numbers (`"3.0"`, `"3.00"`) collapse to
    /// `"3"`; anything else is kept verbatim, so `"007"` stays distinct
    /// from `"7"`.
    pub fn from_text(text: &str) -> Self {
        if text.contains('.')
            && let Ok(number) = text.parse::<f64>()
            && number.is_finite()
            && number.fract() == 0.0
            && number.abs() < MAX_EXACT_INTEGER_FLOAT
        {
            return Self(format!("{}", number as i64));
        }
        Self(text.to_string())
    }

    /// Canonical text of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Column declared by a source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    /// Creates a column specification.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered, homogeneous rows read from one source table.
///
/// Every row holds exactly one value per column, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    /// Creates a row set, rejecting rows whose width differs from the column list.
    pub fn new(columns: Vec<ColumnSpec>, rows: Vec<Vec<CellValue>>) -> crate::Result<Self> {
        if let Some(position) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(crate::error::TransferError::configuration(format!(
                "row {} has {} values but {} columns are declared",
                position,
                rows[position].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Creates a row set with columns but no rows.
    pub fn empty(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Declared columns in source order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Column names in source order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Raw row values in source order.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Iterates rows as name-addressable views.
    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table had no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a column by name, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Keeps only rows for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

/// Borrowed view of one row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [ColumnSpec],
    values: &'a [CellValue],
}

impl<'a> RowView<'a> {
    /// Value of the named column, ignoring ASCII case.
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(column))
            .map(|index| &self.values[index])
    }

    /// Values in column order.
    pub fn values(&self) -> &'a [CellValue] {
        self.values
    }
}

/// Presence of a destination table, as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    /// No such table on the destination
    Absent,
    /// Table exists and holds no rows
    Empty,
    /// Table exists and holds at least one row
    Populated,
}

impl TableState {
    /// Returns true if the table exists, empty or not.
    pub fn exists(self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// Outcome of processing one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    Success,
    Skipped,
    Error,
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Skipped => write!(f, "Skipped"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Result record for one processed table.
///
/// A run that fails before any table work produces a single record without
/// a table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    table: Option<TableName>,
    status: TransferStatus,
    records: u64,
    message: String,
}

impl TransferResult {
    /// Rows were written (possibly zero after duplicate filtering).
    pub fn success(table: TableName, records: u64, message: impl Into<String>) -> Self {
        Self {
            table: Some(table),
            status: TransferStatus::Success,
            records,
            message: message.into(),
        }
    }

    /// Nothing was written on purpose.
    pub fn skipped(table: TableName, message: impl Into<String>) -> Self {
        Self {
            table: Some(table),
            status: TransferStatus::Skipped,
            records: 0,
            message: message.into(),
        }
    }

    /// The table failed; the run continues.
    pub fn error(table: TableName, message: impl Into<String>) -> Self {
        Self {
            table: Some(table),
            status: TransferStatus::Error,
            records: 0,
            message: message.into(),
        }
    }

    /// The run failed before or instead of any table work.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            table: None,
            status: TransferStatus::Error,
            records: 0,
            message: message.into(),
        }
    }

    /// Table the record describes, `None` for a run-level failure.
    pub fn table(&self) -> Option<&TableName> {
        self.table.as_ref()
    }

    /// Outcome status.
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Rows actually written.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Human-readable detail.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true for Error records.
    pub fn is_error(&self) -> bool {
        self.status == TransferStatus::Error
    }
}
