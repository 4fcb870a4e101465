//! Value coercion and batched INSERT execution.

use super::ddl::insert_prefix;
use crate::error::TransferError;
use crate::models::{CellValue, ColumnSpec, ColumnType, MAX_EXACT_INTEGER_FLOAT, RowSet};
use crate::source::type_inference::{EXPORT_DATETIME_FORMAT, parse_bool, parse_float};
use crate::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, QueryBuilder};

const DATETIME_FORMATS: &[&str] = &[
    EXPORT_DATETIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// A cell coerced to the Rust type bound for its column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BindValue {
    Integer(Option<i64>),
    Float(Option<f64>),
    Boolean(Option<bool>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
    DateTime(Option<NaiveDateTime>),
    Binary(Option<Vec<u8>>),
}

impl BindValue {
    fn push(self, builder: &mut Separated<'_, '_, Postgres, &'static str>) {
        match self {
            Self::Integer(v) => builder.push_bind(v),
            Self::Float(v) => builder.push_bind(v),
            Self::Boolean(v) => builder.push_bind(v),
            Self::Text(v) => builder.push_bind(v),
            Self::Date(v) => builder.push_bind(v),
            Self::DateTime(v) => builder.push_bind(v),
            Self::Binary(v) => builder.push_bind(v),
        };
    }
}

/// Coerces one cell to its column's type.
///
/// # Errors
/// Returns [`TransferError::TypeMismatch`] if the value cannot be
/// represented in the column type
pub(crate) fn coerce(cell: &CellValue, column: &ColumnSpec) -> Result<BindValue> {
    let mismatch = || {
        TransferError::type_mismatch(
            &column.name,
            super::ddl::map_column_type(column.column_type),
            cell.describe(),
        )
    };

    let value = match (column.column_type, cell) {
        (ColumnType::Integer, CellValue::Null) => BindValue::Integer(None),
        (ColumnType::Integer, CellValue::Integer(v)) => BindValue::Integer(Some(*v)),
        (ColumnType::Integer, CellValue::Float(v))
            if v.fract() == 0.0 && v.is_finite() && v.abs() < MAX_EXACT_INTEGER_FLOAT =>
        {
            BindValue::Integer(Some(*v as i64))
        }
        (ColumnType::Integer, CellValue::Boolean(v)) => BindValue::Integer(Some(i64::from(*v))),
        (ColumnType::Integer, CellValue::Text(v)) => {
            BindValue::Integer(Some(v.trim().parse().map_err(|_| mismatch())?))
        }

        (ColumnType::Float, CellValue::Null) => BindValue::Float(None),
        (ColumnType::Float, CellValue::Float(v)) => BindValue::Float(Some(*v)),
        (ColumnType::Float, CellValue::Integer(v)) => BindValue::Float(Some(*v as f64)),
        (ColumnType::Float, CellValue::Text(v)) => {
            BindValue::Float(Some(parse_float(v.trim()).ok_or_else(mismatch)?))
        }

        (ColumnType::Boolean, CellValue::Null) => BindValue::Boolean(None),
        (ColumnType::Boolean, CellValue::Boolean(v)) => BindValue::Boolean(Some(*v)),
        (ColumnType::Boolean, CellValue::Integer(v)) => BindValue::Boolean(Some(*v != 0)),
        (ColumnType::Boolean, CellValue::Text(v)) => {
            BindValue::Boolean(Some(parse_bool(v).ok_or_else(mismatch)?))
        }

        (ColumnType::Text, CellValue::Null) => BindValue::Text(None),
        (ColumnType::Text, CellValue::Text(v)) => BindValue::Text(Some(v.clone())),
        (ColumnType::Text, CellValue::Integer(v)) => BindValue::Text(Some(v.to_string())),
        (ColumnType::Text, CellValue::Float(v)) => BindValue::Text(Some(v.to_string())),
        (ColumnType::Text, CellValue::Boolean(v)) => BindValue::Text(Some(v.to_string())),
        (ColumnType::Text, CellValue::Date(v)) => BindValue::Text(Some(v.to_string())),
        (ColumnType::Text, CellValue::DateTime(v)) => {
            BindValue::Text(Some(v.format(EXPORT_DATETIME_FORMAT).to_string()))
        }

        (ColumnType::Date, CellValue::Null) => BindValue::Date(None),
        (ColumnType::Date, CellValue::Date(v)) => BindValue::Date(Some(*v)),
        (ColumnType::Date, CellValue::DateTime(v)) => BindValue::Date(Some(v.date())),
        (ColumnType::Date, CellValue::Text(v)) => BindValue::Date(Some(
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| mismatch())?,
        )),

        (ColumnType::DateTime, CellValue::Null) => BindValue::DateTime(None),
        (ColumnType::DateTime, CellValue::DateTime(v)) => BindValue::DateTime(Some(*v)),
        (ColumnType::DateTime, CellValue::Date(v)) => {
            BindValue::DateTime(Some(v.and_time(NaiveTime::MIN)))
        }
        (ColumnType::DateTime, CellValue::Text(v)) => {
            BindValue::DateTime(Some(parse_datetime(v.trim()).ok_or_else(mismatch)?))
        }

        (ColumnType::Binary, CellValue::Null) => BindValue::Binary(None),
        (ColumnType::Binary, CellValue::Binary(v)) => BindValue::Binary(Some(v.clone())),
        (ColumnType::Binary, CellValue::Text(v)) => BindValue::Binary(Some(v.as_bytes().to_vec())),

        _ => return Err(mismatch()),
    };

    Ok(value)
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Coerces every row up front so a bad value fails the table before any
/// INSERT is sent.
pub(crate) fn coerce_rows(rows: &RowSet) -> Result<Vec<Vec<BindValue>>> {
    rows.rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(rows.columns())
                .map(|(cell, column)| coerce(cell, column))
                .collect()
        })
        .collect()
}

/// Inserts rows in multi-row statements of at most `rows_per_statement`
/// rows and returns the total rows affected.
pub(crate) async fn insert_rows(
    pool: &PgPool,
    table: &str,
    rows: &RowSet,
    rows_per_statement: usize,
) -> Result<u64> {
    if rows.is_empty() || rows.columns().is_empty() {
        return Ok(0);
    }

    let bound = coerce_rows(rows)?;
    let prefix = insert_prefix(table, rows.columns());
    let mut written = 0u64;

    for (index, chunk) in bound.chunks(rows_per_statement.max(1)).enumerate() {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(prefix.as_str());
        builder.push_values(chunk.iter().cloned(), |mut separated, row| {
            for value in row {
                value.push(&mut separated);
            }
        });

        let result = builder.build().execute(pool).await.map_err(|e| {
            TransferError::destination_failed(
                format!("insert batch {} into '{}' failed", index.saturating_add(1), table),
                e,
            )
        })?;

        written = written.saturating_add(result.rows_affected());
        tracing::trace!(
            "Inserted batch {} into {} ({} rows)",
            index.saturating_add(1),
            table,
            chunk.len()
        );
    }

    Ok(written)
}
