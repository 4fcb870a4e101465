//! DDL generation for PostgreSQL.

pub use crate::helpers::quote_identifier;
use crate::models::{ColumnSpec, ColumnType};

/// Maps a column type to the PostgreSQL type used on creation.
///
/// # Example
/// ```rust
/// use mdbtransfer_core::destination::postgres::map_column_type;
/// use mdbtransfer_core::models::ColumnType;
///
/// assert_eq!(map_column_type(ColumnType::Integer), "BIGINT");
/// assert_eq!(map_column_type(ColumnType::DateTime), "TIMESTAMP");
/// ```
pub fn map_column_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "BIGINT",
        ColumnType::Float => "DOUBLE PRECISION",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Text => "TEXT",
        ColumnType::Date => "DATE",
        ColumnType::DateTime => "TIMESTAMP",
        ColumnType::Binary => "BYTEA",
    }
}

/// Builds `CREATE TABLE` for a case-folded table name.
///
/// Column names keep their source spelling and are always quoted.
pub fn create_table_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let definitions = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(&column.name),
                map_column_type(column.column_type)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE {} ({})", quote_identifier(table), definitions)
}

/// Builds the fixed prefix of a multi-row INSERT.
pub fn insert_prefix(table: &str, columns: &[ColumnSpec]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_identifier(&column.name))
        .collect::<Vec<_>>()
        .join(", ");

    format!("INSERT INTO {} ({}) ", quote_identifier(table), names)
}
