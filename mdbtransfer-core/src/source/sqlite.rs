//! Driver-based reader for SQLite files.
//!
//! The file is opened read-only through a single-connection pool. Column
//! types come from the declared types in `pragma_table_info`; values are
//! decoded by declared type first and by storage class when the stored
//! value does not match its declaration.

use super::type_inference::map_declared_type;
use super::{SourceKind, SourceReader, require_tables};
use crate::error::TransferError;
use crate::helpers::quote_identifier;
use crate::models::{CellValue, ColumnSpec, ColumnType, RowSet, TableName};
use crate::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};

/// Source reader that queries a SQLite file directly.
#[derive(Debug, Clone)]
pub struct SqliteReader {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteReader {
    /// Opens the file lazily in read-only mode.
    ///
    /// No connection is made until the first query, so a missing or
    /// unreadable file surfaces from [`SourceReader::list_tables`].
    pub fn open(path: &Path) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);

        Self {
            pool,
            path: path.to_path_buf(),
        }
    }

    async fn columns(&self, table: &TableName) -> Result<Vec<ColumnSpec>> {
        let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TransferError::source_read(table.as_str(), "failed to read columns", e))?;

        rows.iter()
            .map(|row| -> Result<ColumnSpec> {
                let name: String = row.try_get("name").map_err(|e| {
                    TransferError::source_read(table.as_str(), "invalid column name", e)
                })?;
                let declared: String = row.try_get("type").unwrap_or_default();
                Ok(ColumnSpec::new(name, map_declared_type(&declared)))
            })
            .collect()
    }
}

#[async_trait]
impl SourceReader for SqliteReader {
    async fn list_tables(&self) -> Result<Vec<TableName>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TransferError::extraction(
                "sqlite",
                format!("cannot read {}: {}", self.path.display(), e),
            )
        })?;

        tracing::info!("Found {} table(s) in {}", names.len(), self.path.display());
        require_tables(names.into_iter().map(TableName::new).collect())
    }

    async fn read_table(&self, table: &TableName) -> Result<RowSet> {
        let columns = self.columns(table).await?;

        let query = format!("SELECT * FROM {}", quote_identifier(table.as_str()));
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TransferError::source_read(table.as_str(), "failed to select rows", e))?;

        let values: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| decode_cell(row, index, column.column_type))
                    .collect()
            })
            .collect();

        tracing::debug!("Read {} row(s) from {}", rows.len(), table);
        RowSet::new(columns, values)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Sqlite
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
