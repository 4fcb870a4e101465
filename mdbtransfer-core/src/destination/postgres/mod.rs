//! PostgreSQL destination.
//!
//! All catalog lookups are scoped to `current_schema()`, so tables land in
//! whatever schema the connecting role resolves first (normally `public`).
//! Writes are not wrapped in a transaction; a failing batch leaves earlier
//! batches of the same table in place.

mod connection;
mod ddl;
mod writer;

pub use ddl::{create_table_sql, map_column_type, quote_identifier};

use super::Destination;
use crate::config::DestinationConfig;
use crate::error::TransferError;
use crate::models::{ColumnSpec, KeyValue, RowSet, TableState};
use crate::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;

/// Destination backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresDestination {
    pool: PgPool,
    config: DestinationConfig,
}

impl PostgresDestination {
    /// Creates the destination without connecting.
    ///
    /// # Errors
    /// Returns a connection error if the driver cannot parse the URL
    pub fn new(config: &DestinationConfig) -> Result<Self> {
        config.validate()?;
        let pool = connection::create_pool(config)?;

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Underlying pool, for callers that need ad hoc queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Destination for PostgresDestination {
    async fn check_connectivity(&self) -> Result<String> {
        tracing::debug!("Checking destination {}", self.config.redacted_url());

        sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(TransferError::connection_failed)
    }

    async fn table_state(&self, table: &str) -> Result<TableState> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            TransferError::destination_failed(format!("catalog lookup for '{table}' failed"), e)
        })?;

        if !exists {
            return Ok(TableState::Absent);
        }

        let populated: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} LIMIT 1)",
            quote_identifier(table)
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            TransferError::destination_failed(format!("row check on '{table}' failed"), e)
        })?;

        Ok(if populated {
            TableState::Populated
        } else {
            TableState::Empty
        })
    }

    async fn key_column(&self, table: &str, column: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT column_name::text FROM information_schema.columns
             WHERE table_schema = current_schema()
               AND table_name = $1
               AND lower(column_name) = lower($2)
             ORDER BY (column_name = $2) DESC, ordinal_position
             LIMIT 1",
        )
        .bind(table)
        .bind(column)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            TransferError::destination_failed(format!("column lookup on '{table}' failed"), e)
        })
    }

    async fn existing_keys(&self, table: &str, column: &str) -> Result<HashSet<KeyValue>> {
        let column = quote_identifier(column);
        let query = format!(
            "SELECT DISTINCT {column}::text FROM {} WHERE {column} IS NOT NULL",
            quote_identifier(table)
        );

        let keys: Vec<String> = sqlx::query_scalar(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                TransferError::destination_failed(format!("key query on '{table}' failed"), e)
            })?;

        Ok(keys.iter().map(|key| KeyValue::from_text(key)).collect())
    }

    async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        let sql = create_table_sql(table, columns);
        tracing::debug!("Creating table: {}", sql);

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| TransferError::destination_failed(format!("create table '{table}' failed"), e))?;

        Ok(())
    }

    async fn append_rows(&self, table: &str, rows: &RowSet) -> Result<u64> {
        let per_statement = self.config.rows_per_statement(rows.columns().len());
        writer::insert_rows(&self.pool, table, rows, per_statement).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
