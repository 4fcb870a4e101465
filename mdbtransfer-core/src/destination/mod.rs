//! Destination database abstraction.
//!
//! The [`Destination`] trait is the seam between the transfer engine and
//! the server database. Table identifiers passed to it are already
//! case-folded; column names are passed exactly as the source declared
//! them.

use crate::config::DestinationConfig;
use crate::models::{ColumnSpec, KeyValue, RowSet, TableState};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "postgresql")]
pub use postgres::PostgresDestination;

/// Operations the transfer engine needs from a destination database.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Performs a real round trip and returns the server's version string.
    ///
    /// # Errors
    /// Returns error if the server cannot be reached or the query fails
    async fn check_connectivity(&self) -> Result<String>;

    /// Reports whether a table is absent, empty or populated, using the
    /// catalog rather than a failing query.
    ///
    /// # Errors
    /// Returns error if the catalog cannot be queried
    async fn table_state(&self, table: &str) -> Result<TableState>;

    /// Resolves the actual spelling of a column on an existing table,
    /// ignoring case.
    ///
    /// # Errors
    /// Returns error if the catalog cannot be queried
    async fn key_column(&self, table: &str, column: &str) -> Result<Option<String>>;

    /// Returns the distinct non-NULL values of a column in canonical form.
    ///
    /// # Errors
    /// Returns error if the query fails
    async fn existing_keys(&self, table: &str, column: &str) -> Result<HashSet<KeyValue>>;

    /// Creates a table with one column per source column.
    ///
    /// # Errors
    /// Returns error if the DDL fails
    async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<()>;

    /// Appends every row of `rows`, returning the number of rows written.
    ///
    /// # Errors
    /// Returns error if a value cannot be bound or an INSERT fails. Rows
    /// written by earlier statements stay written.
    async fn append_rows(&self, table: &str, rows: &RowSet) -> Result<u64>;

    /// Releases pooled connections.
    async fn close(&self) {}
}

/// Creates the destination for a configuration.
///
/// No connection is opened here; the first round trip happens in the
/// preflight.
///
/// # Errors
/// Returns error if the driver rejects the URL or PostgreSQL support is not
/// compiled in
pub fn create_destination(config: &DestinationConfig) -> Result<Box<dyn Destination>> {
    #[cfg(feature = "postgresql")]
    {
        Ok(Box::new(PostgresDestination::new(config)?))
    }

    #[cfg(not(feature = "postgresql"))]
    {
        let _ = config;
        Err(crate::error::TransferError::unsupported_feature(
            "PostgreSQL destination",
            "compile with --features postgresql",
        ))
    }
}
