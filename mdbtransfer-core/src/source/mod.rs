//! Source readers for legacy desktop database files.
//!
//! A reader enumerates the user tables of one file and returns each table
//! as a [`RowSet`]. Two interchangeable readers exist:
//!
//! - `mdbtools`: shells out to `mdb-tables` / `mdb-export` and parses the
//!   CSV they print (Access `.mdb` / `.accdb` files)
//! - `sqlite`: opens the file with the SQLite driver and runs
//!   `SELECT * FROM <table>` (feature `sqlite`)
//!
//! Both produce the same column names, the same best-effort types, and a
//! zero-row `RowSet` for an empty table.

use crate::config::{ReaderSelection, SourceConfig};
use crate::error::TransferError;
use crate::models::{RowSet, TableName};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod mdbtools;
pub mod type_inference;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use mdbtools::MdbToolsReader;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteReader;

/// Kind of reader handling a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Access file read through the mdbtools export utilities
    MdbTools,
    /// SQLite file read through the driver
    Sqlite,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MdbTools => write!(f, "mdbtools"),
            Self::Sqlite => write!(f, "SQLite"),
        }
    }
}

impl SourceKind {
    /// Detects the reader kind from the file extension.
    ///
    /// # Errors
    /// Returns error if the extension is not a recognized database format
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "mdb" | "accdb" => Ok(Self::MdbTools),
            "db" | "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(TransferError::configuration(format!(
                "cannot determine reader for '{}': expected .mdb, .accdb, .db, .sqlite or .sqlite3",
                path.display()
            ))),
        }
    }

    /// Resolves the configured selection against the file.
    ///
    /// # Errors
    /// Returns error if `Auto` is selected and detection fails
    pub fn resolve(selection: ReaderSelection, path: &Path) -> Result<Self> {
        match selection {
            ReaderSelection::Auto => Self::detect(path),
            ReaderSelection::MdbTools => Ok(Self::MdbTools),
            ReaderSelection::Sqlite => Ok(Self::Sqlite),
        }
    }
}

/// Reads tables out of one source file.
///
/// Implementations do not catch constraint problems; whatever they return is
/// judged by the table sync strategy.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Lists user tables in the order the source reports them.
    ///
    /// # Errors
    /// Returns [`TransferError::NoTablesFound`] if the file has no tables,
    /// or an extraction error if the file cannot be read at all
    async fn list_tables(&self) -> Result<Vec<TableName>>;

    /// Reads every row of one table.
    ///
    /// # Errors
    /// Returns error if the table cannot be read or decoded
    async fn read_table(&self, table: &TableName) -> Result<RowSet>;

    /// Returns the reader kind.
    fn kind(&self) -> SourceKind;

    /// Releases any handle on the source file.
    async fn close(&self) {}
}

/// Creates the reader for a source file.
///
/// # Errors
/// Returns error if no reader matches the file or the reader is not
/// compiled in
pub fn create_reader(path: &Path, config: &SourceConfig) -> Result<Box<dyn SourceReader>> {
    match SourceKind::resolve(config.reader, path)? {
        SourceKind::MdbTools => Ok(Box::new(MdbToolsReader::new(path, config))),
        #[cfg(feature = "sqlite")]
        SourceKind::Sqlite => Ok(Box::new(SqliteReader::open(path))),
        #[cfg(not(feature = "sqlite"))]
        SourceKind::Sqlite => Err(TransferError::unsupported_feature(
            "SQLite reader",
            "compile with --features sqlite",
        )),
    }
}

/// Checks that the source file exists and is within the size limit.
///
/// # Returns
/// File size in bytes
///
/// # Errors
/// Returns error if the file is missing, not a regular file, or too large
pub fn check_source_file(path: &Path, max_size: u64) -> Result<u64> {
    let metadata = std::fs::metadata(path).map_err(|e| TransferError::Io {
        context: format!("cannot access source file '{}'", path.display()),
        source: e,
    })?;

    if !metadata.is_file() {
        return Err(TransferError::configuration(format!(
            "source '{}' is not a regular file",
            path.display()
        )));
    }

    let size = metadata.len();
    if size > max_size {
        return Err(TransferError::FileTooLarge {
            size,
            limit: max_size,
        });
    }

    Ok(size)
}

/// Turns an empty table listing into [`TransferError::NoTablesFound`].
pub(crate) fn require_tables(tables: Vec<TableName>) -> Result<Vec<TableName>> {
    if tables.is_empty() {
        Err(TransferError::NoTablesFound)
    } else {
        Ok(tables)
    }
}
