//! Core transfer engine for mdbtransfer.
//!
//! Moves every table of a legacy desktop database file into PostgreSQL,
//! one table at a time, and reports a result per table.
//!
//! # Guarantees
//! - One failing table never aborts the run; destination connectivity and
//!   table enumeration failures do, with a single result
//! - Tables listed in the [`IdControlSet`] are deduplicated on their key
//!   column, so re-runs only insert new keys
//! - Destination table names are always lowercase
//! - Connection strings are never logged or shown unredacted
//!
//! # Architecture
//! - [`source`]: readers for the source file (mdbtools export tools, SQLite)
//! - [`destination`]: the destination seam and its PostgreSQL implementation
//! - [`keys`], [`strategy`]: existing-key lookup and per-table decisions
//! - [`preflight`], [`orchestrator`]: the run itself
//! - [`summary`]: aggregate view for presentation

pub mod config;
pub mod destination;
pub mod error;
pub mod helpers;
pub mod keys;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod preflight;
pub mod source;
pub mod strategy;
pub mod summary;

// Re-export commonly used types
pub use config::{
    DestinationConfig, ExistingTablePolicy, IdControlSet, ReaderSelection, SourceConfig,
    TransferConfig,
};
pub use destination::{Destination, create_destination};
pub use error::{Result, TransferError};
pub use keys::ExistingKeyLookup;
pub use logging::init_logging;
pub use models::{
    CellValue, ColumnSpec, ColumnType, KeyValue, RowSet, TableName, TableState, TransferResult,
    TransferStatus,
};
pub use orchestrator::{NoProgress, ProgressSink, TransferOrchestrator};
pub use preflight::{PreflightReport, check_destination};
pub use source::{SourceKind, SourceReader, check_source_file, create_reader};
pub use strategy::TableSyncStrategy;
pub use summary::TransferSummary;
