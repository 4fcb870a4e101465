//! Configuration types for a transfer run.
//!
//! - `TransferConfig`: everything the orchestrator needs, passed by reference
//! - `DestinationConfig`: destination URL and pool settings
//! - `SourceConfig`: reader selection and export tool commands
//! - `IdControlSet`: tables whose rows are deduplicated by key
//!
//! # Security
//! The destination URL is held in a zeroizing container and only ever
//! displayed in redacted form.

mod destination;
mod id_control;
mod source;
mod transfer;

pub use destination::DestinationConfig;
pub use id_control::IdControlSet;
pub use source::{ReaderSelection, SourceConfig};
pub use transfer::{DEFAULT_KEY_COLUMN, DEFAULT_MAX_FILE_SIZE, ExistingTablePolicy, TransferConfig};
