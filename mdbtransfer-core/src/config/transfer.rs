//! Top-level transfer configuration.

use super::{DestinationConfig, IdControlSet, SourceConfig};
use serde::{Deserialize, Serialize};

/// Default primary key column of ID-controlled tables
pub const DEFAULT_KEY_COLUMN: &str = "ID";

/// Default maximum accepted source file size (1 GiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// What to do with a table that is not ID-controlled and already has rows
/// on the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingTablePolicy {
    /// Append every row again; re-runs duplicate data
    #[default]
    Append,
    /// Leave populated tables alone and report them as skipped
    SkipPopulated,
}

impl std::str::FromStr for ExistingTablePolicy {
    type Err = crate::error::TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "append" => Ok(Self::Append),
            "skip_populated" | "skip" => Ok(Self::SkipPopulated),
            other => Err(crate::error::TransferError::configuration(format!(
                "unknown existing-table policy '{other}' (expected append or skip-populated)"
            ))),
        }
    }
}

/// Everything a transfer run needs.
///
/// Built once by the caller and passed by reference to the orchestrator.
///
/// # Example
/// ```rust
/// use mdbtransfer_core::config::{DestinationConfig, ExistingTablePolicy, TransferConfig};
/// use mdbtransfer_core::IdControlSet;
///
/// let config = TransferConfig::new(DestinationConfig::new("postgresql://localhost/registry"))
///     .with_id_control(IdControlSet::from_names(["unmovablecins"]))
///     .with_existing_table_policy(ExistingTablePolicy::SkipPopulated);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TransferConfig {
    /// Destination connection settings
    pub destination: DestinationConfig,
    /// Source reader settings
    pub source: SourceConfig,
    /// Tables deduplicated by key
    pub id_control: IdControlSet,
    /// Key column name for ID-controlled tables
    pub key_column: String,
    /// Handling of populated tables outside the ID-controlled set
    pub existing_table_policy: ExistingTablePolicy,
    /// Maximum accepted source file size in bytes
    pub max_file_size: u64,
}

impl TransferConfig {
    /// Creates a configuration with default source, policy and limits.
    pub fn new(destination: DestinationConfig) -> Self {
        Self {
            destination,
            source: SourceConfig::default(),
            id_control: IdControlSet::default(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            existing_table_policy: ExistingTablePolicy::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Builder method to set the source configuration.
    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Builder method to set the ID-controlled tables.
    pub fn with_id_control(mut self, id_control: IdControlSet) -> Self {
        self.id_control = id_control;
        self
    }

    /// Builder method to set the key column name.
    pub fn with_key_column(mut self, key_column: impl Into<String>) -> Self {
        self.key_column = key_column.into();
        self
    }

    /// Builder method to set the policy for populated tables.
    pub fn with_existing_table_policy(mut self, policy: ExistingTablePolicy) -> Self {
        self.existing_table_policy = policy;
        self
    }

    /// Builder method to set the file size limit.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    /// Returns the first invalid setting found
    pub fn validate(&self) -> crate::Result<()> {
        self.destination.validate()?;
        self.source.validate()?;

        if self.key_column.trim().is_empty() {
            return Err(crate::error::TransferError::configuration(
                "key column cannot be empty",
            ));
        }

        if self.max_file_size == 0 {
            return Err(crate::error::TransferError::configuration(
                "max_file_size must be greater than 0",
            ));
        }

        Ok(())
    }
}
