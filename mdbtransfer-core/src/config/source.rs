//! Source reader configuration.

use serde::{Deserialize, Serialize};

/// Which reader extracts rows from the source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderSelection {
    /// Pick by file extension
    #[default]
    Auto,
    /// Shell out to the mdbtools export utilities
    MdbTools,
    /// Open the file with the SQLite driver
    Sqlite,
}

impl std::str::FromStr for ReaderSelection {
    type Err = crate::error::TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "mdbtools" | "mdb" => Ok(Self::MdbTools),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(crate::error::TransferError::configuration(format!(
                "unknown reader '{other}' (expected auto, mdbtools or sqlite)"
            ))),
        }
    }
}

/// Configuration for reading the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Reader to use
    pub reader: ReaderSelection,
    /// Command that lists tables, one per line
    pub tables_command: String,
    /// Command that exports one table as CSV
    pub export_command: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            reader: ReaderSelection::Auto,
            tables_command: "mdb-tables".to_string(),
            export_command: "mdb-export".to_string(),
        }
    }
}

impl SourceConfig {
    /// Builder method to force a reader.
    pub fn with_reader(mut self, reader: ReaderSelection) -> Self {
        self.reader = reader;
        self
    }

    /// Builder method to override the export tool commands.
    pub fn with_commands(
        mut self,
        tables_command: impl Into<String>,
        export_command: impl Into<String>,
    ) -> Self {
        self.tables_command = tables_command.into();
        self.export_command = export_command.into();
        self
    }

    /// Validates configuration values.
    ///
    /// # Errors
    /// Returns error if a tool command is blank
    pub fn validate(&self) -> crate::Result<()> {
        if self.tables_command.trim().is_empty() || self.export_command.trim().is_empty() {
            return Err(crate::error::TransferError::configuration(
                "export tool commands cannot be empty",
            ));
        }
        Ok(())
    }
}
