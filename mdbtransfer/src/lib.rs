//! Library module for the mdbtransfer command-line tool.
//!
//! Argument definitions, credential resolution and configuration assembly
//! live here so they can be tested without spawning the binary. The
//! binary itself is in main.rs.

pub mod output;
pub mod progress;

use clap::{Args, Parser, Subcommand};
use mdbtransfer_core::config::{
    DEFAULT_KEY_COLUMN, DestinationConfig, ExistingTablePolicy, IdControlSet, ReaderSelection,
    SourceConfig, TransferConfig,
};
use mdbtransfer_core::{Result, TransferError};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Tables deduplicated by key unless overridden
pub const DEFAULT_ID_TABLES: &str = "unmovablemaincins,unmovablecins";

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "mdbtransfer")]
#[command(about = "Transfer Access database files into PostgreSQL")]
#[command(version)]
#[command(long_about = "
mdbtransfer - table-by-table transfer from Access (.mdb/.accdb) files into PostgreSQL

Every table of the source file is copied into a lower-cased table of the
same name. Tables in the ID-controlled set only receive rows whose key is
not already present, so repeated runs do not duplicate them.

CREDENTIALS:
  Set DATABASE_URL or pass --database-url-file. Passwords are never logged.

EXAMPLES:
  DATABASE_URL=postgres://app@localhost/registry mdbtransfer transfer registry.mdb
  mdbtransfer --database-url-file ~/.pgurl check
  mdbtransfer tables registry.mdb
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transfer every table of a source file
    Transfer(TransferArgs),
    /// Test the destination connection only
    Check,
    /// List the tables of a source file
    Tables(TablesArgs),
}

/// Flags shared by every command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Path to file containing the destination URL
    #[arg(long, global = true, value_name = "FILE")]
    pub database_url_file: Option<PathBuf>,
}

/// Source file selection shared by `transfer` and `tables`
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Access database file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Reader used to extract rows
    #[arg(long, default_value = "auto", help = "Reader: auto, mdbtools or sqlite")]
    pub reader: ReaderSelection,

    /// Largest accepted source file in bytes
    #[arg(long, env = "MDBTRANSFER_MAX_FILE_SIZE", default_value_t = mdbtransfer_core::config::DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Table listing command
    #[arg(long, default_value = "mdb-tables", hide = true)]
    pub tables_command: String,

    /// Table export command
    #[arg(long, default_value = "mdb-export", hide = true)]
    pub export_command: String,
}

impl SourceArgs {
    /// Reader configuration for these arguments.
    pub fn source_config(&self) -> SourceConfig {
        SourceConfig::default()
            .with_reader(self.reader)
            .with_commands(self.tables_command.clone(), self.export_command.clone())
    }
}

/// Arguments of the `transfer` command
#[derive(Debug, Args)]
pub struct TransferArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Tables whose rows are deduplicated by key
    #[arg(
        long,
        env = "MDBTRANSFER_ID_TABLES",
        value_delimiter = ',',
        default_value = DEFAULT_ID_TABLES
    )]
    pub id_tables: Vec<String>,

    /// Key column of ID-controlled tables
    #[arg(long, default_value = DEFAULT_KEY_COLUMN)]
    pub key_column: String,

    /// Handling of populated tables outside the ID-controlled set
    #[arg(long, default_value = "append", help = "append or skip-populated")]
    pub existing_tables: ExistingTablePolicy,

    /// Rows per INSERT statement
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Result rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments of the `tables` command
#[derive(Debug, Args)]
pub struct TablesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Where the destination URL came from
#[derive(Debug)]
pub enum CredentialSource {
    /// Credentials loaded from environment variable
    Environment,
    /// Credentials loaded from file
    File(PathBuf),
}

/// Get the destination URL from the environment or a file.
///
/// `DATABASE_URL` wins over `--database-url-file`. The URL is opaque here:
/// only blank values are rejected, the connection layer judges the rest.
///
/// # Errors
///
/// Returns a configuration error if the chosen source is blank or neither
/// source is present. The URL itself never appears in the error.
pub fn get_database_url(
    database_url_file: Option<PathBuf>,
) -> Result<(String, CredentialSource)> {
    if let Ok(url) = env::var("DATABASE_URL") {
        if validate_database_url(&url) {
            return Ok((url.trim().to_string(), CredentialSource::Environment));
        }
        return Err(TransferError::configuration(
            "DATABASE_URL is invalid: the variable is set but blank",
        ));
    }

    if let Some(file_path) = database_url_file {
        let contents = fs::read_to_string(&file_path).map_err(|e| TransferError::Io {
            context: format!("Failed to read database URL file {}", file_path.display()),
            source: e,
        })?;
        let url = contents.trim();
        if validate_database_url(url) {
            return Ok((url.to_string(), CredentialSource::File(file_path)));
        }
        return Err(TransferError::configuration(format!(
            "Invalid database URL in file {}: the file is blank",
            file_path.display()
        )));
    }

    Err(TransferError::configuration(
        "Database connection information required. Set DATABASE_URL environment variable or use --database-url-file.",
    ))
}

/// Checks that a destination URL is present.
#[must_use]
pub fn validate_database_url(url: &str) -> bool {
    !url.trim().is_empty()
}

/// Destination configuration for a resolved URL.
pub fn destination_config(url: String, batch_size: Option<usize>) -> DestinationConfig {
    let config = DestinationConfig::new(url);
    match batch_size {
        Some(size) => config.with_batch_size(size),
        None => config,
    }
}

/// Assembles the run configuration for `transfer`.
///
/// # Errors
///
/// Returns the first invalid setting found
pub fn build_transfer_config(args: &TransferArgs, url: String) -> Result<TransferConfig> {
    let config = TransferConfig::new(destination_config(url, args.batch_size))
        .with_source(args.source.source_config())
        .with_id_control(IdControlSet::from_names(&args.id_tables))
        .with_key_column(args.key_column.clone())
        .with_existing_table_policy(args.existing_tables)
        .with_max_file_size(args.source.max_file_size);
    config.validate()?;
    Ok(config)
}
