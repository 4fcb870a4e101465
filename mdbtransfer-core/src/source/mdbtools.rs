//! Reader backed by the mdbtools command-line utilities.
//!
//! `mdb-tables -1 <file>` prints one table name per line and
//! `mdb-export -D <format> <file> <table>` prints the table as CSV with a
//! header row. Output is captured from stdout, so no temporary files are
//! left behind. A non-zero exit status is a failure whose diagnostic is
//! the tool's stderr.

use super::type_inference::{EXPORT_DATETIME_FORMAT, infer_column_type, parse_cell};
use super::{SourceKind, SourceReader, require_tables};
use crate::config::SourceConfig;
use crate::error::TransferError;
use crate::models::{CellValue, ColumnSpec, RowSet, TableName};
use crate::Result;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Source reader that shells out to `mdb-tables` and `mdb-export`.
#[derive(Debug, Clone)]
pub struct MdbToolsReader {
    path: PathBuf,
    tables_command: String,
    export_command: String,
}

impl MdbToolsReader {
    /// Creates a reader for one Access file.
    pub fn new(path: &Path, config: &SourceConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            tables_command: config.tables_command.clone(),
            export_command: config.export_command.clone(),
        }
    }

    /// Runs a tool to completion and returns its stdout.
    async fn run_tool(&self, program: &str, args: &[&OsStr]) -> Result<Vec<u8>> {
        tracing::debug!("Running {} with {} argument(s)", program, args.len());

        let output: Output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TransferError::ExtractionUnavailable {
                tool: program.to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(TransferError::extraction(program, message));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl SourceReader for MdbToolsReader {
    async fn list_tables(&self) -> Result<Vec<TableName>> {
        let stdout = self
            .run_tool(&self.tables_command, &[OsStr::new("-1"), self.path.as_os_str()])
            .await?;

        let tables = parse_table_listing(&String::from_utf8_lossy(&stdout));
        tracing::info!("Found {} table(s) in {}", tables.len(), self.path.display());
        require_tables(tables)
    }

    async fn read_table(&self, table: &TableName) -> Result<RowSet> {
        let stdout = self
            .run_tool(
                &self.export_command,
                &[
                    OsStr::new("-D"),
                    OsStr::new(EXPORT_DATETIME_FORMAT),
                    self.path.as_os_str(),
                    OsStr::new(table.as_str()),
                ],
            )
            .await?;

        parse_export(table, &stdout)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::MdbTools
    }
}

/// Splits `mdb-tables -1` output into table names, dropping blank lines.
pub fn parse_table_listing(stdout: &str) -> Vec<TableName> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(TableName::from)
        .collect()
}

/// Parses `mdb-export` CSV output into a typed row set.
///
/// The header row supplies column names. Column types are inferred from
/// all values of each column; empty cells become NULL. Output with a header
/// but no data rows is an empty table.
///
/// # Errors
/// Returns [`TransferError::SourceRead`] for malformed CSV
pub fn parse_export(table: &TableName, stdout: &[u8]) -> Result<RowSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(stdout);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| TransferError::source_read(table.as_str(), "invalid export header", e))?
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|e| {
            TransferError::source_read(
                table.as_str(),
                format!("malformed export row {}", index.saturating_add(1)),
                e,
            )
        })?;
        raw_rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    let columns: Vec<ColumnSpec> = headers
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let column_type = infer_column_type(raw_rows.iter().map(|row| row[index].as_str()));
            ColumnSpec::new(name.clone(), column_type)
        })
        .collect();

    let rows: Vec<Vec<CellValue>> = raw_rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&columns)
                .map(|(raw, column)| parse_cell(raw, column.column_type))
                .collect()
        })
        .collect();

    tracing::debug!(
        "Exported table {} with {} row(s) and {} column(s)",
        table,
        raw_rows.len(),
        columns.len()
    );

    RowSet::new(columns, rows)
}
