//! Transfer orchestration.
//!
//! One run walks every source table in listing order, one at a time:
//!
//! 1. destination preflight (fatal on failure)
//! 2. table listing (fatal on failure or when empty)
//! 3. per table: read, apply the sync strategy, record the result, report
//!    progress
//!
//! A fatal failure yields exactly one result without a table name. The
//! source reader and the destination are closed on every path.

use crate::config::TransferConfig;
use crate::destination::{Destination, create_destination};
use crate::error::TransferError;
use crate::models::{TableName, TransferResult};
use crate::preflight::check_destination;
use crate::source::{SourceReader, check_source_file, create_reader};
use crate::strategy::TableSyncStrategy;
use std::path::Path;
use tracing::Instrument;
use uuid::Uuid;

/// Receives progress after each table.
pub trait ProgressSink: Send + Sync {
    /// Called once per table, after its result is recorded.
    ///
    /// `completed / total` is the fraction of tables processed.
    fn table_finished(&self, completed: usize, total: usize, result: &TransferResult);
}

/// Progress sink that discards updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn table_finished(&self, _completed: usize, _total: usize, _result: &TransferResult) {}
}

/// Runs a whole transfer from one source file to the destination.
///
/// # Example
/// ```rust,no_run
/// use mdbtransfer_core::config::{DestinationConfig, TransferConfig};
/// use mdbtransfer_core::orchestrator::{NoProgress, TransferOrchestrator};
/// use std::path::Path;
///
/// # async fn example() {
/// let config = TransferConfig::new(DestinationConfig::new("postgresql://localhost/registry"));
/// let results = TransferOrchestrator::new(&config)
///     .run(Path::new("registry.mdb"), &NoProgress)
///     .await;
/// println!("{} table(s) processed", results.len());
/// # }
/// ```
#[derive(Debug)]
pub struct TransferOrchestrator<'a> {
    config: &'a TransferConfig,
    strategy: TableSyncStrategy,
}

impl<'a> TransferOrchestrator<'a> {
    /// Creates an orchestrator bound to a configuration.
    pub fn new(config: &'a TransferConfig) -> Self {
        Self {
            config,
            strategy: TableSyncStrategy::new(config),
        }
    }

    /// Transfers every table of `source`.
    ///
    /// Builds the reader and destination from the configuration, then
    /// proceeds as [`Self::run_with`].
    pub async fn run(&self, source: &Path, progress: &dyn ProgressSink) -> Vec<TransferResult> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("transfer", %run_id);

        async {
            tracing::info!(
                "Starting transfer of {} to {}",
                source.display(),
                self.config.destination
            );

            let (reader, destination) = match self.open(source) {
                Ok(handles) => handles,
                Err(e) => return vec![fatal(&e)],
            };

            self.run_with(reader.as_ref(), destination.as_ref(), progress)
                .await
        }
        .instrument(span)
        .await
    }

    /// Transfers every table using already built handles, closing both
    /// before returning.
    pub async fn run_with(
        &self,
        reader: &dyn SourceReader,
        destination: &dyn Destination,
        progress: &dyn ProgressSink,
    ) -> Vec<TransferResult> {
        let results = self.transfer(reader, destination, progress).await;

        reader.close().await;
        destination.close().await;
        tracing::debug!("Released source and destination handles");

        results
    }

    fn open(&self, source: &Path) -> crate::Result<(Box<dyn SourceReader>, Box<dyn Destination>)> {
        self.config.validate()?;

        let size = check_source_file(source, self.config.max_file_size)?;
        tracing::debug!("Source file is {} bytes", size);

        let reader = create_reader(source, &self.config.source)?;
        let destination = create_destination(&self.config.destination)?;
        tracing::info!("Using {} reader", reader.kind());

        Ok((reader, destination))
    }

    async fn transfer(
        &self,
        reader: &dyn SourceReader,
        destination: &dyn Destination,
        progress: &dyn ProgressSink,
    ) -> Vec<TransferResult> {
        if let Err(e) = check_destination(destination).await.into_result() {
            return vec![fatal(&e)];
        }

        let tables = match reader.list_tables().await {
            Ok(tables) if tables.is_empty() => return vec![fatal(&TransferError::NoTablesFound)],
            Ok(tables) => tables,
            Err(e) => return vec![fatal(&e)],
        };

        let total = tables.len();
        let mut results = Vec::with_capacity(total);

        for (index, table) in tables.iter().enumerate() {
            let span = tracing::info_span!("table", table = %table);
            let result = self
                .transfer_table(table, reader, destination)
                .instrument(span)
                .await;

            let completed = index.saturating_add(1);
            progress.table_finished(completed, total, &result);
            results.push(result);
        }

        tracing::info!("Processed {} table(s)", results.len());
        results
    }

    async fn transfer_table(
        &self,
        table: &TableName,
        reader: &dyn SourceReader,
        destination: &dyn Destination,
    ) -> TransferResult {
        tracing::info!("Processing table {}", table);

        match reader.read_table(table).await {
            Ok(rows) => {
                tracing::info!(
                    "Read {} row(s), columns: {:?}",
                    rows.len(),
                    rows.column_names()
                );
                self.strategy.apply(table, rows, destination).await
            }
            Err(e) => {
                tracing::error!("Failed to read table {}: {}", table, e);
                TransferResult::error(table.clone(), e.detailed_message())
            }
        }
    }
}

fn fatal(error: &TransferError) -> TransferResult {
    tracing::error!("Transfer aborted: {}", error);
    TransferResult::fatal(error.detailed_message())
}
