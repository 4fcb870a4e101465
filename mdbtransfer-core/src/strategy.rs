//! Per-table create/append/filter/skip decision.
//!
//! Decision order for one table:
//!
//! 1. No rows: `Skipped`, nothing written.
//! 2. ID-controlled: create the table if absent and load everything,
//!    otherwise append only rows whose key is not on the destination yet.
//!    The key column is only required once the destination table exists.
//! 3. Anything else: create the table if absent, then append all rows,
//!    unless [`ExistingTablePolicy::SkipPopulated`] applies.
//!
//! Every failure is folded into an `Error` result for the table.

use crate::config::{ExistingTablePolicy, IdControlSet, TransferConfig};
use crate::destination::Destination;
use crate::error::TransferError;
use crate::keys::ExistingKeyLookup;
use crate::models::{RowSet, TableName, TableState, TransferResult};
use crate::Result;

/// Message for a table with no source rows
pub const MSG_EMPTY_TABLE: &str = "Empty table";
/// Message for a table written without errors
pub const MSG_TRANSFERRED: &str = "Transferred successfully";
/// Message for an ID-controlled table whose rows are all present already
pub const MSG_NO_NEW_RECORDS: &str = "No new records to transfer";
/// Message for a populated table left alone by policy
pub const MSG_ALREADY_POPULATED: &str = "Destination table already populated";

/// Decides and executes the write for one table.
#[derive(Debug, Clone)]
pub struct TableSyncStrategy {
    id_control: IdControlSet,
    key_lookup: ExistingKeyLookup,
    policy: ExistingTablePolicy,
}

impl TableSyncStrategy {
    /// Creates the strategy from the run configuration.
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            id_control: config.id_control.clone(),
            key_lookup: ExistingKeyLookup::new(config.key_column.clone()),
            policy: config.existing_table_policy,
        }
    }

    /// Applies the decision policy to one table's rows.
    ///
    /// Always returns a result; errors become `Error` results carrying the
    /// error message and zero records.
    pub async fn apply(
        &self,
        table: &TableName,
        rows: RowSet,
        destination: &dyn Destination,
    ) -> TransferResult {
        match self.try_apply(table, rows, destination).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Table {} failed: {}", table, e);
                TransferResult::error(table.clone(), e.detailed_message())
            }
        }
    }

    async fn try_apply(
        &self,
        table: &TableName,
        mut rows: RowSet,
        destination: &dyn Destination,
    ) -> Result<TransferResult> {
        if rows.is_empty() {
            tracing::info!("Table {} is empty, skipping", table);
            return Ok(TransferResult::skipped(table.clone(), MSG_EMPTY_TABLE));
        }

        let target = table.destination_name();
        let state = destination.table_state(&target).await?;

        if self.id_control.contains(table) {
            if state.exists() {
                let key_index =
                    rows.column_index(self.key_lookup.key_column()).ok_or_else(|| {
                        TransferError::MissingKeyColumn {
                            table: table.to_string(),
                            column: self.key_lookup.key_column().to_string(),
                        }
                    })?;
                let existing = self.key_lookup.existing_ids(destination, &target).await;
                let before = rows.len();
                rows.retain(|row| {
                    row[key_index]
                        .key()
                        .is_none_or(|key| !existing.contains(&key))
                });
                tracing::info!(
                    "Table {}: {} of {} row(s) are new",
                    table,
                    rows.len(),
                    before
                );

                if rows.is_empty() {
                    return Ok(TransferResult::success(table.clone(), 0, MSG_NO_NEW_RECORDS));
                }
            } else {
                tracing::info!("Creating ID-controlled table {}", target);
                destination.create_table(&target, rows.columns()).await?;
            }
        } else {
            match (state, self.policy) {
                (TableState::Absent, _) => {
                    tracing::info!("Creating table {}", target);
                    destination.create_table(&target, rows.columns()).await?;
                }
                (TableState::Populated, ExistingTablePolicy::SkipPopulated) => {
                    tracing::info!("Table {} already populated, skipping", target);
                    return Ok(TransferResult::skipped(table.clone(), MSG_ALREADY_POPULATED));
                }
                _ => {}
            }
        }

        let written = destination.append_rows(&target, &rows).await?;
        tracing::info!("Wrote {} row(s) to {}", written, target);
        Ok(TransferResult::success(table.clone(), written, MSG_TRANSFERRED))
    }
}
