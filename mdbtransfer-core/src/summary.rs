//! Aggregate view over a run's results.

use crate::models::{TransferResult, TransferStatus};
use serde::Serialize;

/// Banner shown when no table failed
pub const BANNER_SUCCESS: &str = "Transfer completed successfully!";
/// Banner shown when at least one Error result exists
pub const BANNER_WITH_ERRORS: &str = "Transfer completed with errors";

/// Counts and totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    /// Result records, including a run-level failure record
    pub tables: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Rows written across all tables
    pub total_records: u64,
}

impl TransferSummary {
    /// Summarizes a result list.
    pub fn from_results(results: &[TransferResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.tables = summary.tables.saturating_add(1);
            match result.status() {
                TransferStatus::Success => summary.succeeded = summary.succeeded.saturating_add(1),
                TransferStatus::Skipped => summary.skipped = summary.skipped.saturating_add(1),
                TransferStatus::Error => summary.failed = summary.failed.saturating_add(1),
            }
            summary.total_records = summary.total_records.saturating_add(result.records());
            summary
        })
    }

    /// Returns true if any result is an Error.
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    /// Overall outcome line.
    pub fn banner(&self) -> &'static str {
        if self.has_errors() {
            BANNER_WITH_ERRORS
        } else {
            BANNER_SUCCESS
        }
    }
}
