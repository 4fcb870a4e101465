//! Progress reporting through the log.

use mdbtransfer_core::{ProgressSink, TransferResult, TransferStatus};
use tracing::{info, warn};

/// Logs one line per finished table with the overall fraction done
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

/// Completed fraction as a whole percentage.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let fraction = (completed as f64 / total as f64).clamp(0.0, 1.0);
    (fraction * 100.0).round() as u8
}

impl ProgressSink for LogProgress {
    fn table_finished(&self, completed: usize, total: usize, result: &TransferResult) {
        let table = result.table().map_or("(run)", |t| t.as_str());
        let percent = percent(completed, total);
        match result.status() {
            TransferStatus::Error => warn!(
                "[{completed}/{total} {percent}%] {table}: {}",
                result.message()
            ),
            status => info!(
                "[{completed}/{total} {percent}%] {table}: {status}, {} records",
                result.records()
            ),
        }
    }
}
