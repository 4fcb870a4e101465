//! Rendering of transfer results for the terminal.

use clap::ValueEnum;
use mdbtransfer_core::{Result, TransferError, TransferResult, TransferSummary};
use serde::Serialize;
use std::fmt::Write as _;

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Itemized list followed by the outcome banner
    #[default]
    Text,
    /// Single JSON document
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    banner: &'static str,
    summary: &'a TransferSummary,
    results: &'a [TransferResult],
}

/// Renders results in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn render(format: OutputFormat, results: &[TransferResult]) -> Result<String> {
    let summary = TransferSummary::from_results(results);
    match format {
        OutputFormat::Text => Ok(render_text(results, &summary)),
        OutputFormat::Json => {
            let report = Report {
                banner: summary.banner(),
                summary: &summary,
                results,
            };
            serde_json::to_string_pretty(&report)
                .map_err(|e| TransferError::serialization("transfer report", e))
        }
    }
}

fn render_text(results: &[TransferResult], summary: &TransferSummary) -> String {
    let mut out = String::new();
    for result in results {
        let table = result.table().map_or("(run)", |t| t.as_str());
        let _ = writeln!(
            out,
            "{table}: {} ({} records) - {}",
            result.status(),
            result.records(),
            result.message()
        );
    }
    let _ = writeln!(
        out,
        "\n{} tables: {} succeeded, {} skipped, {} failed, {} records written",
        summary.tables, summary.succeeded, summary.skipped, summary.failed, summary.total_records
    );
    out.push_str(summary.banner());
    out
}
