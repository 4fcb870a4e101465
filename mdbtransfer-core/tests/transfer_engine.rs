//! Orchestrator and table sync behaviour against in-memory collaborators.

mod common;

use common::{
    MemoryDestination, MemorySource, empty_rows, id_rows, owner_rows, result_for,
};
use mdbtransfer_core::config::{DestinationConfig, ExistingTablePolicy, TransferConfig};
use mdbtransfer_core::models::{CellValue, ColumnSpec, ColumnType, KeyValue, RowSet, TransferStatus};
use mdbtransfer_core::orchestrator::{NoProgress, ProgressSink, TransferOrchestrator};
use mdbtransfer_core::{IdControlSet, TransferResult, TransferSummary};
use std::sync::Mutex;

fn config() -> TransferConfig {
    TransferConfig::new(DestinationConfig::new("postgresql://test@localhost/registry"))
        .with_id_control(IdControlSet::from_names(["unmovablemaincins", "unmovablecins"]))
}

async fn run(
    config: &TransferConfig,
    source: &MemorySource,
    destination: &MemoryDestination,
) -> Vec<TransferResult> {
    TransferOrchestrator::new(config)
        .run_with(source, destination, &NoProgress)
        .await
}

#[tokio::test]
async fn test_one_result_per_listed_table() {
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse", "Mehmet"]))
        .with_table("UnmovableCins", id_rows(&[1, 2]))
        .with_table("Archive", empty_rows());
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 3);
    let names: Vec<&str> = results
        .iter()
        .map(|r| r.table().map(|t| t.as_str()).unwrap())
        .collect();
    assert_eq!(names, vec!["Owners", "UnmovableCins", "Archive"]);
}

#[tokio::test]
async fn test_owners_and_unmovable_cins_scenario() {
    let config = config();
    let destination = MemoryDestination::new();

    let first = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .with_table("UnmovableCins", id_rows(&[1, 2]));
    let results = run(&config, &first, &destination).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.status() == TransferStatus::Success));
    assert_eq!(result_for(&results, "UnmovableCins").records(), 2);
    assert_eq!(destination.row_count("unmovablecins"), 2);

    let second = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .with_table("UnmovableCins", id_rows(&[1, 2, 3]));
    let results = run(&config, &second, &destination).await;

    let cins = result_for(&results, "UnmovableCins");
    assert_eq!(cins.status(), TransferStatus::Success);
    assert_eq!(cins.records(), 1);
    assert_eq!(
        destination.keys("unmovablecins", "ID"),
        vec![KeyValue::new("1"), KeyValue::new("2"), KeyValue::new("3")]
    );
}

#[tokio::test]
async fn test_id_controlled_rerun_is_idempotent() {
    let config = config();
    let destination = MemoryDestination::new();
    let source = MemorySource::new().with_table("UnmovableMainCins", id_rows(&[10, 11, 12]));

    run(&config, &source, &destination).await;
    let results = run(&config, &source, &destination).await;

    let result = result_for(&results, "UnmovableMainCins");
    assert_eq!(result.status(), TransferStatus::Success);
    assert_eq!(result.records(), 0);
    assert_eq!(result.message(), "No new records to transfer");
    assert_eq!(destination.row_count("unmovablemaincins"), 3);
}

#[tokio::test]
async fn test_plain_tables_duplicate_on_rerun() {
    let config = config();
    let destination = MemoryDestination::new();
    let source = MemorySource::new().with_table("Owners", owner_rows(&["Ayse", "Mehmet"]));

    run(&config, &source, &destination).await;
    let results = run(&config, &source, &destination).await;

    assert_eq!(result_for(&results, "Owners").records(), 2);
    assert_eq!(destination.row_count("owners"), 4);
}

#[tokio::test]
async fn test_skip_populated_policy_leaves_plain_tables_alone() {
    let config = config().with_existing_table_policy(ExistingTablePolicy::SkipPopulated);
    let destination = MemoryDestination::new();
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse", "Mehmet"]))
        .with_table("UnmovableCins", id_rows(&[1]));

    run(&config, &source, &destination).await;
    let results = run(&config, &source, &destination).await;

    let owners = result_for(&results, "Owners");
    assert_eq!(owners.status(), TransferStatus::Skipped);
    assert_eq!(owners.message(), "Destination table already populated");
    assert_eq!(destination.row_count("owners"), 2);

    // ID-controlled tables still go through key filtering
    assert_eq!(result_for(&results, "UnmovableCins").status(), TransferStatus::Success);
}

#[tokio::test]
async fn test_empty_table_is_skipped_without_writes() {
    let source = MemorySource::new().with_table("Archive", empty_rows());
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status(), TransferStatus::Skipped);
    assert_eq!(results[0].records(), 0);
    assert_eq!(results[0].message(), "Empty table");
    assert_eq!(destination.writes(), 0);
    assert!(destination.table_names().is_empty());
}

#[tokio::test]
async fn test_table_names_fold_to_lowercase() {
    let source = MemorySource::new()
        .with_table("Assets", owner_rows(&["Ayse"]))
        .with_table("ASSETS", owner_rows(&["Mehmet"]));
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert!(results.iter().all(|r| r.status() == TransferStatus::Success));
    assert_eq!(destination.table_names(), vec!["assets".to_string()]);
    assert_eq!(destination.row_count("assets"), 2);
}

#[tokio::test]
async fn test_unreachable_destination_aborts_run() {
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .with_table("UnmovableCins", id_rows(&[1]));
    let destination = MemoryDestination::unreachable();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status(), TransferStatus::Error);
    assert!(results[0].table().is_none());
    assert!(results[0].message().contains("connection refused"));
    assert_eq!(destination.writes(), 0);
    assert!(destination.is_closed());
    assert!(source.is_closed());
}

#[tokio::test]
async fn test_no_tables_aborts_run() {
    let source = MemorySource::new();
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
    assert_eq!(results[0].message(), "No tables found in the database");
    assert!(destination.is_closed());
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .listing_fails();
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
    assert!(results[0].message().contains("mdb-tables"));
    assert_eq!(destination.writes(), 0);
}

#[tokio::test]
async fn test_one_failing_table_does_not_stop_the_run() {
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .with_table("Payments", owner_rows(&["Mehmet"]))
        .with_table("UnmovableCins", id_rows(&[1, 2]))
        .with_table("Archive", empty_rows())
        .with_table("Parcels", owner_rows(&["Zeynep", "Can"]));
    let destination = MemoryDestination::new().failing_on("payments");

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 5);
    let payments = result_for(&results, "Payments");
    assert_eq!(payments.status(), TransferStatus::Error);
    assert_eq!(payments.records(), 0);
    assert!(payments.message().contains("Type mismatch"));

    assert_eq!(result_for(&results, "Owners").status(), TransferStatus::Success);
    assert_eq!(result_for(&results, "UnmovableCins").status(), TransferStatus::Success);
    assert_eq!(result_for(&results, "Archive").status(), TransferStatus::Skipped);
    assert_eq!(result_for(&results, "Parcels").records(), 2);

    let summary = TransferSummary::from_results(&results);
    assert!(summary.has_errors());
    assert_eq!(summary.banner(), "Transfer completed with errors");
}

#[tokio::test]
async fn test_unreadable_table_is_isolated() {
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .with_table("Broken", owner_rows(&["x"]))
        .unreadable("Broken");
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results.len(), 2);
    let broken = result_for(&results, "Broken");
    assert!(broken.is_error());
    assert!(broken.message().contains("file is corrupt"));
    assert_eq!(result_for(&results, "Owners").status(), TransferStatus::Success);
}

#[tokio::test]
async fn test_id_controlled_first_load_without_key_column_succeeds() {
    let source = MemorySource::new().with_table("UnmovableCins", owner_rows(&["Ayse", "Mehmet"]));
    let destination = MemoryDestination::new();

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results[0].status(), TransferStatus::Success);
    assert_eq!(results[0].records(), 2);
    assert_eq!(destination.table_names(), vec!["unmovablecins"]);
    assert_eq!(destination.row_count("unmovablecins"), 2);
}

#[tokio::test]
async fn test_id_controlled_existing_table_without_key_column_fails() {
    let destination = MemoryDestination::new().with_table(
        "unmovablecins",
        vec![
            ColumnSpec::new("OwnerName", ColumnType::Text),
            ColumnSpec::new("City", ColumnType::Text),
        ],
        vec![vec![CellValue::Text("Ayse".into()), CellValue::Text("Izmir".into())]],
    );
    let source = MemorySource::new().with_table("UnmovableCins", owner_rows(&["Mehmet"]));

    let results = run(&config(), &source, &destination).await;

    assert!(results[0].is_error());
    assert!(results[0].message().contains("Key column 'ID' not found"));
    assert_eq!(destination.writes(), 0);
    assert_eq!(destination.row_count("unmovablecins"), 1);
}

#[tokio::test]
async fn test_existing_lowercase_key_column_is_matched() {
    let destination = MemoryDestination::new().with_table(
        "unmovablecins",
        vec![
            ColumnSpec::new("id", ColumnType::Integer),
            ColumnSpec::new("name", ColumnType::Text),
        ],
        vec![vec![CellValue::Integer(1), CellValue::Text("parcel-1".into())]],
    );
    let source = MemorySource::new().with_table("UnmovableCins", id_rows(&[1, 2]));

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results[0].records(), 1);
    assert_eq!(destination.row_count("unmovablecins"), 2);
}

#[tokio::test]
async fn test_existing_empty_id_table_receives_all_rows() {
    let destination = MemoryDestination::new().with_table(
        "unmovablecins",
        vec![ColumnSpec::new("ID", ColumnType::Integer)],
        Vec::new(),
    );
    let source = MemorySource::new().with_table("UnmovableCins", id_rows(&[4, 5]));

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results[0].status(), TransferStatus::Success);
    assert_eq!(results[0].records(), 2);
}

#[tokio::test]
async fn test_rows_with_null_key_are_kept() {
    let config = config();
    let destination = MemoryDestination::new();
    run(
        &config,
        &MemorySource::new().with_table("UnmovableCins", id_rows(&[1])),
        &destination,
    )
    .await;

    let rows = RowSet::new(
        vec![
            ColumnSpec::new("ID", ColumnType::Integer),
            ColumnSpec::new("Name", ColumnType::Text),
        ],
        vec![
            vec![CellValue::Integer(1), CellValue::Text("dup".into())],
            vec![CellValue::Null, CellValue::Text("unnumbered".into())],
        ],
    )
    .unwrap();
    let results = run(
        &config,
        &MemorySource::new().with_table("UnmovableCins", rows),
        &destination,
    )
    .await;

    assert_eq!(results[0].records(), 1);
    assert_eq!(destination.row_count("unmovablecins"), 2);
}

#[derive(Default)]
struct RecordingProgress {
    updates: Mutex<Vec<(usize, usize, String)>>,
}

impl ProgressSink for RecordingProgress {
    fn table_finished(&self, completed: usize, total: usize, result: &TransferResult) {
        let table = result.table().map(|t| t.to_string()).unwrap_or_default();
        self.updates.lock().unwrap().push((completed, total, table));
    }
}

#[tokio::test]
async fn test_progress_reported_after_each_table() {
    let source = MemorySource::new()
        .with_table("Owners", owner_rows(&["Ayse"]))
        .with_table("Archive", empty_rows())
        .with_table("Broken", owner_rows(&["x"]))
        .unreadable("Broken");
    let destination = MemoryDestination::new();
    let progress = RecordingProgress::default();

    TransferOrchestrator::new(&config())
        .run_with(&source, &destination, &progress)
        .await;

    let updates = progress.updates.lock().unwrap().clone();
    assert_eq!(
        updates,
        vec![
            (1, 3, "Owners".to_string()),
            (2, 3, "Archive".to_string()),
            (3, 3, "Broken".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_resources_released_after_success() {
    let source = MemorySource::new().with_table("Owners", owner_rows(&["Ayse"]));
    let destination = MemoryDestination::new();

    run(&config(), &source, &destination).await;

    assert!(source.is_closed());
    assert!(destination.is_closed());
}

#[tokio::test]
async fn test_run_with_missing_source_file_is_fatal() {
    let results = TransferOrchestrator::new(&config())
        .run(std::path::Path::new("/nonexistent/registry.mdb"), &NoProgress)
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_error());
    assert!(results[0].table().is_none());
}

fn populated_id_destination() -> MemoryDestination {
    MemoryDestination::new().with_table(
        "unmovablecins",
        vec![
            ColumnSpec::new("ID", ColumnType::Integer),
            ColumnSpec::new("Name", ColumnType::Text),
        ],
        vec![vec![CellValue::Integer(1), CellValue::Text("parcel-1".into())]],
    )
}

#[tokio::test]
async fn test_failing_existing_key_query_appends_all_rows() {
    let destination = populated_id_destination().failing_key_query();
    let source = MemorySource::new().with_table("UnmovableCins", id_rows(&[1, 2]));

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results[0].status(), TransferStatus::Success);
    assert_eq!(results[0].records(), 2);
    assert_eq!(destination.row_count("unmovablecins"), 3);
}

#[tokio::test]
async fn test_failing_key_column_lookup_appends_all_rows() {
    let destination = populated_id_destination().failing_key_column();
    let source = MemorySource::new().with_table("UnmovableCins", id_rows(&[1, 2]));

    let results = run(&config(), &source, &destination).await;

    assert_eq!(results[0].status(), TransferStatus::Success);
    assert_eq!(results[0].records(), 2);
    assert_eq!(destination.row_count("unmovablecins"), 3);
}
