//! In-memory source and destination shared by the engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mdbtransfer_core::models::{CellValue, ColumnSpec, ColumnType, KeyValue, RowSet, TableName, TableState};
use mdbtransfer_core::source::{SourceKind, SourceReader};
use mdbtransfer_core::{Destination, Result, TransferError, TransferResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Default)]
struct DestinationState {
    tables: BTreeMap<String, MemoryTable>,
    writes: usize,
    closed: bool,
}

/// Destination that keeps tables in memory and counts every write.
#[derive(Debug, Default)]
pub struct MemoryDestination {
    state: Mutex<DestinationState>,
    unreachable: bool,
    failing_tables: HashSet<String>,
    failing_key_column: bool,
    failing_key_query: bool,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination whose connectivity check always fails.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Appends to `table` fail with a type mismatch.
    pub fn failing_on(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    /// Key column resolution fails with a destination error.
    pub fn failing_key_column(mut self) -> Self {
        self.failing_key_column = true;
        self
    }

    /// Existing-key queries fail with a destination error.
    pub fn failing_key_query(mut self) -> Self {
        self.failing_key_query = true;
        self
    }

    /// Pre-creates a table as if an earlier tool had made it.
    pub fn with_table(self, name: &str, columns: Vec<ColumnSpec>, rows: Vec<Vec<CellValue>>) -> Self {
        self.lock()
            .tables
            .insert(name.to_string(), MemoryTable { columns, rows });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DestinationState> {
        self.state.lock().unwrap()
    }

    pub fn table(&self, name: &str) -> Option<MemoryTable> {
        self.lock().tables.get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.lock().tables.keys().cloned().collect()
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.table(name).map_or(0, |t| t.rows.len())
    }

    /// Keys of `column` in stored order, duplicates included.
    pub fn keys(&self, name: &str, column: &str) -> Vec<KeyValue> {
        let Some(table) = self.table(name) else {
            return Vec::new();
        };
        let Some(index) = table
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(column))
        else {
            return Vec::new();
        };
        table.rows.iter().filter_map(|row| row[index].key()).collect()
    }

    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn check_connectivity(&self) -> Result<String> {
        if self.unreachable {
            return Err(TransferError::connection_failed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        Ok("MemoryDB 1.0".to_string())
    }

    async fn table_state(&self, table: &str) -> Result<TableState> {
        Ok(match self.lock().tables.get(table) {
            None => TableState::Absent,
            Some(t) if t.rows.is_empty() => TableState::Empty,
            Some(_) => TableState::Populated,
        })
    }

    async fn key_column(&self, table: &str, column: &str) -> Result<Option<String>> {
        if self.failing_key_column {
            return Err(TransferError::destination_failed(
                format!("key column lookup on '{table}' failed"),
                std::io::Error::other("permission denied for table"),
            ));
        }
        Ok(self.lock().tables.get(table).and_then(|t| {
            t.columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(column))
                .map(|c| c.name.clone())
        }))
    }

    async fn existing_keys(&self, table: &str, column: &str) -> Result<HashSet<KeyValue>> {
        if self.failing_key_query {
            return Err(TransferError::destination_failed(
                format!("existing key query on '{table}' failed"),
                std::io::Error::other("canceling statement due to statement timeout"),
            ));
        }
        Ok(self.keys(table, column).into_iter().collect())
    }

    async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> Result<()> {
        let mut state = self.lock();
        if state.tables.contains_key(table) {
            return Err(TransferError::destination_failed(
                format!("create table '{table}' failed"),
                std::io::Error::other("relation already exists"),
            ));
        }
        state.tables.insert(
            table.to_string(),
            MemoryTable {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        state.writes += 1;
        Ok(())
    }

    async fn append_rows(&self, table: &str, rows: &RowSet) -> Result<u64> {
        if self.failing_tables.contains(table) {
            return Err(TransferError::type_mismatch("Amount", "BIGINT", "text 'n/a'"));
        }

        let mut state = self.lock();
        let Some(target) = state.tables.get_mut(table) else {
            return Err(TransferError::destination_failed(
                format!("insert into '{table}' failed"),
                std::io::Error::other("relation does not exist"),
            ));
        };

        for source_row in rows.iter() {
            let row = target
                .columns
                .iter()
                .map(|column| source_row.get(&column.name).cloned().unwrap_or(CellValue::Null))
                .collect();
            target.rows.push(row);
        }
        state.writes += 1;
        Ok(rows.len() as u64)
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

/// Source serving prepared row sets.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: Vec<(TableName, RowSet)>,
    unreadable: HashSet<String>,
    listing_fails: bool,
    closed: AtomicBool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, rows: RowSet) -> Self {
        self.tables.push((TableName::new(name), rows));
        self
    }

    /// Reading `name` fails with a source read error.
    pub fn unreadable(mut self, name: &str) -> Self {
        self.unreadable.insert(name.to_string());
        self
    }

    /// Table listing fails as if the export tool were missing.
    pub fn listing_fails(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn list_tables(&self) -> Result<Vec<TableName>> {
        if self.listing_fails {
            return Err(TransferError::ExtractionUnavailable {
                tool: "mdb-tables".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            });
        }
        if self.tables.is_empty() {
            return Err(TransferError::NoTablesFound);
        }
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn read_table(&self, table: &TableName) -> Result<RowSet> {
        if self.unreadable.contains(table.as_str()) {
            return Err(TransferError::extraction("mdb-export", "Error: file is corrupt"));
        }
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| TransferError::extraction("mdb-export", format!("no table {table}")))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::MdbTools
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// `ID, Name` rows for the given ids.
pub fn id_rows(ids: &[i64]) -> RowSet {
    RowSet::new(
        vec![
            ColumnSpec::new("ID", ColumnType::Integer),
            ColumnSpec::new("Name", ColumnType::Text),
        ],
        ids.iter()
            .map(|id| vec![CellValue::Integer(*id), CellValue::Text(format!("parcel-{id}"))])
            .collect(),
    )
    .unwrap()
}

/// `OwnerName, City` rows, no key column.
pub fn owner_rows(names: &[&str]) -> RowSet {
    RowSet::new(
        vec![
            ColumnSpec::new("OwnerName", ColumnType::Text),
            ColumnSpec::new("City", ColumnType::Text),
        ],
        names
            .iter()
            .map(|name| vec![CellValue::Text((*name).to_string()), CellValue::Text("Izmir".to_string())])
            .collect(),
    )
    .unwrap()
}

pub fn empty_rows() -> RowSet {
    RowSet::empty(vec![ColumnSpec::new("ID", ColumnType::Integer)])
}

/// Result of the named table, panicking if absent.
pub fn result_for<'a>(results: &'a [TransferResult], table: &str) -> &'a TransferResult {
    results
        .iter()
        .find(|r| r.table().is_some_and(|t| t.as_str() == table))
        .unwrap_or_else(|| panic!("no result for {table}"))
}
