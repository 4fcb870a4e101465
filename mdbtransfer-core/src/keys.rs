//! Existing-key lookup for ID-controlled tables.
//!
//! The lookup is permissive: a table that does not exist yet, an empty
//! table, a table without the key column and a failing query all yield an
//! empty key set. Only the last two are logged, at `warn!`.

use crate::destination::Destination;
use crate::models::{KeyValue, TableState};
use std::collections::HashSet;

/// Fetches key values already present on the destination.
#[derive(Debug, Clone)]
pub struct ExistingKeyLookup {
    key_column: String,
}

impl ExistingKeyLookup {
    /// Creates a lookup for the given key column name (matched ignoring case).
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
        }
    }

    /// Key column name as configured.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Returns the set of key values stored in `table`.
    ///
    /// `table` is the case-folded destination name. Never fails; see the
    /// module documentation for what degrades to an empty set.
    pub async fn existing_ids(&self, destination: &dyn Destination, table: &str) -> HashSet<KeyValue> {
        match destination.table_state(table).await {
            Ok(TableState::Populated) => {}
            Ok(TableState::Absent | TableState::Empty) => return HashSet::new(),
            Err(e) => {
                tracing::warn!("Could not inspect {}, assuming no existing keys: {}", table, e);
                return HashSet::new();
            }
        }

        let column = match destination.key_column(table, &self.key_column).await {
            Ok(Some(column)) => column,
            Ok(None) => {
                tracing::warn!(
                    "Table {} has no '{}' column, assuming no existing keys",
                    table,
                    self.key_column
                );
                return HashSet::new();
            }
            Err(e) => {
                tracing::warn!("Could not resolve key column of {}: {}", table, e);
                return HashSet::new();
            }
        };

        match destination.existing_keys(table, &column).await {
            Ok(keys) => {
                tracing::debug!("Found {} existing key(s) in {}", keys.len(), table);
                keys
            }
            Err(e) => {
                tracing::warn!("Existing-key query on {} failed, assuming none: {}", table, e);
                HashSet::new()
            }
        }
    }
}
