//! Set of tables whose rows are deduplicated against the destination.

use crate::models::TableName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tables whose key column is checked against the destination before insert.
///
/// Names are stored lowercased, so membership ignores the source spelling.
///
/// # Example
/// ```rust
/// use mdbtransfer_core::{IdControlSet, TableName};
///
/// let set = IdControlSet::from_names(["UnmovableCins"]);
/// assert!(set.contains(&TableName::new("UNMOVABLECINS")));
/// assert!(!set.contains(&TableName::new("Owners")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdControlSet(BTreeSet<String>);

impl IdControlSet {
    /// Builds the set from table names in any spelling.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    /// Adds a table name.
    pub fn insert(&mut self, name: &str) {
        let name = name.trim().to_lowercase();
        if !name.is_empty() {
            self.0.insert(name);
        }
    }

    /// Returns true if the table is ID-controlled.
    pub fn contains(&self, table: &TableName) -> bool {
        self.0.contains(&table.destination_name())
    }

    /// Number of configured tables.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no table is ID-controlled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercased names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for IdControlSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_names(iter)
    }
}
