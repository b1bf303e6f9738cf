//! Status and owner filtering.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::table::TaskTable;

/// Accepted status and owner values.
///
/// An empty set rejects every row for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub statuses: BTreeSet<String>,
    pub owners: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new<S, O>(statuses: S, owners: O) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            statuses: statuses.into_iter().map(Into::into).collect(),
            owners: owners.into_iter().map(Into::into).collect(),
        }
    }

    /// Every non-empty status and owner observed in `table`.
    pub fn all_observed(table: &TaskTable) -> Self {
        Self::new(table.observed_statuses(), table.observed_owners())
    }

    pub fn accepts(&self, status: &str, owner: &str) -> bool {
        self.statuses.contains(status) && self.owners.contains(owner)
    }
}

/// Rows whose status and owner are both selected, in original order.
pub fn apply(table: &TaskTable, selection: &FilterSelection) -> TaskTable {
    let filtered: TaskTable = table
        .iter()
        .filter(|record| selection.accepts(&record.status, &record.owner))
        .cloned()
        .collect();
    tracing::debug!(
        total = table.len(),
        kept = filtered.len(),
        "applied filter selection"
    );
    filtered
}
