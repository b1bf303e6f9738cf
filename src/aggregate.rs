//! Grouped counts over a task table.
//!
//! Group keys are the raw cell values (a blank status is its own group) and
//! every summary is ordered by key ascending.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::table::TaskTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerCount {
    pub owner: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCount {
    pub validated: String,
    pub count: usize,
    /// Share of the table, in percent rounded to two places.
    pub percent: f64,
}

/// Owner x status cross-tabulation, zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusOwnerMatrix {
    /// Column keys.
    pub statuses: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub owner: String,
    /// One count per entry of [`StatusOwnerMatrix::statuses`].
    pub counts: Vec<usize>,
}

impl StatusOwnerMatrix {
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.owner.as_str())
    }

    /// Cell value, `None` when the owner or status is not part of the matrix.
    pub fn get(&self, owner: &str, status: &str) -> Option<usize> {
        let col = self.statuses.iter().position(|entry| entry == status)?;
        let row = self.rows.iter().find(|row| row.owner == owner)?;
        row.counts.get(col).copied()
    }

    pub fn total(&self) -> usize {
        self.rows.iter().flat_map(|row| row.counts.iter()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn by_status(table: &TaskTable) -> Vec<StatusCount> {
    count_by(table.iter().map(|record| record.status.as_str()))
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

pub fn by_owner(table: &TaskTable) -> Vec<OwnerCount> {
    count_by(table.iter().map(|record| record.owner.as_str()))
        .into_iter()
        .map(|(owner, count)| OwnerCount { owner, count })
        .collect()
}

pub fn by_validation(table: &TaskTable) -> Vec<ValidationCount> {
    let total = table.len();
    count_by(table.iter().map(|record| record.validated.as_str()))
        .into_iter()
        .map(|(validated, count)| ValidationCount {
            validated,
            count,
            percent: ratio_pct(count as f64, total as f64),
        })
        .collect()
}

pub fn status_owner_matrix(table: &TaskTable) -> StatusOwnerMatrix {
    let mut cells: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut statuses: BTreeSet<&str> = BTreeSet::new();
    for record in table {
        statuses.insert(record.status.as_str());
        *cells
            .entry(record.owner.as_str())
            .or_default()
            .entry(record.status.as_str())
            .or_insert(0) += 1;
    }

    let statuses: Vec<&str> = statuses.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(owner, counts)| MatrixRow {
            owner: owner.to_string(),
            counts: statuses
                .iter()
                .map(|status| counts.get(status).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    StatusOwnerMatrix {
        statuses: statuses.into_iter().map(str::to_string).collect(),
        rows,
    }
}

fn count_by<'a>(keys: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

pub(crate) fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator <= f64::EPSILON {
        0.0
    } else {
        round2((numerator / denominator) * 100.0)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
