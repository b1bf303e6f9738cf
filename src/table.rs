//! In-memory task table.
//!
//! A [`TaskTable`] is built once per load and never mutated; filtering
//! produces a new table.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One row of the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub status: String,
    /// Owner, read from the `assigned` column.
    pub owner: String,
    /// Raw `Validate (Y/N)` value, blank when absent.
    pub validated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDateTime>,
}

impl TaskRecord {
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            owner: owner.into(),
            validated: String::new(),
            result: None,
            notes: None,
            assigned_date: None,
            completed_date: None,
        }
    }

    pub fn with_validated(mut self, validated: impl Into<String>) -> Self {
        self.validated = validated.into();
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_assigned(mut self, date: NaiveDate) -> Self {
        self.assigned_date = Some(start_of_day(date));
        self
    }

    pub fn with_completed(mut self, date: NaiveDate) -> Self {
        self.completed_date = Some(start_of_day(date));
        self
    }
}

/// Midnight on `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// Ordered, read-only sequence of task records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskTable {
    records: Vec<TaskRecord>,
}

impl TaskTable {
    pub fn new(records: Vec<TaskRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct statuses in first-seen order. Empty cells are left out;
    /// whitespace-only values are kept.
    pub fn observed_statuses(&self) -> Vec<String> {
        distinct_non_empty(self.records.iter().map(|record| record.status.as_str()))
    }

    /// Distinct owners in first-seen order, skipping empty cells.
    pub fn observed_owners(&self) -> Vec<String> {
        distinct_non_empty(self.records.iter().map(|record| record.owner.as_str()))
    }
}

impl FromIterator<TaskRecord> for TaskTable {
    fn from_iter<I: IntoIterator<Item = TaskRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TaskTable {
    type Item = &'a TaskRecord;
    type IntoIter = std::slice::Iter<'a, TaskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn distinct_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}
