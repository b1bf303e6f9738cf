//! Cycle time and monthly completion trend for done tasks.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::aggregate::round2;
use crate::config::Rules;
use crate::table::TaskTable;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleTimeEntry {
    pub name: String,
    pub owner: String,
    pub status: String,
    pub assigned_date: NaiveDateTime,
    pub completed_date: NaiveDateTime,
    /// Whole days from assignment to completion. Negative when the dates
    /// were entered the wrong way round.
    pub elapsed_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleTimeStats {
    pub count: usize,
    pub mean_days: Option<f64>,
    pub median_days: Option<f64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
}

/// Calendar month key, ordered chronologically and rendered `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDateTime) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: YearMonth,
    pub completed: usize,
}

/// Floor of `(to - from)` in whole days.
pub fn elapsed_days(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Done tasks with both dates, longest first.
///
/// The sort is stable, so equal durations keep table order.
pub fn cycle_times(table: &TaskTable, rules: &Rules) -> Vec<CycleTimeEntry> {
    let mut entries: Vec<CycleTimeEntry> = table
        .iter()
        .filter(|record| rules.is_done(&record.status))
        .filter_map(|record| {
            let assigned = record.assigned_date?;
            let completed = record.completed_date?;
            Some(CycleTimeEntry {
                name: record.name.clone(),
                owner: record.owner.clone(),
                status: record.status.clone(),
                assigned_date: assigned,
                completed_date: completed,
                elapsed_days: elapsed_days(assigned, completed),
            })
        })
        .collect();

    entries.sort_by(|left, right| right.elapsed_days.cmp(&left.elapsed_days));
    entries
}

pub fn stats(entries: &[CycleTimeEntry]) -> CycleTimeStats {
    let count = entries.len();
    if count == 0 {
        return CycleTimeStats {
            count,
            mean_days: None,
            median_days: None,
            min_days: None,
            max_days: None,
        };
    }

    let mut days: Vec<i64> = entries.iter().map(|entry| entry.elapsed_days).collect();
    days.sort_unstable();
    let sum: i64 = days.iter().sum();
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (days[mid - 1] + days[mid]) as f64 / 2.0
    } else {
        days[mid] as f64
    };

    CycleTimeStats {
        count,
        mean_days: Some(round2(sum as f64 / count as f64)),
        median_days: Some(median),
        min_days: days.first().copied(),
        max_days: days.last().copied(),
    }
}

/// Done tasks per completion month, oldest month first.
pub fn monthly_trend(table: &TaskTable, rules: &Rules) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for record in table {
        if !rules.is_done(&record.status) {
            continue;
        }
        if let Some(completed) = record.completed_date {
            *months.entry(YearMonth::of(completed)).or_insert(0) += 1;
        }
    }

    months
        .into_iter()
        .map(|(month, completed)| MonthlyCount { month, completed })
        .collect()
}
