//! Risk classification: overdue work, missing validation, risky results.
//!
//! An empty result is the normal "nothing to flag" outcome, never an error.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::config::Rules;
use crate::table::{TaskRecord, TaskTable};

/// Open task assigned longer ago than the overdue threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueTask {
    pub name: String,
    pub status: String,
    pub owner: String,
    pub assigned_date: NaiveDateTime,
    pub days_open: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingValidationTask {
    pub name: String,
    pub status: String,
    pub owner: String,
    pub validated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskTask {
    pub name: String,
    pub status: String,
    pub owner: String,
    pub result: String,
    /// Keywords found in `result`, in configured order.
    pub matched: Vec<String>,
}

/// Whole days between the assignment date and `today`.
pub fn days_open(assigned: NaiveDateTime, today: NaiveDate) -> i64 {
    (today - assigned.date()).num_days()
}

pub fn overdue(table: &TaskTable, today: NaiveDate, rules: &Rules) -> Vec<OverdueTask> {
    table
        .iter()
        .filter(|record| !rules.is_done(&record.status))
        .filter_map(|record| {
            let assigned = record.assigned_date?;
            let days = days_open(assigned, today);
            (days > rules.overdue_after_days).then(|| OverdueTask {
                name: record.name.clone(),
                status: record.status.clone(),
                owner: record.owner.clone(),
                assigned_date: assigned,
                days_open: days,
            })
        })
        .collect()
}

pub fn pending_validation(table: &TaskTable, rules: &Rules) -> Vec<PendingValidationTask> {
    table
        .iter()
        .filter(|record| !rules.is_validated(&record.validated))
        .map(|record| PendingValidationTask {
            name: record.name.clone(),
            status: record.status.clone(),
            owner: record.owner.clone(),
            validated: record.validated.clone(),
        })
        .collect()
}

pub fn risk_tasks(table: &TaskTable, rules: &Rules) -> Vec<RiskTask> {
    let keywords: Vec<(String, &str)> = rules
        .risk_keywords
        .iter()
        .map(|keyword| (keyword.to_lowercase(), keyword.as_str()))
        .collect();

    table
        .iter()
        .filter_map(|record| classify_result(record, &keywords))
        .collect()
}

fn classify_result(record: &TaskRecord, keywords: &[(String, &str)]) -> Option<RiskTask> {
    let result = record.result.as_deref()?;
    let haystack = result.to_lowercase();
    let matched: Vec<String> = keywords
        .iter()
        .filter(|(needle, _)| haystack.contains(needle.as_str()))
        .map(|(_, keyword)| keyword.to_string())
        .collect();
    if matched.is_empty() {
        return None;
    }

    Some(RiskTask {
        name: record.name.clone(),
        status: record.status.clone(),
        owner: record.owner.clone(),
        result: result.to_string(),
        matched,
    })
}
