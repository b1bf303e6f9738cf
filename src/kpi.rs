//! Headline task counts.

use serde::Serialize;

use crate::config::Rules;
use crate::table::TaskTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub completed: usize,
    /// Everything not done; `completed + pending == total`.
    pub pending: usize,
    pub validated: usize,
}

pub fn compute(table: &TaskTable, rules: &Rules) -> Kpis {
    let total = table.len();
    let completed = table
        .iter()
        .filter(|record| rules.is_done(&record.status))
        .count();
    let validated = table
        .iter()
        .filter(|record| rules.is_validated(&record.validated))
        .count();

    Kpis {
        total,
        completed,
        pending: total - completed,
        validated,
    }
}
