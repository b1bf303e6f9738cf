//! One full recomputation pass: filter once, then run every view.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{self, OwnerCount, StatusCount, StatusOwnerMatrix, ValidationCount};
use crate::config::Rules;
use crate::cycle_time::{self, CycleTimeEntry, CycleTimeStats, MonthlyCount};
use crate::filter::{self, FilterSelection};
use crate::kpi::{self, Kpis};
use crate::risk::{self, OverdueTask, PendingValidationTask, RiskTask};
use crate::table::TaskTable;

/// Every derived table for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub today: NaiveDate,
    pub selection: FilterSelection,
    pub kpis: Kpis,
    pub by_status: Vec<StatusCount>,
    pub by_owner: Vec<OwnerCount>,
    pub by_validation: Vec<ValidationCount>,
    pub status_owner: StatusOwnerMatrix,
    pub cycle_times: Vec<CycleTimeEntry>,
    pub cycle_time_stats: CycleTimeStats,
    pub monthly_trend: Vec<MonthlyCount>,
    pub overdue: Vec<OverdueTask>,
    pub pending_validation: Vec<PendingValidationTask>,
    pub risks: Vec<RiskTask>,
    /// The filtered rows themselves.
    pub tracker: TaskTable,
}

impl Report {
    pub fn compute(
        table: &TaskTable,
        selection: &FilterSelection,
        today: NaiveDate,
        rules: &Rules,
    ) -> Self {
        let filtered = filter::apply(table, selection);
        let stray = filtered
            .iter()
            .filter(|record| record.completed_date.is_some() && !rules.is_done(&record.status))
            .count();
        if stray > 0 {
            tracing::debug!(rows = stray, "completed date set on tasks that are not done");
        }
        let report = Self::from_filtered(filtered, selection.clone(), today, rules);
        tracing::debug!(
            rows = report.tracker.len(),
            overdue = report.overdue.len(),
            risks = report.risks.len(),
            %today,
            "computed report"
        );
        report
    }

    /// Build from an already filtered table.
    pub fn from_filtered(
        filtered: TaskTable,
        selection: FilterSelection,
        today: NaiveDate,
        rules: &Rules,
    ) -> Self {
        let cycle_times = cycle_time::cycle_times(&filtered, rules);
        let cycle_time_stats = cycle_time::stats(&cycle_times);

        Self {
            today,
            selection,
            kpis: kpi::compute(&filtered, rules),
            by_status: aggregate::by_status(&filtered),
            by_owner: aggregate::by_owner(&filtered),
            by_validation: aggregate::by_validation(&filtered),
            status_owner: aggregate::status_owner_matrix(&filtered),
            cycle_times,
            cycle_time_stats,
            monthly_trend: cycle_time::monthly_trend(&filtered, rules),
            overdue: risk::overdue(&filtered, today, rules),
            pending_validation: risk::pending_validation(&filtered, rules),
            risks: risk::risk_tasks(&filtered, rules),
            tracker: filtered,
        }
    }
}
