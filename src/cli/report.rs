//! Read-only report commands.

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{OwnerCount, StatusCount, ValidationCount};
use crate::cli::Context;
use crate::cycle_time::CycleTimeStats;
use crate::error::Result;
use crate::export::ReportTable;
use crate::filter::FilterSelection;
use crate::kpi::Kpis;
use crate::output::{emit_success, HumanOutput};
use crate::report::Report;

/// Payload of `taskdash summary --json`.
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub today: NaiveDate,
    pub selection: &'a FilterSelection,
    pub kpis: &'a Kpis,
    pub by_status: &'a [StatusCount],
    pub by_owner: &'a [OwnerCount],
    pub by_validation: &'a [ValidationCount],
    pub cycle_time: &'a CycleTimeStats,
    pub overdue: usize,
    pub pending_validation: usize,
    pub risks: usize,
}

impl<'a> From<&'a Report> for SummaryReport<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            today: report.today,
            selection: &report.selection,
            kpis: &report.kpis,
            by_status: &report.by_status,
            by_owner: &report.by_owner,
            by_validation: &report.by_validation,
            cycle_time: &report.cycle_time_stats,
            overdue: report.overdue.len(),
            pending_validation: report.pending_validation.len(),
            risks: report.risks.len(),
        }
    }
}

pub(crate) fn compute(ctx: &mut Context) -> Result<Report> {
    let (table, selection) = ctx.table_and_selection()?;
    Ok(Report::compute(
        &table,
        &selection,
        ctx.today,
        &ctx.config.rules,
    ))
}

pub(crate) fn run_summary(ctx: &mut Context) -> Result<()> {
    let report = compute(ctx)?;
    let human = summary_human(&report);
    emit_success(ctx.output, "summary", &SummaryReport::from(&report), Some(&human))
}

pub(crate) fn summary_human(report: &Report) -> HumanOutput {
    let kpis = &report.kpis;
    let mut human = HumanOutput::new("Task summary");
    human.push_summary("Total", kpis.total.to_string());
    human.push_summary("Completed", kpis.completed.to_string());
    human.push_summary("Pending", kpis.pending.to_string());
    human.push_summary("Validated", kpis.validated.to_string());
    human.push_summary("Overdue", report.overdue.len().to_string());
    human.push_summary(
        "Pending validation",
        report.pending_validation.len().to_string(),
    );
    human.push_summary("Risks", report.risks.len().to_string());
    if let Some(mean) = report.cycle_time_stats.mean_days {
        human.push_summary("Mean cycle time", format!("{mean:.2} days"));
    }

    if !report.by_status.is_empty() {
        let counts: Vec<String> = report
            .by_status
            .iter()
            .map(|entry| format!("{}={}", entry.status, entry.count))
            .collect();
        human.push_detail(format!("Statuses: {}", counts.join(", ")));
    }
    if !report.by_owner.is_empty() {
        let counts: Vec<String> = report
            .by_owner
            .iter()
            .map(|entry| format!("{}={}", entry.owner, entry.count))
            .collect();
        human.push_detail(format!("Owners: {}", counts.join(", ")));
    }

    if kpis.total == 0 {
        human.push_warning("no tasks match the current status/owner selection");
    }
    if !report.overdue.is_empty() {
        human.push_next_step("taskdash overdue");
    }
    if !report.risks.is_empty() {
        human.push_next_step("taskdash risk");
    }
    human
}

pub(crate) fn run_view(ctx: &mut Context, view: ReportTable) -> Result<()> {
    let report = compute(ctx)?;
    let table = view.extract(&report);

    let mut human = HumanOutput::new(table.title.clone());
    human.push_summary("Tasks", report.kpis.total.to_string());
    match view {
        ReportTable::Overdue => {
            human.push_summary("As of", report.today.to_string());
            human.push_summary(
                "Threshold",
                format!("{} days", ctx.config.rules.overdue_after_days),
            );
        }
        ReportTable::CycleTime => {
            let stats = &report.cycle_time_stats;
            if let (Some(mean), Some(median)) = (stats.mean_days, stats.median_days) {
                human.push_summary("Mean", format!("{mean:.2} days"));
                human.push_summary("Median", format!("{median:.1} days"));
            }
        }
        _ => {}
    }

    if table.is_empty() {
        human.push_detail(empty_message(view));
    } else {
        human.set_table(&table);
    }

    emit_success(ctx.output, view.as_str(), &view_data(&report, view)?, Some(&human))
}

fn view_data(report: &Report, view: ReportTable) -> Result<serde_json::Value> {
    let value = match view {
        ReportTable::Kpis => serde_json::to_value(&report.kpis)?,
        ReportTable::Status => serde_json::to_value(&report.by_status)?,
        ReportTable::Owners => serde_json::to_value(&report.by_owner)?,
        ReportTable::Validation => serde_json::to_value(&report.by_validation)?,
        ReportTable::Matrix => serde_json::to_value(&report.status_owner)?,
        ReportTable::CycleTime => serde_json::json!({
            "stats": report.cycle_time_stats,
            "tasks": report.cycle_times,
        }),
        ReportTable::Trend => serde_json::to_value(&report.monthly_trend)?,
        ReportTable::Overdue => serde_json::to_value(&report.overdue)?,
        ReportTable::Pending => serde_json::to_value(&report.pending_validation)?,
        ReportTable::Risk => serde_json::to_value(&report.risks)?,
        ReportTable::Tracker => serde_json::to_value(&report.tracker)?,
    };
    Ok(value)
}

fn empty_message(view: ReportTable) -> &'static str {
    match view {
        ReportTable::Overdue => "No overdue tasks",
        ReportTable::Pending => "Every selected task is validated",
        ReportTable::Risk => "No risk keywords found in results",
        ReportTable::CycleTime => "No completed tasks with both dates",
        ReportTable::Trend => "No completions recorded",
        _ => "No tasks match the current selection",
    }
}
