//! Command-line interface for taskdash
//!
//! This module defines the CLI structure using clap derive macros.
//! View commands live in `report`, file output in `export`, and the
//! reload loop in `watch`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::ReportTable;
use crate::filter::FilterSelection;
use crate::output::OutputOptions;
use crate::source::{SchemaMapping, TableCache, TaskSource};
use crate::table::TaskTable;

mod export;
mod report;
mod watch;

/// taskdash - task reporting
///
/// Reads a task spreadsheet and reports status counts, owner workload,
/// cycle time, monthly completions, overdue work and risk.
#[derive(Parser, Debug)]
#[command(name = "taskdash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Task spreadsheet (.xlsx, .xls, .ods) or CSV file
    #[arg(long, global = true, env = "TASKDASH_SOURCE")]
    pub source: Option<PathBuf>,

    /// Worksheet to read (defaults to the first sheet)
    #[arg(long, global = true)]
    pub sheet: Option<String>,

    /// Configuration file (defaults to ./.taskdash.toml when present)
    #[arg(long, global = true, env = "TASKDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only include tasks with this status (repeatable; default: every status)
    #[arg(long = "status", global = true, value_name = "STATUS")]
    pub statuses: Vec<String>,

    /// Only include tasks owned by this person (repeatable; default: every owner)
    #[arg(long = "owner", global = true, value_name = "OWNER")]
    pub owners: Vec<String>,

    /// Select no statuses (every view comes back empty)
    #[arg(long, global = true)]
    pub no_status: bool,

    /// Select no owners (every view comes back empty)
    #[arg(long, global = true)]
    pub no_owner: bool,

    /// Evaluation date for overdue checks, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    pub today: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Headline counts plus every summary
    Summary,

    /// Tasks by status
    Status,

    /// Tasks by owner
    Owners,

    /// Tasks by validation flag
    Validation,

    /// Owner x status task counts
    Matrix,

    /// Days from assignment to completion for done tasks
    CycleTime,

    /// Done tasks per completion month
    Trend,

    /// Open tasks assigned too long ago
    Overdue,

    /// Tasks not yet validated
    Pending,

    /// Tasks whose result mentions a failure, block, risk or issue
    Risk,

    /// The filtered task rows
    Tracker,

    /// Write one derived table to a file
    Export {
        /// Table to export: kpis, status, owners, validation, matrix,
        /// cycle-time, trend, overdue, pending, risk, tracker
        table: String,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Output format: xlsx, csv, json (default: from the file extension)
        #[arg(long)]
        format: Option<String>,
    },

    /// Re-run the summary whenever the source file changes
    Watch {
        /// Quiet period after a change before reloading
        #[arg(long, default_value = "500")]
        debounce_ms: u64,
    },
}

/// Filter flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SelectionArgs {
    pub statuses: Vec<String>,
    pub owners: Vec<String>,
    pub no_status: bool,
    pub no_owner: bool,
}

impl SelectionArgs {
    fn validate(&self) -> Result<()> {
        if self.no_status && !self.statuses.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot use --status with --no-status".to_string(),
            ));
        }
        if self.no_owner && !self.owners.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot use --owner with --no-owner".to_string(),
            ));
        }
        Ok(())
    }

    /// Explicit values win; otherwise every value observed in `table`.
    pub fn resolve(&self, table: &TaskTable) -> FilterSelection {
        let statuses = if self.no_status {
            Vec::new()
        } else if self.statuses.is_empty() {
            table.observed_statuses()
        } else {
            self.statuses.clone()
        };
        let owners = if self.no_owner {
            Vec::new()
        } else if self.owners.is_empty() {
            table.observed_owners()
        } else {
            self.owners.clone()
        };
        FilterSelection::new(statuses, owners)
    }
}

/// Everything a command needs: rules, the source cache and the filter.
pub(crate) struct Context {
    pub config: Config,
    pub cache: TableCache,
    pub selection: SelectionArgs,
    pub today: NaiveDate,
    pub output: OutputOptions,
}

impl Context {
    /// Resolve the selection against the (cached) table.
    pub fn table_and_selection(&mut self) -> Result<(TaskTable, FilterSelection)> {
        let table = self.cache.get()?.clone();
        let selection = self.selection.resolve(&table);
        Ok((table, selection))
    }
}

fn load_context(cli: &Cli) -> Result<Context> {
    let selection = SelectionArgs {
        statuses: cli.statuses.clone(),
        owners: cli.owners.clone(),
        no_status: cli.no_status,
        no_owner: cli.no_owner,
    };
    selection.validate()?;

    let (config, config_dir) = match cli.config.as_deref() {
        Some(path) => (Config::load(path)?, path.parent().map(Path::to_path_buf)),
        None => (Config::load_from_dir(&std::env::current_dir()?)?, None),
    };

    let path = match (&cli.source, &config.source.path) {
        (Some(path), _) => path.clone(),
        (None, Some(path)) => match &config_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.clone(),
        },
        (None, None) => return Err(Error::NoSource),
    };
    let sheet = cli.sheet.clone().or_else(|| config.source.sheet.clone());
    let source = TaskSource::new(path)
        .with_sheet(sheet)
        .with_mapping(SchemaMapping::new(config.columns.clone()));

    let today = parse_today(cli.today.as_deref())?;
    tracing::debug!(source = %source.path.display(), %today, "resolved context");

    Ok(Context {
        config,
        cache: TableCache::new(source),
        selection,
        today,
        output: OutputOptions {
            json: cli.json,
            quiet: cli.quiet,
        },
    })
}

fn parse_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
            Error::InvalidArgument(format!(
                "invalid --today '{value}': {err} (expected YYYY-MM-DD)"
            ))
        }),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let mut ctx = load_context(&self)?;
        match self.command {
            Commands::Summary => report::run_summary(&mut ctx),
            Commands::Status => report::run_view(&mut ctx, ReportTable::Status),
            Commands::Owners => report::run_view(&mut ctx, ReportTable::Owners),
            Commands::Validation => report::run_view(&mut ctx, ReportTable::Validation),
            Commands::Matrix => report::run_view(&mut ctx, ReportTable::Matrix),
            Commands::CycleTime => report::run_view(&mut ctx, ReportTable::CycleTime),
            Commands::Trend => report::run_view(&mut ctx, ReportTable::Trend),
            Commands::Overdue => report::run_view(&mut ctx, ReportTable::Overdue),
            Commands::Pending => report::run_view(&mut ctx, ReportTable::Pending),
            Commands::Risk => report::run_view(&mut ctx, ReportTable::Risk),
            Commands::Tracker => report::run_view(&mut ctx, ReportTable::Tracker),
            Commands::Export { table, out, format } => export::run(
                &mut ctx,
                export::ExportOptions { table, out, format },
            ),
            Commands::Watch { debounce_ms } => watch::run(&mut ctx, debounce_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TaskRecord;

    fn table() -> TaskTable {
        TaskTable::new(vec![
            TaskRecord::new("a", "Open", "X"),
            TaskRecord::new("b", "Done", "Y"),
        ])
    }

    #[test]
    fn selection_defaults_to_observed_values() {
        let selection = SelectionArgs::default().resolve(&table());
        assert_eq!(selection, FilterSelection::new(["Open", "Done"], ["X", "Y"]));
    }

    #[test]
    fn explicit_values_replace_defaults() {
        let args = SelectionArgs {
            statuses: vec!["Done".to_string()],
            ..SelectionArgs::default()
        };
        let selection = args.resolve(&table());
        assert_eq!(selection, FilterSelection::new(["Done"], ["X", "Y"]));
    }

    #[test]
    fn no_flags_select_empty_sets() {
        let args = SelectionArgs {
            no_owner: true,
            ..SelectionArgs::default()
        };
        let selection = args.resolve(&table());
        assert!(selection.owners.is_empty());
        assert_eq!(selection.statuses.len(), 2);
    }

    #[test]
    fn conflicting_flags_rejected() {
        let args = SelectionArgs {
            statuses: vec!["Done".to_string()],
            no_status: true,
            ..SelectionArgs::default()
        };
        assert!(matches!(args.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn today_parses_iso_dates_only() {
        assert_eq!(
            parse_today(Some("2024-01-15")).expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid")
        );
        assert!(matches!(
            parse_today(Some("15/01/2024")),
            Err(Error::InvalidArgument(_))
        ));
    }
}
