//! `taskdash export`: write one derived table to a file.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{report, Context};
use crate::error::Result;
use crate::export::{exporter_for, ExportFormat, ReportTable};
use crate::output::{emit_success, HumanOutput};

pub struct ExportOptions {
    pub table: String,
    pub out: PathBuf,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportReport {
    table: ReportTable,
    format: ExportFormat,
    path: PathBuf,
    rows: usize,
}

pub(crate) fn run(ctx: &mut Context, options: ExportOptions) -> Result<()> {
    let view: ReportTable = options.table.parse()?;
    let format = match options.format.as_deref() {
        Some(format) => format.parse()?,
        None => ExportFormat::from_path(&options.out)?,
    };

    let report = report::compute(ctx)?;
    let table = view.extract(&report);
    exporter_for(format).export(&table, &options.out)?;
    tracing::info!(
        table = view.as_str(),
        path = %options.out.display(),
        rows = table.len(),
        "exported table"
    );

    let mut human = HumanOutput::new(format!("Exported {}", table.title));
    human.push_summary("Path", options.out.display().to_string());
    human.push_summary("Rows", table.len().to_string());
    if table.is_empty() {
        human.push_warning("exported table has no rows for the current selection");
    }

    let data = ExportReport {
        table: view,
        format,
        path: options.out,
        rows: table.len(),
    };
    emit_success(ctx.output, "export", &data, Some(&human))
}
