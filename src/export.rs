//! Writing derived tables to `.xlsx`, `.csv` or `.json` files.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::report::Report;
use crate::source::to_serial;

/// Worksheet names are capped at 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// A cell ready for export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl ExportCell {
    pub fn text(value: impl Into<String>) -> Self {
        ExportCell::Text(value.into())
    }

    fn optional_text(value: Option<&str>) -> Self {
        value.map(ExportCell::text).unwrap_or(ExportCell::Empty)
    }

    fn optional_date(value: Option<NaiveDateTime>) -> Self {
        value.map(ExportCell::Date).unwrap_or(ExportCell::Empty)
    }

    fn count(value: usize) -> Self {
        ExportCell::Number(value as f64)
    }

    /// Plain-text rendering used by CSV output.
    pub fn render(&self) -> String {
        match self {
            ExportCell::Empty => String::new(),
            ExportCell::Text(text) => text.clone(),
            ExportCell::Number(value) if value.fract() == 0.0 => format!("{}", *value as i64),
            ExportCell::Number(value) => value.to_string(),
            ExportCell::Date(value) => render_date(*value),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ExportCell::Empty => serde_json::Value::Null,
            ExportCell::Text(text) => serde_json::Value::String(text.clone()),
            ExportCell::Number(value) if value.fract() == 0.0 => {
                serde_json::Value::from(*value as i64)
            }
            ExportCell::Number(value) => serde_json::Value::from(*value),
            ExportCell::Date(value) => serde_json::Value::String(render_date(*value)),
        }
    }
}

fn render_date(value: NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Header row plus data rows, all the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl ExportTable {
    pub fn new<I, S>(title: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<ExportCell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derived tables that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportTable {
    Kpis,
    Status,
    Owners,
    Validation,
    Matrix,
    CycleTime,
    Trend,
    Overdue,
    Pending,
    Risk,
    Tracker,
}

impl ReportTable {
    pub const ALL: [ReportTable; 11] = [
        ReportTable::Kpis,
        ReportTable::Status,
        ReportTable::Owners,
        ReportTable::Validation,
        ReportTable::Matrix,
        ReportTable::CycleTime,
        ReportTable::Trend,
        ReportTable::Overdue,
        ReportTable::Pending,
        ReportTable::Risk,
        ReportTable::Tracker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTable::Kpis => "kpis",
            ReportTable::Status => "status",
            ReportTable::Owners => "owners",
            ReportTable::Validation => "validation",
            ReportTable::Matrix => "matrix",
            ReportTable::CycleTime => "cycle-time",
            ReportTable::Trend => "trend",
            ReportTable::Overdue => "overdue",
            ReportTable::Pending => "pending",
            ReportTable::Risk => "risk",
            ReportTable::Tracker => "tracker",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ReportTable::Kpis => "KPIs",
            ReportTable::Status => "Tasks by Status",
            ReportTable::Owners => "Tasks by Owner",
            ReportTable::Validation => "Validation Status",
            ReportTable::Matrix => "Status by Owner",
            ReportTable::CycleTime => "Cycle Time",
            ReportTable::Trend => "Monthly Completions",
            ReportTable::Overdue => "Overdue Tasks",
            ReportTable::Pending => "Pending Validation",
            ReportTable::Risk => "Risk Tasks",
            ReportTable::Tracker => "Task Tracker",
        }
    }

    /// Pull this table out of a computed report.
    pub fn extract(&self, report: &Report) -> ExportTable {
        let mut table;
        match self {
            ReportTable::Kpis => {
                table = ExportTable::new(self.title(), ["Metric", "Value"]);
                let kpis = &report.kpis;
                for (label, value) in [
                    ("Total Tasks", kpis.total),
                    ("Completed Tasks", kpis.completed),
                    ("Pending Tasks", kpis.pending),
                    ("Validated Tasks", kpis.validated),
                ] {
                    table.push_row(vec![ExportCell::text(label), ExportCell::count(value)]);
                }
            }
            ReportTable::Status => {
                table = ExportTable::new(self.title(), ["Status", "Task Count"]);
                for entry in &report.by_status {
                    table.push_row(vec![
                        ExportCell::text(entry.status.as_str()),
                        ExportCell::count(entry.count),
                    ]);
                }
            }
            ReportTable::Owners => {
                table = ExportTable::new(self.title(), ["Owner", "Task Count"]);
                for entry in &report.by_owner {
                    table.push_row(vec![
                        ExportCell::text(entry.owner.as_str()),
                        ExportCell::count(entry.count),
                    ]);
                }
            }
            ReportTable::Validation => {
                table = ExportTable::new(self.title(), ["Validate (Y/N)", "Task Count", "Percent"]);
                for entry in &report.by_validation {
                    table.push_row(vec![
                        ExportCell::text(entry.validated.as_str()),
                        ExportCell::count(entry.count),
                        ExportCell::Number(entry.percent),
                    ]);
                }
            }
            ReportTable::Matrix => {
                let matrix = &report.status_owner;
                let headers = std::iter::once("Owner".to_string())
                    .chain(matrix.statuses.iter().cloned());
                table = ExportTable::new(self.title(), headers);
                for row in &matrix.rows {
                    let mut cells = vec![ExportCell::text(row.owner.as_str())];
                    cells.extend(row.counts.iter().map(|count| ExportCell::count(*count)));
                    table.push_row(cells);
                }
            }
            ReportTable::CycleTime => {
                table = ExportTable::new(
                    self.title(),
                    [
                        "Name",
                        "Owner",
                        "Status",
                        "Assigned Date",
                        "Completed Date",
                        "Cycle Time (days)",
                    ],
                );
                for entry in &report.cycle_times {
                    table.push_row(vec![
                        ExportCell::text(entry.name.as_str()),
                        ExportCell::text(entry.owner.as_str()),
                        ExportCell::text(entry.status.as_str()),
                        ExportCell::Date(entry.assigned_date),
                        ExportCell::Date(entry.completed_date),
                        ExportCell::Number(entry.elapsed_days as f64),
                    ]);
                }
            }
            ReportTable::Trend => {
                table = ExportTable::new(self.title(), ["Month", "Completed"]);
                for entry in &report.monthly_trend {
                    table.push_row(vec![
                        ExportCell::text(entry.month.to_string()),
                        ExportCell::count(entry.completed),
                    ]);
                }
            }
            ReportTable::Overdue => {
                table = ExportTable::new(
                    self.title(),
                    ["Name", "Status", "assigned", "Assinged Date", "Days Open"],
                );
                for task in &report.overdue {
                    table.push_row(vec![
                        ExportCell::text(task.name.as_str()),
                        ExportCell::text(task.status.as_str()),
                        ExportCell::text(task.owner.as_str()),
                        ExportCell::Date(task.assigned_date),
                        ExportCell::Number(task.days_open as f64),
                    ]);
                }
            }
            ReportTable::Pending => {
                table = ExportTable::new(
                    self.title(),
                    ["Name", "Status", "assigned", "Validate (Y/N)"],
                );
                for task in &report.pending_validation {
                    table.push_row(vec![
                        ExportCell::text(task.name.as_str()),
                        ExportCell::text(task.status.as_str()),
                        ExportCell::text(task.owner.as_str()),
                        ExportCell::text(task.validated.as_str()),
                    ]);
                }
            }
            ReportTable::Risk => {
                table = ExportTable::new(
                    self.title(),
                    ["Name", "Status", "assigned", "Result", "Matched"],
                );
                for task in &report.risks {
                    table.push_row(vec![
                        ExportCell::text(task.name.as_str()),
                        ExportCell::text(task.status.as_str()),
                        ExportCell::text(task.owner.as_str()),
                        ExportCell::text(task.result.as_str()),
                        ExportCell::text(task.matched.join(", ")),
                    ]);
                }
            }
            ReportTable::Tracker => {
                table = ExportTable::new(
                    self.title(),
                    [
                        "Name",
                        "Status",
                        "assigned",
                        "Validate (Y/N)",
                        "Result",
                        "Assinged Date",
                        "Completed Date",
                    ],
                );
                for record in &report.tracker {
                    table.push_row(vec![
                        ExportCell::text(record.name.as_str()),
                        ExportCell::text(record.status.as_str()),
                        ExportCell::text(record.owner.as_str()),
                        ExportCell::text(record.validated.as_str()),
                        ExportCell::optional_text(record.result.as_deref()),
                        ExportCell::optional_date(record.assigned_date),
                        ExportCell::optional_date(record.completed_date),
                    ]);
                }
            }
        }
        table
    }
}

impl std::str::FromStr for ReportTable {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        ReportTable::ALL
            .into_iter()
            .find(|table| table.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ReportTable::ALL.iter().map(|t| t.as_str()).collect();
                Error::InvalidArgument(format!(
                    "unknown table '{}': must be one of {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    /// Infer from the output path extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse().map_err(|_| {
            Error::InvalidArgument(format!(
                "cannot infer export format from '{}': use --format xlsx, csv or json",
                path.display()
            ))
        })
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(Error::InvalidArgument(format!(
                "invalid format '{}': must be xlsx, csv, or json",
                s
            ))),
        }
    }
}

/// Serializes an [`ExportTable`] to a file.
pub trait Exporter {
    fn export(&self, table: &ExportTable, path: &Path) -> Result<()>;
}

pub fn exporter_for(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Xlsx => Box::new(XlsxExporter),
        ExportFormat::Csv => Box::new(CsvExporter),
        ExportFormat::Json => Box::new(JsonExporter),
    }
}

/// One worksheet per file, bold header row, dates formatted as dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxExporter;

impl Exporter for XlsxExporter {
    fn export(&self, table: &ExportTable, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&table.title))?;

        for (col, header) in table.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header.as_str(), &header_format)?;
        }

        for (index, row) in table.rows.iter().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    ExportCell::Empty => {}
                    ExportCell::Text(text) => {
                        worksheet.write_string(row_num, col, text.as_str())?;
                    }
                    ExportCell::Number(value) => {
                        worksheet.write_number(row_num, col, *value)?;
                    }
                    ExportCell::Date(value) => {
                        let format = if value.time() == chrono::NaiveTime::MIN {
                            &date_format
                        } else {
                            &datetime_format
                        };
                        match to_serial(*value) {
                            Some(serial) => {
                                worksheet.write_number_with_format(row_num, col, serial, format)?;
                            }
                            None => {
                                worksheet.write_string(row_num, col, render_date(*value).as_str())?;
                            }
                        }
                    }
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|ch| match ch {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn export(&self, table: &ExportTable, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(ExportCell::render))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Array of objects keyed by header.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl JsonExporter {
    pub fn to_value(table: &ExportTable) -> serde_json::Value {
        let rows = table
            .rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, serde_json::Value> = table
                    .headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| (header.clone(), cell.to_json()))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, table: &ExportTable, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&Self::to_value(table))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
