//! Loading a task table from a spreadsheet or CSV file.
//!
//! Headers are trimmed and matched against a declared [`SchemaMapping`];
//! a missing header fails the load. Cell values that do not parse as dates
//! become "no date".

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::config::ColumnsConfig;
use crate::error::{Error, Result};
use crate::table::{start_of_day, TaskRecord, TaskTable};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

static EMPTY_CELL: Cell = Cell::Empty;

/// Largest serial number spreadsheets accept (9999-12-31).
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

/// A single cell as read from the source, before typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn from_text(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering; whole numbers lose their `.0`.
    pub fn text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                Some(format!("{}", *value as i64))
            }
            Cell::Number(value) => Some(value.to_string()),
            Cell::Bool(value) => Some(value.to_string()),
            Cell::DateTime(value) => Some(format_datetime(*value)),
        }
    }

    /// Permissive date reading; anything unrecognised is `None`.
    pub fn date(&self) -> Option<NaiveDateTime> {
        let parsed = match self {
            Cell::Empty | Cell::Bool(_) => return None,
            Cell::DateTime(value) => Some(*value),
            Cell::Number(serial) => from_serial(*serial),
            Cell::Text(text) => parse_date_text(text),
        };
        if parsed.is_none() {
            tracing::trace!(cell = ?self, "unparseable date treated as missing");
        }
        parsed
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(text) => Cell::from_text(text),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Float(value) => Cell::Number(*value),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(value) => value
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or(Cell::Empty),
            Data::DateTimeIso(text) => Cell::from_text(text),
            _ => Cell::Empty,
        }
    }
}

fn format_datetime(value: NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Spreadsheet serial date (days since 1899-12-30, fraction is time of day).
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DATE {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    start_of_day(epoch).checked_add_signed(Duration::milliseconds(millis))
}

/// Inverse of [`from_serial`].
pub fn to_serial(value: NaiveDateTime) -> Option<f64> {
    let epoch = start_of_day(NaiveDate::from_ymd_opt(1899, 12, 30)?);
    Some((value - epoch).num_milliseconds() as f64 / 86_400_000.0)
}

pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(value) = NaiveDate::parse_from_str(text, format) {
            return Some(start_of_day(value));
        }
    }
    None
}

/// Positions of the mapped columns within a source header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub name: usize,
    pub status: usize,
    pub owner: usize,
    pub validated: usize,
    pub result: usize,
    pub notes: usize,
    pub assigned_date: usize,
    pub completed_date: usize,
}

impl ColumnIndex {
    fn positions(&self) -> [usize; 8] {
        [
            self.name,
            self.status,
            self.owner,
            self.validated,
            self.result,
            self.notes,
            self.assigned_date,
            self.completed_date,
        ]
    }
}

/// Declared header text for each logical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMapping {
    columns: ColumnsConfig,
}

impl SchemaMapping {
    pub fn new(columns: ColumnsConfig) -> Self {
        Self { columns }
    }

    /// Locate every mapped column; all absent ones are reported together.
    pub fn resolve(&self, headers: &[String], source_name: &str) -> Result<ColumnIndex> {
        let normalized: Vec<&str> = headers
            .iter()
            .map(|header| normalize_header(header))
            .collect();
        let mut missing = Vec::new();
        let mut find = |wanted: &str| -> usize {
            let wanted = wanted.trim();
            match normalized.iter().position(|header| *header == wanted) {
                Some(position) => position,
                None => {
                    missing.push(wanted.to_string());
                    usize::MAX
                }
            }
        };

        let index = ColumnIndex {
            name: find(&self.columns.name),
            status: find(&self.columns.status),
            owner: find(&self.columns.owner),
            validated: find(&self.columns.validated),
            result: find(&self.columns.result),
            notes: find(&self.columns.notes),
            assigned_date: find(&self.columns.assigned_date),
            completed_date: find(&self.columns.completed_date),
        };

        if !missing.is_empty() {
            return Err(Error::MissingColumn {
                source_name: source_name.to_string(),
                columns: missing,
            });
        }
        Ok(index)
    }
}

fn normalize_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

/// Build a record from one row; `None` for rows with every mapped cell blank.
pub fn record_from_row(row: &[Cell], index: &ColumnIndex) -> Option<TaskRecord> {
    let cell = |position: usize| row.get(position).unwrap_or(&EMPTY_CELL);
    if index.positions().iter().all(|position| cell(*position).is_blank()) {
        return None;
    }

    let text = |position: usize| cell(position).text().unwrap_or_default();
    Some(TaskRecord {
        name: text(index.name),
        status: text(index.status),
        owner: text(index.owner),
        validated: text(index.validated),
        result: cell(index.result).text(),
        notes: cell(index.notes).text(),
        assigned_date: cell(index.assigned_date).date(),
        completed_date: cell(index.completed_date).date(),
    })
}

/// Build a table from a header row followed by data rows.
pub fn table_from_rows<I>(
    headers: &[String],
    rows: I,
    mapping: &SchemaMapping,
    source_name: &str,
) -> Result<TaskTable>
where
    I: IntoIterator<Item = Vec<Cell>>,
{
    let index = mapping.resolve(headers, source_name)?;
    let mut skipped = 0usize;
    let mut records = Vec::new();
    for row in rows {
        match record_from_row(&row, &index) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(source = source_name, skipped, "skipped blank rows");
    }
    Ok(TaskTable::new(records))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            "csv" => Ok(SourceFormat::Csv),
            _ => Err(Error::UnsupportedFormat(format!(
                "{} (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)",
                path.display()
            ))),
        }
    }
}

/// Where and how to load the task table from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSource {
    pub path: PathBuf,
    pub sheet: Option<String>,
    pub mapping: SchemaMapping,
}

impl TaskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
            mapping: SchemaMapping::default(),
        }
    }

    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_mapping(mut self, mapping: SchemaMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Read the whole source into a fresh table.
    pub fn load(&self) -> Result<TaskTable> {
        if !self.path.exists() {
            return Err(Error::SourceNotFound(self.path.clone()));
        }
        let table = match SourceFormat::from_path(&self.path)? {
            SourceFormat::Spreadsheet => self.load_spreadsheet()?,
            SourceFormat::Csv => self.load_csv()?,
        };
        tracing::debug!(
            path = %self.path.display(),
            rows = table.len(),
            "loaded task table"
        );
        Ok(table)
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn load_spreadsheet(&self) -> Result<TaskTable> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = match self.sheet.as_deref() {
            Some(sheet) => {
                if !workbook.sheet_names().iter().any(|name| name == sheet) {
                    return Err(Error::SheetNotFound(sheet.to_string()));
                }
                workbook.worksheet_range(sheet)?
            }
            None => match workbook.worksheet_range_at(0) {
                Some(range) => range?,
                None => {
                    return Err(Error::SheetNotFound(format!(
                        "{} has no worksheets",
                        self.source_name()
                    )))
                }
            },
        };

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| {
                row.iter()
                    .map(|data| Cell::from(data).text().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();
        let body = rows.map(|row| row.iter().map(Cell::from).collect::<Vec<_>>());
        table_from_rows(&headers, body, &self.mapping, &self.source_name())
    }

    fn load_csv(&self) -> Result<TaskTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        // Excel often saves CSV as Windows-1252; undecodable bytes are replaced.
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| Cell::from_text(&String::from_utf8_lossy(field)))
                    .collect::<Vec<_>>(),
            );
        }
        table_from_rows(&headers, rows, &self.mapping, &self.source_name())
    }
}

/// Caller-owned cache of one loaded table.
///
/// Nothing is reloaded implicitly: call [`TableCache::invalidate`] or
/// [`TableCache::reload`] when the source changes.
#[derive(Debug)]
pub struct TableCache {
    source: TaskSource,
    table: Option<TaskTable>,
    loads: usize,
}

impl TableCache {
    pub fn new(source: TaskSource) -> Self {
        Self {
            source,
            table: None,
            loads: 0,
        }
    }

    pub fn source(&self) -> &TaskSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Number of times the source has been read.
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// The cached table, loading it on first use.
    pub fn get(&mut self) -> Result<&TaskTable> {
        let table = match self.table.take() {
            Some(table) => table,
            None => self.load()?,
        };
        Ok(self.table.insert(table))
    }

    pub fn invalidate(&mut self) {
        self.table = None;
    }

    /// Drop the cached table and read the source again.
    pub fn reload(&mut self) -> Result<&TaskTable> {
        self.invalidate();
        self.get()
    }

    fn load(&mut self) -> Result<TaskTable> {
        let table = self.source.load()?;
        self.loads += 1;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str =
        "Name,Status,assigned,Validate (Y/N),Result,Notes,Assinged Date,Completed Date";

    fn headers(line: &str) -> Vec<String> {
        line.split(',').map(str::to_string).collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        start_of_day(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
    }

    #[test]
    fn resolve_trims_headers() {
        let padded = headers(
            " Name ,Status,  assigned,Validate (Y/N) ,Result,Notes,Assinged Date ,Completed Date",
        );
        let index = SchemaMapping::default()
            .resolve(&padded, "tasks.csv")
            .expect("resolve");
        assert_eq!(index.name, 0);
        assert_eq!(index.owner, 2);
        assert_eq!(index.completed_date, 7);
    }

    #[test]
    fn resolve_reports_every_missing_column() {
        let partial = headers("Name,Status,Owner,Validate (Y/N),Result,Notes,Assigned Date");
        let err = SchemaMapping::default()
            .resolve(&partial, "tasks.csv")
            .expect_err("missing columns");
        match err {
            Error::MissingColumn {
                source_name,
                columns,
            } => {
                assert_eq!(source_name, "tasks.csv");
                assert_eq!(columns, vec!["assigned", "Assinged Date", "Completed Date"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mapping_follows_configured_headers() {
        let columns = ColumnsConfig {
            owner: "Owner".to_string(),
            assigned_date: "Assigned Date".to_string(),
            ..ColumnsConfig::default()
        };
        let row = headers(
            "Assigned Date,Name,Status,Owner,Validate (Y/N),Result,Notes,Completed Date",
        );
        let index = SchemaMapping::new(columns)
            .resolve(&row, "tasks.xlsx")
            .expect("resolve");
        assert_eq!(index.assigned_date, 0);
        assert_eq!(index.owner, 3);
    }

    #[test]
    fn parses_common_date_forms() {
        assert_eq!(parse_date_text("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text(" 2024/01/05 "), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("01/05/2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("05-Jan-2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("Jan 05, 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05 00:00:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(
            parse_date_text("2024-01-05T13:30:00"),
            ymd(2024, 1, 5).checked_add_signed(Duration::minutes(13 * 60 + 30))
        );
    }

    #[test]
    fn unparseable_dates_are_missing() {
        assert_eq!(parse_date_text("soon"), None);
        assert_eq!(parse_date_text("2024-13-40"), None);
        assert_eq!(parse_date_text(""), None);
        assert_eq!(Cell::Bool(true).date(), None);
        assert_eq!(Cell::Number(-3.0).date(), None);
    }

    #[test]
    fn serial_numbers_are_dates() {
        assert_eq!(from_serial(45296.0), Some(ymd(2024, 1, 5)));
        assert_eq!(
            from_serial(45296.5),
            ymd(2024, 1, 5).checked_add_signed(Duration::hours(12))
        );
        assert_eq!(Cell::Number(45296.0).date(), Some(ymd(2024, 1, 5)));
        assert_eq!(to_serial(ymd(2024, 1, 5)), Some(45296.0));
    }

    #[test]
    fn number_cells_render_without_fraction() {
        assert_eq!(Cell::Number(7.0).text().as_deref(), Some("7"));
        assert_eq!(Cell::Number(7.5).text().as_deref(), Some("7.5"));
        assert_eq!(Cell::Empty.text(), None);
    }

    #[test]
    fn rows_become_records_and_blank_rows_are_skipped() {
        let rows = vec![
            vec![
                Cell::from_text("A"),
                Cell::from_text("Done"),
                Cell::from_text("X"),
                Cell::from_text("Y"),
                Cell::Empty,
                Cell::from_text("ok"),
                Cell::from_text("2024-01-01"),
                Cell::from_text("not a date"),
            ],
            vec![Cell::Empty; 8],
            vec![Cell::from_text("short row")],
        ];

        let table = table_from_rows(&headers(HEADER), rows, &SchemaMapping::default(), "tasks.csv")
            .expect("table");
        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!(first.owner, "X");
        assert_eq!(first.result, None);
        assert_eq!(first.notes.as_deref(), Some("ok"));
        assert_eq!(first.assigned_date, Some(ymd(2024, 1, 1)));
        assert_eq!(first.completed_date, None);
        let second = &table.records()[1];
        assert_eq!(second.name, "short row");
        assert_eq!(second.status, "");
    }

    #[test]
    fn load_reads_csv_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.csv");
        fs::write(
            &path,
            format!(
                "{HEADER}\nA,Done,X,Y,,,2024-01-01,2024-01-05\n\
                 B,Open,X,N,blocked,,2024-01-01,\n"
            ),
        )
        .expect("write csv");

        let table = TaskSource::new(&path).load().expect("load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].result.as_deref(), Some("blocked"));
        assert_eq!(table.records()[0].completed_date, Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn load_rejects_unknown_extension_and_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.csv");
        assert!(matches!(
            TaskSource::new(&missing).load(),
            Err(Error::SourceNotFound(_))
        ));

        let text = dir.path().join("tasks.txt");
        fs::write(&text, HEADER).expect("write");
        assert!(matches!(
            TaskSource::new(&text).load(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn cache_loads_once_until_invalidated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.csv");
        fs::write(&path, format!("{HEADER}\nA,Open,X,,,,,\n")).expect("write csv");

        let mut cache = TableCache::new(TaskSource::new(&path));
        assert!(!cache.is_loaded());
        assert_eq!(cache.get().expect("get").len(), 1);

        fs::write(&path, format!("{HEADER}\nA,Open,X,,,,,\nB,Open,X,,,,,\n")).expect("rewrite");
        assert_eq!(cache.get().expect("cached").len(), 1);
        assert_eq!(cache.loads(), 1);

        cache.invalidate();
        assert!(!cache.is_loaded());
        assert_eq!(cache.get().expect("fresh").len(), 2);
        assert_eq!(cache.reload().expect("reload").len(), 2);
        assert_eq!(cache.loads(), 3);
    }

    #[test]
    fn load_csv_tolerates_non_utf8_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.csv");
        let mut bytes = format!("{HEADER}\n").into_bytes();
        bytes.extend_from_slice(b"A,Done,X,Y,ok,caf\xe9 review,2024-01-01,2024-01-05\n");
        fs::write(&path, bytes).expect("write csv");

        let table = TaskSource::new(&path).load().expect("load");
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert_eq!(record.notes.as_deref(), Some("caf\u{fffd} review"));
        assert_eq!(record.completed_date, Some(ymd(2024, 1, 5)));
    }

    fn write_workbook(path: &Path) {
        use rust_xlsxwriter::{Format, Workbook};

        let mut workbook = Workbook::new();
        let cover = workbook.add_worksheet();
        cover.set_name("Cover").expect("name");
        cover.write_string(0, 0, "Project status").expect("write");

        let sheet = workbook.add_worksheet();
        sheet.set_name("Tasks").expect("name");
        let headers = [
            " Name ",
            "Status",
            "assigned ",
            "Validate (Y/N)",
            "Result",
            "Notes",
            "  Assinged Date",
            "Completed Date",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).expect("header");
        }

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let assigned = to_serial(ymd(2024, 1, 1)).expect("serial");
        sheet.write_string(1, 0, "A").expect("write");
        sheet.write_string(1, 1, "Done").expect("write");
        sheet.write_number(1, 2, 7.0).expect("write");
        sheet.write_string(1, 3, "Y").expect("write");
        sheet
            .write_number_with_format(1, 6, assigned, &date_format)
            .expect("write");
        sheet.write_string(1, 7, "sometime soon").expect("write");

        workbook.save(path).expect("save workbook");
    }

    #[test]
    fn load_reads_named_sheet_from_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.xlsx");
        write_workbook(&path);

        let table = TaskSource::new(&path)
            .with_sheet(Some("Tasks".to_string()))
            .load()
            .expect("load");
        assert_eq!(table.len(), 1);
        let record = &table.records()[0];
        assert_eq!(record.name, "A");
        assert_eq!(record.owner, "7");
        assert_eq!(record.validated, "Y");
        assert_eq!(record.result, None);
        assert_eq!(record.assigned_date, Some(ymd(2024, 1, 1)));
        assert_eq!(record.completed_date, None);
    }

    #[test]
    fn load_workbook_checks_sheet_and_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.xlsx");
        write_workbook(&path);

        let missing_sheet = TaskSource::new(&path)
            .with_sheet(Some("Nope".to_string()))
            .load();
        assert!(matches!(missing_sheet, Err(Error::SheetNotFound(name)) if name == "Nope"));

        // First sheet is the cover page, which has none of the task columns.
        match TaskSource::new(&path).load() {
            Err(Error::MissingColumn { columns, .. }) => {
                assert_eq!(columns.len(), 8);
                assert_eq!(columns[0], "Name");
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }
}
