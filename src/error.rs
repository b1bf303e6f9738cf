//! Error types for taskdash
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, source missing or malformed)
//! - 4: Operation failed (I/O, parse, export)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskdash CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskdash operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("No task source given (use --source or set source.path in .taskdash.toml)")]
    NoSource,

    #[error("Missing column(s) in {source_name}: {}", .columns.join(", "))]
    MissingColumn {
        source_name: String,
        columns: Vec<String>,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::SourceNotFound(_)
            | Error::NoSource
            | Error::MissingColumn { .. }
            | Error::UnsupportedFormat(_)
            | Error::SheetNotFound(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::Csv(_)
            | Error::Spreadsheet(_)
            | Error::Xlsx(_)
            | Error::Watch(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output, when the variant has any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::MissingColumn {
                source_name,
                columns,
            } => Some(serde_json::json!({
                "source": source_name,
                "missing_columns": columns,
            })),
            Error::SourceNotFound(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskdash operations
pub type Result<T> = std::result::Result<T, Error>;
