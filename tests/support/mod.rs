#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const HEADER: &str =
    "Name,Status,assigned,Validate (Y/N),Result,Notes,Assinged Date,Completed Date";

/// A scratch directory holding a CSV tracker.
pub struct Tracker {
    dir: TempDir,
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    /// Tracker with the default header and `rows` (already comma-joined).
    pub fn with_rows(rows: &[&str]) -> Self {
        let tracker = Self::new();
        tracker.write_csv("tasks.csv", HEADER, rows);
        tracker
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn csv(&self) -> PathBuf {
        self.dir.path().join("tasks.csv")
    }

    pub fn write_csv(&self, name: &str, header: &str, rows: &[&str]) -> PathBuf {
        let mut contents = String::from(header);
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        self.write_file(name, &contents)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }
}

/// The two-task tracker used across the CLI tests.
pub fn sample() -> Tracker {
    Tracker::with_rows(&[
        "A,Done,X,Y,passed,,2024-01-01,2024-01-05",
        "B,Open,X,N,Blocked by vendor,waiting,2024-01-01,",
        "C,In Progress,Z,N,risk of slip,,2024-01-10,",
        "D,Done,Z,Y,ok,,2024-02-01,2024-02-11",
    ])
}

pub fn json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("valid json")
}
