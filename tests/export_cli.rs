mod support;

use std::fs;

use assert_cmd::Command;
use calamine::{open_workbook, Reader, Xlsx};
use predicates::str::contains;
use support::{json, sample, Tracker};

fn taskdash(tracker: &Tracker) -> Command {
    let mut cmd = Command::cargo_bin("taskdash").expect("binary");
    cmd.current_dir(tracker.path())
        .env_remove("TASKDASH_SOURCE")
        .env_remove("TASKDASH_CONFIG");
    cmd.arg("--source").arg(tracker.csv());
    cmd
}

#[test]
fn export_status_csv() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = sample();
    let out = tracker.path().join("status.csv");
    taskdash(&tracker)
        .args(["export", "status", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Exported Tasks by Status"));

    let written = fs::read_to_string(&out)?;
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "Status,Task Count");
    assert_eq!(lines[1], "Done,2");
    assert_eq!(lines.len(), 4);
    Ok(())
}

#[test]
fn export_overdue_json_with_explicit_format() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = sample();
    let out = tracker.path().join("overdue.out");
    let output = taskdash(&tracker)
        .args(["--today", "2024-03-01", "--json", "export", "overdue"])
        .args(["--format", "json", "--out"])
        .arg(&out)
        .output()?;
    assert!(output.status.success());

    let envelope = json(&output.stdout);
    assert_eq!(envelope["command"], "export");
    assert_eq!(envelope["data"]["table"], "overdue");
    assert_eq!(envelope["data"]["format"], "json");
    assert_eq!(envelope["data"]["rows"], 2);

    let written = json(&fs::read(&out)?);
    let rows = written.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Name"], "B");
    Ok(())
}

#[test]
fn export_tracker_xlsx() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = sample();
    let out = tracker.path().join("tracker.xlsx");
    taskdash(&tracker)
        .args(["export", "tracker", "--out"])
        .arg(&out)
        .assert()
        .success();

    let mut workbook: Xlsx<_> = open_workbook(&out)?;
    let range = workbook.worksheet_range_at(0).expect("sheet")?;
    assert_eq!(range.height(), 5);
    assert_eq!(
        range.get((0, 0)).map(|cell| cell.to_string()),
        Some("Name".to_string())
    );
    Ok(())
}

#[test]
fn export_unknown_table_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = sample();
    taskdash(&tracker)
        .args(["export", "burndown", "--out", "x.csv"])
        .assert()
        .code(2)
        .stderr(contains("unknown table"));
    Ok(())
}

#[test]
fn export_needs_known_extension() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = sample();
    taskdash(&tracker)
        .args(["export", "kpis", "--out", "kpis.txt"])
        .assert()
        .code(2)
        .stderr(contains("--format"));
    Ok(())
}
