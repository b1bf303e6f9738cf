use taskdash::export::{ExportCell, ExportTable};
use taskdash::output::{format_human, format_table, HumanOutput};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("Task summary");
    human.push_summary("Total", "4");
    human.push_detail("Statuses: Done=2, Open=2");
    human.push_warning("no tasks match the current status/owner selection");
    human.push_next_step("taskdash overdue");

    let rendered = format_human(&human);
    assert!(rendered.contains("Task summary"));
    assert!(rendered.contains("Summary:"));
    assert!(rendered.contains("- Total: 4"));
    assert!(rendered.contains("Details:"));
    assert!(rendered.contains("- Statuses: Done=2, Open=2"));
    assert!(rendered.contains("Warnings:"));
    assert!(rendered.contains("Next steps:"));
    assert!(rendered.contains("- taskdash overdue"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("Tasks by Status");
    assert_eq!(format_human(&human), "Tasks by Status");
}

#[test]
fn format_table_aligns_columns() {
    let mut table = ExportTable::new("Tasks by Owner", ["Owner", "Task Count"]);
    table.push_row(vec![ExportCell::text("Alexandra"), ExportCell::Number(3.0)]);
    table.push_row(vec![ExportCell::text("Bo"), ExportCell::Number(12.0)]);

    let lines = format_table(&table);
    assert_eq!(
        lines,
        vec![
            "Owner      Task Count".to_string(),
            "Alexandra  3".to_string(),
            "Bo         12".to_string(),
        ]
    );
}

#[test]
fn table_follows_summary() {
    let mut table = ExportTable::new("Tasks by Status", ["Status", "Task Count"]);
    table.push_row(vec![ExportCell::text("Done"), ExportCell::Number(1.0)]);

    let mut human = HumanOutput::new("Tasks by Status");
    human.push_summary("Tasks", "1");
    human.set_table(&table);

    let rendered = format_human(&human);
    let summary_at = rendered.find("- Tasks: 1").expect("summary");
    let table_at = rendered.find("Status  Task Count").expect("table");
    assert!(summary_at < table_at);
}
