//! Markdown report rendering.
//!
//! Section order is fixed: title, summary, overdue tasks, at-risk tasks,
//! team workload, then the summarizer prose. Empty deadline sections
//! render a placeholder line instead of disappearing.

use chrono::NaiveDate;

use super::format;
use crate::models::classification::ClassificationResult;

/// Placeholder line for an empty overdue section.
pub const NO_OVERDUE_LINE: &str = "- No overdue tasks!";
/// Placeholder line for an empty at-risk section.
pub const NO_AT_RISK_LINE: &str = "- No at-risk tasks";
/// Placeholder line for an empty workload section.
pub const NO_WORKLOAD_LINE: &str = "- No active tasks";

/// Render a classification into the markdown report body.
#[must_use]
pub fn render(
    classification: &ClassificationResult,
    summary_text: &str,
    owner_user: &str,
    report_date: NaiveDate,
) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(32);

    lines.push(format!(
        "# Daily Project Report - {}",
        format::report_date(report_date)
    ));
    lines.push(format!("Prepared for **{owner_user}**"));
    lines.push(String::new());

    push_summary(&mut lines, classification);
    push_overdue(&mut lines, classification);
    push_at_risk(&mut lines, classification);
    push_workload(&mut lines, classification);

    lines.push(String::new());
    lines.push("## AI Summary".to_owned());
    lines.push(String::new());
    lines.push(summary_text.trim().to_owned());

    let mut body = lines.join("\n");
    body.push('\n');
    body
}

fn push_summary(lines: &mut Vec<String>, c: &ClassificationResult) {
    lines.push("## Summary".to_owned());
    lines.push(String::new());
    lines.push(format!("- **Total Tasks**: {}", format::count(c.total_count)));
    lines.push(format!(
        "- **Completed**: {} ({})",
        format::count(c.done_count),
        format::percentage(c.completion_rate, c.total_count)
    ));
    lines.push(format!(
        "- **In Progress**: {}",
        format::count(c.in_progress_count)
    ));
    lines.push(format!("- **To Do**: {}", format::count(c.todo_count)));
    lines.push(format!(
        "- **Overdue**: {}",
        format::count(c.overdue_tasks.len())
    ));
    lines.push(format!(
        "- **At Risk**: {}",
        format::count(c.at_risk_tasks.len())
    ));
}

fn push_overdue(lines: &mut Vec<String>, c: &ClassificationResult) {
    lines.push(String::new());
    lines.push(format!(
        "## Overdue Tasks ({})",
        format::count(c.overdue_tasks.len())
    ));
    lines.push(String::new());

    if c.overdue_tasks.is_empty() {
        lines.push(NO_OVERDUE_LINE.to_owned());
        return;
    }
    for entry in &c.overdue_tasks {
        lines.push(format!(
            "- **{}** ({}) - {} overdue",
            entry.task.title,
            entry.task.assignee_name,
            format::days(entry.days_overdue)
        ));
    }
}

fn push_at_risk(lines: &mut Vec<String>, c: &ClassificationResult) {
    lines.push(String::new());
    lines.push(format!(
        "## At-Risk Tasks ({})",
        format::count(c.at_risk_tasks.len())
    ));
    lines.push(String::new());

    if c.at_risk_tasks.is_empty() {
        lines.push(NO_AT_RISK_LINE.to_owned());
        return;
    }
    for entry in &c.at_risk_tasks {
        let due = if entry.days_until_due == 0 {
            "due today".to_owned()
        } else {
            format!("due in {}", format::days(entry.days_until_due))
        };
        lines.push(format!(
            "- **{}** ({}) - {due}",
            entry.task.title, entry.task.assignee_name
        ));
    }
}

fn push_workload(lines: &mut Vec<String>, c: &ClassificationResult) {
    lines.push(String::new());
    lines.push("## Team Workload".to_owned());
    lines.push(String::new());

    let workload = c.workload();
    if workload.is_empty() {
        lines.push(NO_WORKLOAD_LINE.to_owned());
        return;
    }
    for (name, count) in workload {
        let noun = if count == 1 { "active task" } else { "active tasks" };
        lines.push(format!("- **{name}**: {} {noun}", format::count(count)));
    }
}
