//! Status bucketing, deadline classification and workload counting.

use chrono::{Days, NaiveDate};

use crate::models::classification::{AtRiskTask, ClassificationResult, OverdueTask};
use crate::models::task::{Task, TaskStatus};

/// Default number of days ahead of today that count as at-risk.
pub const DEFAULT_RISK_WINDOW_DAYS: u32 = 2;

/// Largest risk window accepted from configuration (about ten years).
pub const MAX_RISK_WINDOW_DAYS: u32 = 3650;

/// Classify `tasks` relative to `today`.
///
/// A task is overdue when it is not done and its due date is strictly
/// before `today`. It is at-risk when it is not done and its due date lies
/// in `today ..= today + risk_window_days`. Tasks without a due date are
/// neither. Both views use stable sorts so tasks with equal urgency keep
/// their input order.
#[must_use]
pub fn classify(tasks: &[Task], today: NaiveDate, risk_window_days: u32) -> ClassificationResult {
    let mut result = ClassificationResult {
        total_count: tasks.len(),
        ..ClassificationResult::default()
    };
    // Past the end of the calendar every future date is in the window.
    let horizon = today
        .checked_add_days(Days::new(u64::from(risk_window_days)))
        .unwrap_or(NaiveDate::MAX);

    for task in tasks {
        match task.status {
            TaskStatus::Done => result.done_count += 1,
            TaskStatus::InProgress => result.in_progress_count += 1,
            TaskStatus::ToDo => result.todo_count += 1,
            TaskStatus::Unknown => result.unknown_count += 1,
        }

        if !task.status.is_active() {
            continue;
        }

        *result
            .active_count_by_assignee
            .entry(task.assignee_name.clone())
            .or_insert(0) += 1;

        let Some(due) = task.due_date else {
            continue;
        };

        if due < today {
            result.overdue_tasks.push(OverdueTask {
                task: task.clone(),
                days_overdue: (today - due).num_days(),
            });
        } else if due <= horizon {
            result.at_risk_tasks.push(AtRiskTask {
                task: task.clone(),
                days_until_due: (due - today).num_days(),
            });
        }
    }

    // `sort_by` is stable.
    result
        .overdue_tasks
        .sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    result
        .at_risk_tasks
        .sort_by(|a, b| a.days_until_due.cmp(&b.days_until_due));

    result.completion_rate = completion_rate(result.done_count, result.total_count);
    result
}

/// Percentage of `done` over `total`, rounded to one decimal place.
///
/// Returns `0.0` when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_rate(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = done as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}
