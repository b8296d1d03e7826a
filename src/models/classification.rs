//! Derived task classification produced for every report request.

use std::collections::HashMap;

use serde::Serialize;

use super::task::Task;

/// A task whose due date has passed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OverdueTask {
    /// The overdue task.
    pub task: Task,
    /// Whole days since the due date; always positive.
    pub days_overdue: i64,
}

/// A task due within the risk window.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AtRiskTask {
    /// The at-risk task.
    pub task: Task,
    /// Whole days until the due date; zero means due today.
    pub days_until_due: i64,
}

/// Status buckets, deadline views and workload counts for a task list.
///
/// Never persisted as-is; recomputed from the task source on every request.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ClassificationResult {
    /// Number of tasks classified.
    pub total_count: usize,
    /// Tasks with status `Done`.
    pub done_count: usize,
    /// Tasks with status `InProgress`.
    pub in_progress_count: usize,
    /// Tasks with status `ToDo`.
    pub todo_count: usize,
    /// Tasks whose status label was not recognized.
    pub unknown_count: usize,
    /// Percentage of done tasks, rounded to one decimal; 0 when empty.
    pub completion_rate: f64,
    /// Overdue tasks, most overdue first.
    pub overdue_tasks: Vec<OverdueTask>,
    /// At-risk tasks, most urgent first.
    pub at_risk_tasks: Vec<AtRiskTask>,
    /// Non-done task count per assignee name.
    pub active_count_by_assignee: HashMap<String, usize>,
}

impl ClassificationResult {
    /// Workload entries sorted by count descending, then name ascending.
    #[must_use]
    pub fn workload(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .active_count_by_assignee
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}
