//! Persisted report record and its headline statistics.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classification::ClassificationResult;
use crate::engine::format;

/// Headline counts stored alongside every report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSummaryStats {
    /// Number of tasks in the snapshot.
    pub total_tasks: usize,
    /// Done tasks.
    pub completed: usize,
    /// In-progress tasks.
    pub in_progress: usize,
    /// To-do tasks.
    pub todo: usize,
    /// Overdue tasks.
    pub overdue: usize,
    /// At-risk tasks.
    pub at_risk: usize,
    /// Completion rate rendered as a percentage string (`"66.7%"`, `"0%"`).
    pub completion_rate: String,
}

impl From<&ClassificationResult> for TaskSummaryStats {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            total_tasks: result.total_count,
            completed: result.done_count,
            in_progress: result.in_progress_count,
            todo: result.todo_count,
            overdue: result.overdue_tasks.len(),
            at_risk: result.at_risk_tasks.len(),
            completion_rate: format::percentage(result.completion_rate, result.total_count),
        }
    }
}

/// A generated project report.
///
/// Created once per generation request, appended to the report store and
/// never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    /// Unique record identifier (UUID v4 prefixed `report:`).
    pub id: String,
    /// User the report was generated for.
    pub owner_user: String,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Rendered markdown document.
    pub markdown_body: String,
    /// Prose produced by the summarizer (or its fallback sentence).
    pub summary_text: String,
    /// Headline statistics.
    pub task_summary: TaskSummaryStats,
}

impl Report {
    /// Construct a new report with a generated identifier.
    ///
    /// The timestamp is truncated to microseconds, the precision it is
    /// stored with.
    #[must_use]
    pub fn new(
        owner_user: String,
        markdown_body: String,
        summary_text: String,
        task_summary: TaskSummaryStats,
    ) -> Self {
        Self {
            id: format!("report:{}", Uuid::new_v4()),
            owner_user,
            generated_at: Utc::now().trunc_subsecs(6),
            markdown_body,
            summary_text,
            task_summary,
        }
    }
}
