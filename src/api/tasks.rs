//! Task views and deadline alerts.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::classification::{AtRiskTask, OverdueTask};
use crate::models::report::TaskSummaryStats;
use crate::models::task::Task;
use crate::orchestrator::delivery::{dispatch_deadline_alerts, AlertSummary};
use crate::orchestrator::generator::ReportWarning;
use crate::Result;

/// One row of the dashboard workload table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkloadEntry {
    /// Assignee display name.
    pub assignee: String,
    /// Non-done tasks assigned to them.
    pub active: usize,
}

/// Response of `GET /dashboard`.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    /// Headline statistics.
    pub summary: TaskSummaryStats,
    /// Every task in source order.
    pub tasks: Vec<Task>,
    /// Workload sorted by count, then name.
    pub workload: Vec<WorkloadEntry>,
    /// Source and normalization warnings.
    pub warnings: Vec<ReportWarning>,
}

/// `GET /dashboard`: statistics plus the full task list.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    let snapshot = state.generator.snapshot(Local::now().date_naive()).await;
    let workload = snapshot
        .classification
        .workload()
        .into_iter()
        .map(|(name, active)| WorkloadEntry {
            assignee: name.to_owned(),
            active,
        })
        .collect();

    Json(Dashboard {
        summary: TaskSummaryStats::from(&snapshot.classification),
        workload,
        warnings: snapshot.warnings,
        tasks: snapshot.tasks,
    })
}

/// `GET /tasks/overdue`: overdue tasks, most overdue first.
pub async fn overdue(State(state): State<Arc<AppState>>) -> Json<Vec<OverdueTask>> {
    let snapshot = state.generator.snapshot(Local::now().date_naive()).await;
    Json(snapshot.classification.overdue_tasks)
}

/// `GET /tasks/at-risk`: at-risk tasks, most urgent first.
pub async fn at_risk(State(state): State<Arc<AppState>>) -> Json<Vec<AtRiskTask>> {
    let snapshot = state.generator.snapshot(Local::now().date_naive()).await;
    Json(snapshot.classification.at_risk_tasks)
}

/// `POST /tasks/alerts`: notify assignees about overdue and at-risk tasks.
///
/// # Errors
///
/// Returns `AppError::Config` when notifications are disabled.
pub async fn alerts(State(state): State<Arc<AppState>>) -> Result<Json<AlertSummary>> {
    let notifier = state.notifier()?;
    let snapshot = state.generator.snapshot(Local::now().date_naive()).await;
    let summary = dispatch_deadline_alerts(
        &snapshot.classification,
        notifier,
        state.config.notify.default_recipient.as_deref(),
    )
    .await;
    Ok(Json(summary))
}
