//! Report endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::models::report::{Report, TaskSummaryStats};
use crate::notify::resolve_recipient;
use crate::orchestrator::delivery::{pdf_filename, report_message, MessageBody, REPORT_TITLE};
use crate::orchestrator::generator::WarningBody;
use crate::{AppError, Result};

/// Body of `POST /reports`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Owner recorded on the report; defaults to `default_owner`.
    #[serde(default)]
    pub user: Option<String>,
}

/// Response of `POST /reports`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Stored report id.
    pub id: String,
    /// Rendered markdown report.
    pub markdown: String,
    /// Summarizer prose.
    pub summary: String,
    /// Headline statistics.
    pub summary_stats: TaskSummaryStats,
    /// Conditions that degraded the report.
    pub warnings: Vec<WarningBody>,
    /// Whether the report was stored.
    pub persisted: bool,
}

/// `POST /reports`: generate, persist and return a report.
///
/// # Errors
///
/// Returns `AppError::InvalidRequest` if the body is not valid JSON.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>> {
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::InvalidRequest(format!("invalid request body: {err}")))?
    };

    let owner = request
        .user
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| state.config.default_owner.clone());

    let outcome = state.generator.generate_report(&owner).await;
    let report = outcome.report;

    Ok(Json(GenerateResponse {
        id: report.id,
        markdown: report.markdown_body,
        summary: report.summary_text,
        summary_stats: report.task_summary,
        warnings: outcome.warnings.iter().map(WarningBody::from).collect(),
        persisted: outcome.persisted,
    }))
}

/// `GET /reports`: stored reports, newest first.
///
/// # Errors
///
/// Returns `AppError::Db` if the store cannot be read.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Report>>> {
    Ok(Json(state.reports.list().await?))
}

/// `GET /reports/latest`: the newest stored report.
///
/// # Errors
///
/// Returns `AppError::NotFound` when no report exists yet.
pub async fn latest(State(state): State<Arc<AppState>>) -> Result<Json<Report>> {
    state
        .reports
        .latest()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no reports have been generated".into()))
}

/// `GET /reports/{id}/pdf`: the report rendered as a PDF download.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown id or `AppError::Render`
/// if rendering fails.
pub async fn pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let report = state.reports.get(&id).await?;
    let bytes = state.renderer.to_pdf(REPORT_TITLE, &report.markdown_body)?;
    let disposition = format!("attachment; filename=\"{}\"", pdf_filename(&report));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Query of `POST /reports/{id}/email`.
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    /// Destination; defaults to `notify.default_recipient`.
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Response of `POST /reports/{id}/email`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailResponse {
    /// Report that was sent.
    pub id: String,
    /// Where it went.
    pub recipient: String,
}

/// `POST /reports/{id}/email`: send a summary excerpt with the PDF attached.
///
/// # Errors
///
/// Returns `AppError::InvalidRequest` when no recipient can be resolved,
/// `AppError::Config` when notifications are disabled and
/// `AppError::Notification` when delivery fails.
pub async fn email(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<EmailResponse>> {
    let notifier = state.notifier()?;
    let recipient = resolve_recipient(
        query.recipient.as_deref(),
        state.config.notify.default_recipient.as_deref(),
    )
    .ok_or_else(|| AppError::InvalidRequest("no recipient given or configured".into()))?
    .to_owned();

    let report = state.reports.get(&id).await?;
    let message = report_message(&report, state.renderer.as_ref(), MessageBody::Excerpt)?;
    notifier.send_report(&message, &recipient).await?;

    info!(report_id = %report.id, %recipient, "report emailed");
    Ok(Json(EmailResponse {
        id: report.id,
        recipient,
    }))
}
