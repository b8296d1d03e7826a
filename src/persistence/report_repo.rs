//! Report repository for `SQLite` persistence.
//!
//! Reports are append-only: rows are inserted once and only removed by the
//! retention purge.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::report::{Report, TaskSummaryStats};
use crate::{AppError, Result};

use super::db::Database;

/// Repository for generated report records.
#[derive(Clone)]
pub struct ReportRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    owner_user: String,
    generated_at: String,
    markdown_body: String,
    summary_text: String,
    task_summary: String,
}

impl ReportRow {
    fn into_report(self) -> Result<Report> {
        let generated_at = DateTime::parse_from_rfc3339(&self.generated_at)
            .map_err(|e| AppError::Db(format!("invalid generated_at: {e}")))?
            .with_timezone(&Utc);
        let task_summary: TaskSummaryStats = serde_json::from_str(&self.task_summary)
            .map_err(|e| AppError::Db(format!("invalid task_summary: {e}")))?;

        Ok(Report {
            id: self.id,
            owner_user: self.owner_user,
            generated_at,
            markdown_body: self.markdown_body,
            summary_text: self.summary_text,
            task_summary,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed-width UTC timestamps keep lexical and chronological order equal.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

const SELECT_COLUMNS: &str =
    "SELECT id, owner_user, generated_at, markdown_body, summary_text, task_summary FROM report";

impl ReportRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a report and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if serialization or the insert fails.
    pub async fn append(&self, report: &Report) -> Result<String> {
        let stats = serde_json::to_string(&report.task_summary)
            .map_err(|e| AppError::Db(format!("failed to encode task_summary: {e}")))?;

        sqlx::query(
            "INSERT INTO report (id, owner_user, generated_at, markdown_body, summary_text, task_summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&report.id)
        .bind(&report.owner_user)
        .bind(timestamp(report.generated_at))
        .bind(&report.markdown_body)
        .bind(&report.summary_text)
        .bind(&stats)
        .execute(self.db.as_ref())
        .await?;

        Ok(report.id.clone())
    }

    /// List stored reports, newest first.
    ///
    /// Reports sharing a timestamp are returned in reverse insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or a row is corrupt.
    pub async fn list(&self) -> Result<Vec<Report>> {
        let rows: Vec<ReportRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} ORDER BY generated_at DESC, rowid DESC"
        ))
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(ReportRow::into_report).collect()
    }

    /// Most recently generated report, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or the row is corrupt.
    pub async fn latest(&self) -> Result<Option<Report>> {
        let row: Option<ReportRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} ORDER BY generated_at DESC, rowid DESC LIMIT 1"
        ))
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(ReportRow::into_report).transpose()
    }

    /// Fetch one report by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no report has `id`, or `AppError::Db`
    /// if the query fails.
    pub async fn get(&self, id: &str) -> Result<Report> {
        let row: Option<ReportRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(ReportRow::into_report)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("report {id} not found")))
    }

    /// Number of stored reports.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM report")
            .fetch_one(self.db.as_ref())
            .await?;
        Ok(count)
    }

    /// Purge reports generated before `before`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn purge_before(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM report WHERE generated_at < ?1")
            .bind(timestamp(before))
            .execute(self.db.as_ref())
            .await?;
        Ok(result.rows_affected())
    }
}
