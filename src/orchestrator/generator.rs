//! Batch report generation.
//!
//! Pipeline: fetch, normalize, summarize, classify, render, persist. Every
//! recoverable failure along the way becomes a [`ReportWarning`] on the
//! outcome; a rendered report is always returned.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, info_span, warn, Instrument};

use crate::config::TimeoutConfig;
use crate::engine::{assembler, classifier, normalizer};
use crate::models::classification::ClassificationResult;
use crate::models::report::{Report, TaskSummaryStats};
use crate::models::task::Task;
use crate::persistence::report_repo::ReportRepo;
use crate::source::TaskSource;
use crate::summarizer::Summarizer;
use crate::AppError;

/// Summary text used when the summarizer fails.
pub const FALLBACK_SUMMARY: &str =
    "AI summary is unavailable right now. The statistics above reflect the current task data.";

/// Summary text used when the task source returned nothing.
pub const NO_TASKS_SUMMARY: &str = "No tasks found. There is no task data to summarize.";

/// Recoverable condition encountered while generating a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportWarning {
    /// The task source failed or timed out; the report covers no tasks.
    SourceUnavailable(String),
    /// The task source returned an empty list.
    NoTasksFound,
    /// The summarizer failed or timed out; the fallback sentence was used.
    SummarizerFailed(String),
    /// This many due dates could not be parsed and were treated as absent.
    InvalidDates(usize),
    /// The report could not be stored.
    PersistenceFailed(String),
}

impl ReportWarning {
    /// Stable machine-readable identifier for this warning.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::NoTasksFound => "no_tasks_found",
            Self::SummarizerFailed(_) => "summarizer_failed",
            Self::InvalidDates(_) => "invalid_date_format",
            Self::PersistenceFailed(_) => "persistence_failed",
        }
    }
}

impl Display for ReportWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceUnavailable(msg) => write!(f, "task source unavailable: {msg}"),
            Self::NoTasksFound => write!(f, "no tasks found"),
            Self::SummarizerFailed(msg) => write!(f, "summarizer failed: {msg}"),
            Self::InvalidDates(count) => {
                write!(f, "{count} due date(s) could not be parsed and were ignored")
            }
            Self::PersistenceFailed(msg) => write!(f, "report was not saved: {msg}"),
        }
    }
}

/// Wire form of a [`ReportWarning`]: `{"kind": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningBody {
    /// Stable identifier from [`ReportWarning::kind`].
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

impl From<&ReportWarning> for WarningBody {
    fn from(warning: &ReportWarning) -> Self {
        Self {
            kind: warning.kind().to_owned(),
            message: warning.to_string(),
        }
    }
}

impl Serialize for ReportWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WarningBody::from(self).serialize(serializer)
    }
}

/// Normalized tasks and their classification at one point in time.
#[derive(Debug, Clone, Default)]
pub struct TaskSnapshot {
    /// Canonical tasks in source order.
    pub tasks: Vec<Task>,
    /// Classification of `tasks`.
    pub classification: ClassificationResult,
    /// Source and normalization warnings.
    pub warnings: Vec<ReportWarning>,
}

/// Result of one batch generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The rendered report.
    pub report: Report,
    /// Everything that degraded the report.
    pub warnings: Vec<ReportWarning>,
    /// Whether the report reached the store.
    pub persisted: bool,
}

/// Runs the report pipeline against injected collaborators.
#[derive(Clone)]
pub struct ReportGenerator {
    source: Arc<dyn TaskSource>,
    summarizer: Arc<dyn Summarizer>,
    reports: Option<ReportRepo>,
    risk_window_days: u32,
    timeouts: TimeoutConfig,
}

impl ReportGenerator {
    /// Create a generator without a report store.
    #[must_use]
    pub fn new(
        source: Arc<dyn TaskSource>,
        summarizer: Arc<dyn Summarizer>,
        risk_window_days: u32,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            source,
            summarizer,
            reports: None,
            risk_window_days,
            timeouts,
        }
    }

    /// Persist generated reports into `repo`.
    #[must_use]
    pub fn with_store(mut self, repo: ReportRepo) -> Self {
        self.reports = Some(repo);
        self
    }

    pub(crate) fn summarizer(&self) -> &dyn Summarizer {
        self.summarizer.as_ref()
    }

    pub(crate) fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Fetch, normalize and classify the current tasks.
    ///
    /// Source failures are folded into the snapshot's warnings.
    pub async fn snapshot(&self, today: NaiveDate) -> TaskSnapshot {
        let mut warnings = Vec::new();

        let raws = match tokio::time::timeout(self.timeouts.source(), self.source.fetch_all_tasks())
            .await
        {
            Ok(Ok(raws)) => raws,
            Ok(Err(err)) => {
                warn!(%err, "task source failed; continuing with no tasks");
                warnings.push(ReportWarning::SourceUnavailable(err.to_string()));
                Vec::new()
            }
            Err(_) => {
                warn!("task source timed out; continuing with no tasks");
                warnings.push(ReportWarning::SourceUnavailable(
                    "task source call timed out".into(),
                ));
                Vec::new()
            }
        };

        let batch = normalizer::normalize_all(&raws);
        if batch.invalid_dates > 0 {
            warnings.push(ReportWarning::InvalidDates(batch.invalid_dates));
        }

        let classification = classifier::classify(&batch.tasks, today, self.risk_window_days);
        TaskSnapshot {
            tasks: batch.tasks,
            classification,
            warnings,
        }
    }

    /// Generate a report for `owner_user` as of the local date.
    pub async fn generate_report(&self, owner_user: &str) -> GenerationOutcome {
        self.generate_report_for(owner_user, Local::now().date_naive())
            .await
    }

    /// Generate a report for `owner_user` as of `today`.
    pub async fn generate_report_for(&self, owner_user: &str, today: NaiveDate) -> GenerationOutcome {
        let span = info_span!("generate_report", owner = owner_user, %today);
        async move {
            let mut snapshot = self.snapshot(today).await;

            let summary_text = if snapshot.tasks.is_empty() {
                snapshot.warnings.push(ReportWarning::NoTasksFound);
                NO_TASKS_SUMMARY.to_owned()
            } else {
                match self.summarize(&snapshot.tasks).await {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(%err, "summarizer failed; using fallback summary");
                        snapshot
                            .warnings
                            .push(ReportWarning::SummarizerFailed(err.to_string()));
                        FALLBACK_SUMMARY.to_owned()
                    }
                }
            };

            self.finish(owner_user, today, snapshot, summary_text).await
        }
        .instrument(span)
        .await
    }

    async fn summarize(&self, tasks: &[Task]) -> crate::Result<String> {
        tokio::time::timeout(self.timeouts.summarizer(), self.summarizer.summarize(tasks))
            .await
            .map_err(|_| AppError::Summarizer("summarizer call timed out".into()))?
    }

    /// Render, persist and package a report from a snapshot and its prose.
    pub(crate) async fn finish(
        &self,
        owner_user: &str,
        today: NaiveDate,
        snapshot: TaskSnapshot,
        summary_text: String,
    ) -> GenerationOutcome {
        let TaskSnapshot {
            classification,
            mut warnings,
            ..
        } = snapshot;

        let markdown = assembler::render(&classification, &summary_text, owner_user, today);
        let report = Report::new(
            owner_user.to_owned(),
            markdown,
            summary_text,
            TaskSummaryStats::from(&classification),
        );

        let persisted = match &self.reports {
            Some(repo) => match repo.append(&report).await {
                Ok(id) => {
                    info!(report_id = %id, "report persisted");
                    true
                }
                Err(err) => {
                    warn!(%err, "failed to persist report");
                    warnings.push(ReportWarning::PersistenceFailed(err.to_string()));
                    false
                }
            },
            None => false,
        };

        info!(
            report_id = %report.id,
            total = report.task_summary.total_tasks,
            warnings = warnings.len(),
            "report generated"
        );

        GenerationOutcome {
            report,
            warnings,
            persisted,
        }
    }
}
