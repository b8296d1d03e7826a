//! Report packaging and deadline alert fan-out.

use serde::Serialize;
use tracing::{info, warn};

use crate::document::DocumentRenderer;
use crate::models::classification::ClassificationResult;
use crate::models::report::Report;
use crate::notify::{resolve_recipient, Notifier, PdfAttachment, ReportMessage};
use crate::Result;

/// Title printed on report documents and used as the message subject.
pub const REPORT_TITLE: &str = "Daily Project Report";

/// Characters of summary prose included in excerpt emails.
pub const EXCERPT_CHARS: usize = 250;

/// How much of the report goes into the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody {
    /// The full markdown report.
    Full,
    /// A short excerpt of the summary prose; the PDF carries the rest.
    Excerpt,
}

/// Counts from one alert dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    /// Alerts delivered.
    pub sent: usize,
    /// Alerts the notifier rejected.
    pub failed: usize,
    /// Tasks with no resolvable recipient.
    pub skipped: usize,
}

/// File name for a report's PDF rendition.
#[must_use]
pub fn pdf_filename(report: &Report) -> String {
    format!(
        "project-report-{}.pdf",
        report.generated_at.format("%Y%m%d-%H%M%S")
    )
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}

/// Package a stored report for delivery, with its PDF attached.
///
/// # Errors
///
/// Returns `AppError::Render` if the PDF cannot be produced.
pub fn report_message(
    report: &Report,
    renderer: &dyn DocumentRenderer,
    body: MessageBody,
) -> Result<ReportMessage> {
    let bytes = renderer.to_pdf(REPORT_TITLE, &report.markdown_body)?;
    let markdown = match body {
        MessageBody::Full => report.markdown_body.clone(),
        MessageBody::Excerpt => format!(
            "# {REPORT_TITLE}\n\n{}\n\nThe full report is attached as a PDF.",
            excerpt(&report.summary_text)
        ),
    };

    Ok(ReportMessage {
        subject: format!(
            "{REPORT_TITLE} - {}",
            report.generated_at.format("%Y-%m-%d")
        ),
        markdown,
        attachment: Some(PdfAttachment {
            filename: pdf_filename(report),
            bytes,
        }),
    })
}

/// Send one alert per overdue task and one reminder per at-risk task.
///
/// Each task goes to its assignee contact, or `default_recipient` when it
/// has none. Tasks with neither are skipped. Delivery failures are counted
/// and do not stop the remaining alerts.
pub async fn dispatch_deadline_alerts(
    classification: &ClassificationResult,
    notifier: &dyn Notifier,
    default_recipient: Option<&str>,
) -> AlertSummary {
    let mut summary = AlertSummary::default();

    for entry in &classification.overdue_tasks {
        let Some(recipient) =
            resolve_recipient(entry.task.assignee_contact.as_deref(), default_recipient)
        else {
            summary.skipped += 1;
            continue;
        };
        match notifier.send_overdue_alert(entry, recipient).await {
            Ok(()) => summary.sent += 1,
            Err(err) => {
                warn!(%err, task = %entry.task.title, "overdue alert failed");
                summary.failed += 1;
            }
        }
    }

    for entry in &classification.at_risk_tasks {
        let Some(recipient) =
            resolve_recipient(entry.task.assignee_contact.as_deref(), default_recipient)
        else {
            summary.skipped += 1;
            continue;
        };
        match notifier.send_at_risk_reminder(entry, recipient).await {
            Ok(()) => summary.sent += 1,
            Err(err) => {
                warn!(%err, task = %entry.task.title, "at-risk reminder failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "deadline alerts dispatched"
    );
    summary
}
