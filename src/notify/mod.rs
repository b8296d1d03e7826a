//! Outbound notification channels.
//!
//! A [`Notifier`] delivers finished reports and per-task deadline alerts
//! to a single recipient. Recipients are transport specific: an email
//! address for [`email::EmailNotifier`], a channel or user id for
//! [`slack::SlackNotifier`].

pub mod email;
pub mod markdown;
pub mod slack;

use std::future::Future;
use std::pin::Pin;

use crate::engine::format;
use crate::models::classification::{AtRiskTask, OverdueTask};
use crate::Result;

/// Boxed future returned by every [`Notifier`] method.
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Binary attachment carried with a report message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAttachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

/// A rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMessage {
    /// Subject line (email) or heading (chat).
    pub subject: String,
    /// Markdown report body.
    pub markdown: String,
    /// Optional PDF rendition of the body.
    pub attachment: Option<PdfAttachment>,
}

/// Delivery channel for reports and deadline alerts.
pub trait Notifier: Send + Sync {
    /// Deliver a full report.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Notification`](crate::AppError::Notification)
    /// if delivery fails or times out.
    fn send_report<'a>(&'a self, message: &'a ReportMessage, recipient: &'a str)
        -> NotifyFuture<'a>;

    /// Tell an assignee that one of their tasks is past due.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Notification`](crate::AppError::Notification)
    /// if delivery fails or times out.
    fn send_overdue_alert<'a>(&'a self, entry: &'a OverdueTask, recipient: &'a str)
        -> NotifyFuture<'a>;

    /// Remind an assignee that one of their tasks is due soon.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Notification`](crate::AppError::Notification)
    /// if delivery fails or times out.
    fn send_at_risk_reminder<'a>(
        &'a self,
        entry: &'a AtRiskTask,
        recipient: &'a str,
    ) -> NotifyFuture<'a>;
}

/// Pick the recipient for a task alert.
///
/// The assignee's own contact wins; otherwise the configured default is
/// used. Blank values count as missing.
#[must_use]
pub fn resolve_recipient<'a>(
    contact: Option<&'a str>,
    default: Option<&'a str>,
) -> Option<&'a str> {
    contact
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| default.map(str::trim).filter(|d| !d.is_empty()))
}

/// Subject and plain-text body for an overdue alert.
#[must_use]
pub fn overdue_alert_text(entry: &OverdueTask) -> (String, String) {
    let task = &entry.task;
    let subject = format!("Overdue Task Alert: {}", task.title);
    let body = format!(
        "Hi {},\n\nThis is a reminder that your task is now overdue:\n\n\
         Task: {}\nDays Overdue: {}\nTask URL: {}\n\n\
         Please update the task status or reach out if you need help!\n",
        task.assignee_name,
        task.title,
        format::days(entry.days_overdue),
        task.source_url.as_deref().unwrap_or("n/a"),
    );
    (subject, body)
}

/// Subject and plain-text body for an at-risk reminder.
#[must_use]
pub fn at_risk_reminder_text(entry: &AtRiskTask) -> (String, String) {
    let task = &entry.task;
    let due = if entry.days_until_due == 0 {
        "today".to_owned()
    } else {
        format!("in {}", format::days(entry.days_until_due))
    };
    let subject = format!("Deadline Reminder: {}", task.title);
    let body = format!(
        "Hi {},\n\nFriendly reminder that your task is coming up soon:\n\n\
         Task: {}\nDue: {due}\nTask URL: {}\n",
        task.assignee_name,
        task.title,
        task.source_url.as_deref().unwrap_or("n/a"),
    );
    (subject, body)
}
