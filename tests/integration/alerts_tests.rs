//! Integration tests for deadline alert dispatch.

use task_digest::engine::classifier::classify;
use task_digest::models::task::{Task, TaskStatus};
use task_digest::orchestrator::delivery::{dispatch_deadline_alerts, AlertSummary};

use super::test_helpers::{date, RecordingNotifier};

fn task(title: &str, contact: Option<&str>, due: (i32, u32, u32)) -> Task {
    Task::new(title, TaskStatus::InProgress)
        .with_assignee("Ana", contact.map(str::to_owned))
        .with_due_date(Some(date(due.0, due.1, due.2)))
}

#[tokio::test]
async fn routes_to_contact_then_default() {
    let tasks = vec![
        task("Late", Some("ana@example.com"), (2024, 1, 1)),
        task("Soon", None, (2024, 1, 6)),
    ];
    let classification = classify(&tasks, date(2024, 1, 5), 2);
    let notifier = RecordingNotifier::default();

    let summary =
        dispatch_deadline_alerts(&classification, &notifier, Some("team@example.com")).await;

    assert_eq!(
        summary,
        AlertSummary {
            sent: 2,
            failed: 0,
            skipped: 0
        }
    );
    let sent = notifier.sent();
    assert_eq!(sent[0].kind, "overdue");
    assert_eq!(sent[0].recipient, "ana@example.com");
    assert_eq!(sent[1].kind, "at_risk");
    assert_eq!(sent[1].recipient, "team@example.com");
}

#[tokio::test]
async fn tasks_without_any_recipient_are_skipped() {
    let tasks = vec![task("Late", None, (2024, 1, 1))];
    let classification = classify(&tasks, date(2024, 1, 5), 2);
    let notifier = RecordingNotifier::default();

    let summary = dispatch_deadline_alerts(&classification, &notifier, None).await;

    assert_eq!(summary.skipped, 1);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn delivery_failures_are_counted_and_do_not_stop_others() {
    let tasks = vec![
        task("First", Some("bounce@example.com"), (2024, 1, 1)),
        task("Second", Some("ok@example.com"), (2024, 1, 2)),
    ];
    let classification = classify(&tasks, date(2024, 1, 5), 2);
    let notifier = RecordingNotifier::rejecting(&["bounce@example.com"]);

    let summary = dispatch_deadline_alerts(&classification, &notifier, None).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(notifier.sent()[0].subject, "Second");
}

#[tokio::test]
async fn done_tasks_never_alert() {
    let tasks = vec![Task::new("Finished", TaskStatus::Done)
        .with_assignee("Ana", Some("ana@example.com".into()))
        .with_due_date(Some(date(2024, 1, 1)))];
    let classification = classify(&tasks, date(2024, 1, 5), 2);
    let notifier = RecordingNotifier::default();

    let summary = dispatch_deadline_alerts(&classification, &notifier, None).await;

    assert_eq!(summary, AlertSummary::default());
}
