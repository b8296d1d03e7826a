//! Shared fakes and builders for integration tests.
//!
//! Every collaborator trait has an in-process fake here so tests can
//! drive the report pipeline without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use task_digest::api::{self, AppState};
use task_digest::config::GlobalConfig;
use task_digest::document::pdf::PdfRenderer;
use task_digest::models::classification::{AtRiskTask, OverdueTask};
use task_digest::models::task::Task;
use task_digest::notify::{Notifier, NotifyFuture, ReportMessage};
use task_digest::orchestrator::generator::ReportGenerator;
use task_digest::persistence::db;
use task_digest::persistence::report_repo::ReportRepo;
use task_digest::source::{FetchFuture, TaskSource};
use task_digest::summarizer::{FragmentStream, StreamFuture, Summarizer, SummaryFuture};
use task_digest::{AppError, Result};

/// Minimal valid configuration with short timeouts.
pub fn test_config() -> GlobalConfig {
    let toml = r#"
http_port = 0
default_owner = "tester"
risk_window_days = 2
retention_days = 0

[source]
database_id = "db-test"

[timeouts]
source_seconds = 2
summarizer_seconds = 2
stream_idle_seconds = 1
notify_seconds = 2

[notify]
default_recipient = "team@example.com"
"#;
    GlobalConfig::from_toml_str(toml).expect("valid test config")
}

/// A flat raw task record.
pub fn flat_task(
    title: &str,
    status: &str,
    assignee: &str,
    contact: Option<&str>,
    due: Option<NaiveDate>,
) -> Value {
    let mut record = json!({
        "title": title,
        "status": status,
        "assignee": assignee,
        "priority": "High",
        "url": format!("https://tasks.example.com/{title}"),
    });
    if let Some(contact) = contact {
        record["assignee_email"] = Value::String(contact.to_owned());
    }
    if let Some(due) = due {
        record["due_date"] = Value::String(due.format("%Y-%m-%d").to_string());
    }
    record
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

// ── Task source ───────────────────────────────────────────────

/// Task source returning canned records, an error, or records after a delay.
pub struct FakeSource {
    records: Vec<Value>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            records,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_owned()),
            ..Self::with_records(Vec::new())
        }
    }

    pub fn slow(records: Vec<Value>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_records(records)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TaskSource for FakeSource {
    fn fetch_all_tasks(&self) -> FetchFuture<'_> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.failure {
                Some(message) => Err(AppError::SourceUnavailable(message.clone())),
                None => Ok(self.records.clone()),
            }
        })
    }
}

// ── Summarizer ────────────────────────────────────────────────

/// Sets its flag when dropped; travels inside fake streams.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

enum Behavior {
    Text(String),
    Fail(String),
    Fragments(Vec<String>),
    FailAfter(Vec<String>, String),
    Endless,
}

/// Summarizer with scripted batch and stream behavior.
pub struct FakeSummarizer {
    behavior: Behavior,
    stream_dropped: Arc<AtomicBool>,
    calls: AtomicUsize,
}

impl FakeSummarizer {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            stream_dropped: Arc::new(AtomicBool::new(false)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Batch call returns `text`; the stream yields it as one fragment.
    pub fn text(text: &str) -> Self {
        Self::new(Behavior::Text(text.to_owned()))
    }

    /// Both calls fail.
    pub fn failing(message: &str) -> Self {
        Self::new(Behavior::Fail(message.to_owned()))
    }

    /// Stream yields `fragments` in order; batch returns them joined.
    pub fn fragments(fragments: &[&str]) -> Self {
        Self::new(Behavior::Fragments(
            fragments.iter().map(|f| (*f).to_owned()).collect(),
        ))
    }

    /// Stream yields `fragments` and then an error.
    pub fn fail_after(fragments: &[&str], message: &str) -> Self {
        Self::new(Behavior::FailAfter(
            fragments.iter().map(|f| (*f).to_owned()).collect(),
            message.to_owned(),
        ))
    }

    /// Stream never ends on its own.
    pub fn endless() -> Self {
        Self::new(Behavior::Endless)
    }

    pub fn stream_dropped(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stream_dropped)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn finite_stream(&self, items: Vec<Result<String>>) -> FragmentStream {
        let flag = DropFlag(Arc::clone(&self.stream_dropped));
        let queue: VecDeque<Result<String>> = items.into();
        Box::pin(futures_util::stream::unfold(
            (flag, queue),
            |(flag, mut queue)| async move {
                let item = queue.pop_front()?;
                Some((item, (flag, queue)))
            },
        ))
    }

    fn endless_stream(&self) -> FragmentStream {
        let flag = DropFlag(Arc::clone(&self.stream_dropped));
        Box::pin(futures_util::stream::unfold(
            (flag, 0usize),
            |(flag, n)| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Some((Ok(format!("t{n} ")), (flag, n + 1)))
            },
        ))
    }
}

impl Summarizer for FakeSummarizer {
    fn summarize<'a>(&'a self, _tasks: &'a [Task]) -> SummaryFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.behavior {
            Behavior::Text(text) => Ok(text.clone()),
            Behavior::Fragments(parts) => Ok(parts.concat()),
            Behavior::Fail(message) | Behavior::FailAfter(_, message) => {
                Err(AppError::Summarizer(message.clone()))
            }
            Behavior::Endless => Ok("endless".to_owned()),
        };
        Box::pin(async move { result })
    }

    fn summarize_stream<'a>(&'a self, _tasks: &'a [Task]) -> StreamFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.behavior {
            Behavior::Text(text) => Ok(self.finite_stream(vec![Ok(text.clone())])),
            Behavior::Fragments(parts) => {
                Ok(self.finite_stream(parts.iter().cloned().map(Ok).collect()))
            }
            Behavior::FailAfter(parts, message) => {
                let mut items: Vec<Result<String>> = parts.iter().cloned().map(Ok).collect();
                items.push(Err(AppError::Summarizer(message.clone())));
                Ok(self.finite_stream(items))
            }
            Behavior::Fail(message) => Err(AppError::Summarizer(message.clone())),
            Behavior::Endless => Ok(self.endless_stream()),
        };
        Box::pin(async move { result })
    }
}

// ── Notifier ──────────────────────────────────────────────────

/// One delivery captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub kind: &'static str,
    pub recipient: String,
    pub subject: String,
    pub has_attachment: bool,
}

/// Notifier that records deliveries and fails for chosen recipients.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    reject: Vec<String>,
}

impl RecordingNotifier {
    pub fn rejecting(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: recipients.iter().map(|r| (*r).to_owned()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("lock").clone()
    }

    fn record(&self, sent: Sent) -> Result<()> {
        if self.reject.contains(&sent.recipient) {
            return Err(AppError::Notification(format!(
                "rejected {}",
                sent.recipient
            )));
        }
        self.sent.lock().expect("lock").push(sent);
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    fn send_report<'a>(
        &'a self,
        message: &'a ReportMessage,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        let result = self.record(Sent {
            kind: "report",
            recipient: recipient.to_owned(),
            subject: message.subject.clone(),
            has_attachment: message.attachment.is_some(),
        });
        Box::pin(async move { result })
    }

    fn send_overdue_alert<'a>(
        &'a self,
        entry: &'a OverdueTask,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        let result = self.record(Sent {
            kind: "overdue",
            recipient: recipient.to_owned(),
            subject: entry.task.title.clone(),
            has_attachment: false,
        });
        Box::pin(async move { result })
    }

    fn send_at_risk_reminder<'a>(
        &'a self,
        entry: &'a AtRiskTask,
        recipient: &'a str,
    ) -> NotifyFuture<'a> {
        let result = self.record(Sent {
            kind: "at_risk",
            recipient: recipient.to_owned(),
            subject: entry.task.title.clone(),
            has_attachment: false,
        });
        Box::pin(async move { result })
    }
}

// ── Wiring ────────────────────────────────────────────────────

/// Generator over fakes, persisting into a fresh in-memory store.
pub async fn test_generator(
    source: Arc<FakeSource>,
    summarizer: Arc<FakeSummarizer>,
) -> (ReportGenerator, ReportRepo) {
    let config = test_config();
    let pool = db::connect_memory().await.expect("db");
    let repo = ReportRepo::new(Arc::new(pool));
    let generator = ReportGenerator::new(
        source,
        summarizer,
        config.risk_window_days,
        config.timeouts.clone(),
    )
    .with_store(repo.clone());
    (generator, repo)
}

/// Full API state over fakes.
pub async fn test_app_state(
    source: Arc<FakeSource>,
    summarizer: Arc<FakeSummarizer>,
    notifier: Option<Arc<RecordingNotifier>>,
) -> Arc<AppState> {
    let (generator, reports) = test_generator(source, summarizer).await;
    Arc::new(AppState {
        config: Arc::new(test_config()),
        generator,
        reports,
        notifier: notifier.map(|n| n as Arc<dyn Notifier>),
        renderer: Arc::new(PdfRenderer::new()),
    })
}

/// Router served on an ephemeral local port; stops when dropped.
pub struct TestServer {
    /// `http://127.0.0.1:<port>`.
    pub base_url: String,
    ct: CancellationToken,
}

impl TestServer {
    /// WebSocket URL for `path` on this server.
    pub fn ws_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.replacen("http", "ws", 1))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.ct.cancel();
    }
}

/// Serve `state` on `127.0.0.1:0`.
pub async fn spawn_server(state: Arc<AppState>) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = api::serve_on(listener, state, server_ct).await;
    });
    TestServer {
        base_url: format!("http://{addr}"),
        ct,
    }
}
