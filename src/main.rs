#![forbid(unsafe_code)]

//! `task-digest` server binary.
//!
//! Bootstraps configuration and credentials, opens the report store,
//! wires the task source, summarizer and notifier, then runs the HTTP API
//! alongside the scheduler and retention tasks until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use task_digest::api::{self, AppState};
use task_digest::config::{GlobalConfig, NotifyTransport};
use task_digest::document::pdf::PdfRenderer;
use task_digest::document::DocumentRenderer;
use task_digest::notify::email::EmailNotifier;
use task_digest::notify::slack::SlackNotifier;
use task_digest::notify::Notifier;
use task_digest::orchestrator::generator::ReportGenerator;
use task_digest::orchestrator::scheduler::Scheduler;
use task_digest::persistence::report_repo::ReportRepo;
use task_digest::persistence::{db, retention};
use task_digest::source::notion::NotionSource;
use task_digest::summarizer::chat::ChatSummarizer;
use task_digest::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "task-digest", about = "Project task digest server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the HTTP port from the configuration file.
    #[arg(long)]
    port: Option<u16>,

    /// Generate one report, print its markdown and exit.
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("task-digest bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path).await?);
    let reports = ReportRepo::new(Arc::clone(&db));
    info!(path = %config.db_path.display(), "database connected");

    // ── Collaborators ───────────────────────────────────
    let source = NotionSource::new(config.source.clone(), config.timeouts.source())?;
    let summarizer =
        ChatSummarizer::new(config.summarizer.clone(), config.timeouts.summarizer())?;
    let generator = ReportGenerator::new(
        Arc::new(source),
        Arc::new(summarizer),
        config.risk_window_days,
        config.timeouts.clone(),
    )
    .with_store(reports.clone());
    let notifier = build_notifier(&config)?;
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfRenderer::new());

    if args.once {
        let outcome = generator.generate_report(&config.default_owner).await;
        for warning in &outcome.warnings {
            warn!(kind = warning.kind(), %warning, "report degraded");
        }
        println!("{}", outcome.report.markdown_body);
        return Ok(());
    }

    let ct = CancellationToken::new();

    // ── Background tasks ────────────────────────────────
    let retention_handle =
        retention::spawn_retention_task(reports.clone(), config.retention_days, ct.clone());

    let scheduler_handle = if config.scheduler.enabled {
        let scheduler = Scheduler::new(
            generator.clone(),
            notifier.clone(),
            Arc::clone(&renderer),
            config.scheduler.clone(),
            config.notify.default_recipient.clone(),
        );
        Some(scheduler.spawn(config.scheduler_interval(), ct.clone()))
    } else {
        info!("scheduler disabled");
        None
    };

    // ── HTTP API ────────────────────────────────────────
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        generator,
        reports,
        notifier,
        renderer,
    });
    let api_ct = ct.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(err) = api::serve(state, api_ct).await {
            error!(%err, "http api failed");
        }
    });

    info!(port = config.http_port, "task-digest ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = api_handle.await {
        error!(%err, "http api task panicked");
    }
    for handle in [retention_handle, scheduler_handle].into_iter().flatten() {
        if let Err(err) = handle.await {
            error!(%err, "background task panicked");
        }
    }
    info!("task-digest shut down");

    Ok(())
}

fn build_notifier(config: &GlobalConfig) -> Result<Option<Arc<dyn Notifier>>> {
    let timeout = config.timeouts.notify();
    match config.notify.transport {
        NotifyTransport::None => {
            info!("notifications disabled");
            Ok(None)
        }
        NotifyTransport::Email => {
            let smtp = config.notify.smtp.as_ref().ok_or_else(|| {
                AppError::Config("notify.smtp is required for email transport".into())
            })?;
            info!(host = %smtp.host, "email notifications enabled");
            Ok(Some(Arc::new(EmailNotifier::new(smtp, timeout)?)))
        }
        NotifyTransport::Slack => {
            if config.notify.slack.bot_token.is_empty() {
                warn!("slack bot token missing; notifications disabled");
                return Ok(None);
            }
            info!("slack notifications enabled");
            Ok(Some(Arc::new(SlackNotifier::new(&config.notify.slack, timeout)?)))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
