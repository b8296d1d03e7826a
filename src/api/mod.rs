//! HTTP and WebSocket API.
//!
//! All handlers share one [`AppState`]. Errors render as
//! `{"kind": ..., "message": ...}` bodies (see [`error`]).

pub mod error;
pub mod reports;
pub mod tasks;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::document::DocumentRenderer;
use crate::notify::Notifier;
use crate::orchestrator::generator::ReportGenerator;
use crate::persistence::report_repo::ReportRepo;
use crate::{AppError, GlobalConfig, Result};

/// Shared state handed to every handler.
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<GlobalConfig>,
    /// Report pipeline.
    pub generator: ReportGenerator,
    /// Report store.
    pub reports: ReportRepo,
    /// Delivery channel; `None` when notifications are disabled.
    pub notifier: Option<Arc<dyn Notifier>>,
    /// PDF renderer.
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// The configured notifier, or an error when notifications are off.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when no transport is configured.
    pub fn notifier(&self) -> Result<&dyn Notifier> {
        self.notifier
            .as_deref()
            .ok_or_else(|| AppError::Config("notifications are disabled".into()))
    }
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/reports",
            post(reports::generate).get(reports::list),
        )
        .route("/reports/latest", get(reports::latest))
        .route("/reports/{id}/pdf", get(reports::pdf))
        .route("/reports/{id}/email", post(reports::email))
        .route("/dashboard", get(tasks::dashboard))
        .route("/tasks/overdue", get(tasks::overdue))
        .route("/tasks/at-risk", get(tasks::at_risk))
        .route("/tasks/alerts", post(tasks::alerts))
        .route("/ws/summary", get(ws::summary_stream))
        .with_state(state)
}

/// Bind the configured port and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the server fails to bind, or
/// `AppError::Io` if serving fails.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {bind}: {err}")))?;
    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if serving fails.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http api listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("http server error: {err}")))?;

    info!("http api stopped");
    Ok(())
}
