//! Notion database query client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{FetchFuture, TaskSource};
use crate::config::SourceConfig;
use crate::{AppError, Result};

/// Upper bound on pages followed per fetch, guarding against cursor loops.
const MAX_PAGES: usize = 50;

/// One page of a Notion database query response.
#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// [`TaskSource`] backed by the Notion database query endpoint.
#[derive(Clone)]
pub struct NotionSource {
    config: SourceConfig,
    http: reqwest::Client,
    timeout: Duration,
}

impl NotionSource {
    /// Build a client for the configured database.
    ///
    /// `timeout` bounds each HTTP round-trip.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: SourceConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build notion client: {err}")))?;
        Ok(Self {
            config,
            http,
            timeout,
        })
    }

    async fn fetch_pages(&self) -> Result<Vec<Value>> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(AppError::SourceUnavailable(
                "notion api key is not configured".into(),
            ));
        };

        let url = format!(
            "{}/databases/{}/query",
            self.config.base_url.trim_end_matches('/'),
            self.config.database_id
        );

        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for page_index in 0..MAX_PAGES {
            let mut body = json!({ "page_size": self.config.page_size });
            if let Some(ref c) = cursor {
                body["start_cursor"] = Value::String(c.clone());
            }

            let response = self
                .http
                .post(&url)
                .bearer_auth(api_key)
                .header("Notion-Version", self.config.api_version.as_str())
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await
                .map_err(|err| AppError::SourceUnavailable(format!("notion request failed: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(AppError::SourceUnavailable(format!(
                    "notion query returned {status}: {detail}"
                )));
            }

            let page: QueryPage = response.json().await.map_err(|err| {
                AppError::SourceUnavailable(format!("invalid notion response: {err}"))
            })?;

            debug!(
                page = page_index,
                count = page.results.len(),
                "fetched notion page"
            );
            records.extend(page.results);

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => {
                    info!(count = records.len(), "fetched notion tasks");
                    return Ok(records);
                }
            }
        }

        warn!(
            max_pages = MAX_PAGES,
            count = records.len(),
            "notion pagination limit reached; returning partial task list"
        );
        Ok(records)
    }
}

impl TaskSource for NotionSource {
    fn fetch_all_tasks(&self) -> FetchFuture<'_> {
        Box::pin(self.fetch_pages())
    }
}
