//! Task-source collaborators.
//!
//! The [`TaskSource`] trait decouples the report pipeline from the task
//! provider. Records are returned as raw JSON; canonicalization happens in
//! [`crate::engine::normalizer`].

pub mod notion;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::Result;

/// Boxed future returned by [`TaskSource::fetch_all_tasks`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>>;

/// Provider of raw task records.
pub trait TaskSource: Send + Sync {
    /// Fetch every task record currently in the provider.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SourceUnavailable`](crate::AppError::SourceUnavailable)
    /// on network, authentication or configuration failure.
    fn fetch_all_tasks(&self) -> FetchFuture<'_>;
}
