//! Language-model summarizer collaborators.
//!
//! The [`Summarizer`] trait hides the text-generation service behind a
//! batch call and a streaming call. Streams yield text fragments in the
//! order the service produces them; dropping the stream closes the
//! upstream connection.

pub mod chat;

use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use crate::models::task::Task;
use crate::Result;

/// Lazily produced sequence of summary fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Boxed future returned by [`Summarizer::summarize`].
pub type SummaryFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Boxed future returned by [`Summarizer::summarize_stream`].
pub type StreamFuture<'a> = Pin<Box<dyn Future<Output = Result<FragmentStream>> + Send + 'a>>;

/// Text-generation service that turns a task list into status prose.
pub trait Summarizer: Send + Sync {
    /// Produce a complete summary for `tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Summarizer`](crate::AppError::Summarizer) if the
    /// service call fails or returns no content.
    fn summarize<'a>(&'a self, tasks: &'a [Task]) -> SummaryFuture<'a>;

    /// Open an incremental summary stream for `tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Summarizer`](crate::AppError::Summarizer) if the
    /// stream cannot be opened. Failures after opening surface as `Err`
    /// items on the stream.
    fn summarize_stream<'a>(&'a self, tasks: &'a [Task]) -> StreamFuture<'a>;
}

/// Render tasks as one compact line each for inclusion in a prompt.
#[must_use]
pub fn task_digest(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        let due = task
            .due_date
            .map_or_else(|| "no due date".to_owned(), |d| d.to_string());
        let _ = writeln!(
            out,
            "- {} | status: {} | assignee: {} | priority: {} | due: {}",
            task.title,
            task.status.label(),
            task.assignee_name,
            task.priority,
            due
        );
    }
    out
}
