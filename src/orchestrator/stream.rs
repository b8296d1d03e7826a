//! Streaming report generation.
//!
//! Summary fragments are forwarded to a caller-supplied channel as the
//! summarizer produces them. The channel is expected to have capacity 1,
//! so the producer suspends until the consumer has taken the previous
//! fragment. When the consumer drops its receiver the producer stops at
//! whichever stage it is in (fetching tasks, opening the summary or
//! pumping fragments) and the upstream stream is dropped, closing the
//! summarizer connection.

use chrono::NaiveDate;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument};

use super::generator::{
    GenerationOutcome, ReportGenerator, ReportWarning, FALLBACK_SUMMARY, NO_TASKS_SUMMARY,
};
use crate::models::task::Task;
use crate::summarizer::FragmentStream;
use crate::AppError;

/// One message delivered to a streaming consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryFragment {
    /// A piece of summary text.
    Token(String),
    /// The upstream stream failed; no further fragments follow.
    Error(String),
}

/// How a streaming generation ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// All fragments were delivered and the report was built.
    Completed(Box<GenerationOutcome>),
    /// The consumer went away; nothing was persisted.
    Cancelled,
}

/// Why the fragment pump stopped.
enum PumpEnd {
    Finished,
    Failed(String),
    Disconnected,
}

impl ReportGenerator {
    /// Stream a summary for `owner_user` into `sink`, then build the report.
    ///
    /// The sink is dropped when this returns, which consumers observe as the
    /// end of the stream.
    pub async fn stream_report(
        &self,
        owner_user: &str,
        today: NaiveDate,
        sink: mpsc::Sender<SummaryFragment>,
    ) -> StreamOutcome {
        let span = info_span!("stream_report", owner = owner_user, %today);
        async move {
            let mut snapshot = tokio::select! {
                biased;
                () = sink.closed() => {
                    info!("stream consumer disconnected while fetching tasks");
                    return StreamOutcome::Cancelled;
                }
                snapshot = self.snapshot(today) => snapshot,
            };

            let summary_text = if snapshot.tasks.is_empty() {
                snapshot.warnings.push(ReportWarning::NoTasksFound);
                if sink
                    .send(SummaryFragment::Token(NO_TASKS_SUMMARY.to_owned()))
                    .await
                    .is_err()
                {
                    info!("stream consumer disconnected");
                    return StreamOutcome::Cancelled;
                }
                NO_TASKS_SUMMARY.to_owned()
            } else {
                let mut collected = String::new();
                let opened = tokio::select! {
                    biased;
                    () = sink.closed() => {
                        info!("stream consumer disconnected while opening the summary");
                        return StreamOutcome::Cancelled;
                    }
                    opened = self.open(&snapshot.tasks) => opened,
                };
                let end = match opened {
                    Ok(stream) => self.pump(stream, &sink, &mut collected).await,
                    Err(err) => PumpEnd::Failed(err.to_string()),
                };

                match end {
                    PumpEnd::Finished if collected.trim().is_empty() => FALLBACK_SUMMARY.to_owned(),
                    PumpEnd::Finished => collected,
                    PumpEnd::Disconnected => {
                        info!(chars = collected.len(), "stream consumer disconnected");
                        return StreamOutcome::Cancelled;
                    }
                    PumpEnd::Failed(message) => {
                        warn!(%message, "summary stream failed");
                        if sink
                            .send(SummaryFragment::Error(message.clone()))
                            .await
                            .is_err()
                        {
                            return StreamOutcome::Cancelled;
                        }
                        snapshot
                            .warnings
                            .push(ReportWarning::SummarizerFailed(message));
                        if collected.trim().is_empty() {
                            FALLBACK_SUMMARY.to_owned()
                        } else {
                            collected
                        }
                    }
                }
            };

            let outcome = self.finish(owner_user, today, snapshot, summary_text).await;
            StreamOutcome::Completed(Box::new(outcome))
        }
        .instrument(span)
        .await
    }

    async fn open(&self, tasks: &[Task]) -> crate::Result<FragmentStream> {
        tokio::time::timeout(
            self.timeouts().summarizer(),
            self.summarizer().summarize_stream(tasks),
        )
        .await
        .map_err(|_| AppError::Summarizer("opening summary stream timed out".into()))?
    }

    /// Forward fragments until the stream ends, fails or the sink closes.
    ///
    /// `stream` is dropped on every exit path.
    async fn pump(
        &self,
        mut stream: FragmentStream,
        sink: &mpsc::Sender<SummaryFragment>,
        collected: &mut String,
    ) -> PumpEnd {
        let idle = self.timeouts().stream_idle();
        let mut fragments = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                () = sink.closed() => return PumpEnd::Disconnected,
                next = tokio::time::timeout(idle, stream.next()) => next,
            };

            match next {
                Ok(Some(Ok(text))) => {
                    collected.push_str(&text);
                    fragments += 1;
                    if sink.send(SummaryFragment::Token(text)).await.is_err() {
                        return PumpEnd::Disconnected;
                    }
                }
                Ok(Some(Err(err))) => return PumpEnd::Failed(err.to_string()),
                Ok(None) => {
                    debug!(fragments, "summary stream finished");
                    return PumpEnd::Finished;
                }
                Err(_) => return PumpEnd::Failed("summary stream idle timeout".into()),
            }
        }
    }
}
