//! Periodic background jobs with a single-flight guard.
//!
//! Every tick starts each enabled job on its own task. A job whose
//! previous run is still active is skipped for that tick.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use super::delivery::{dispatch_deadline_alerts, report_message, MessageBody};
use super::generator::ReportGenerator;
use crate::config::SchedulerConfig;
use crate::document::DocumentRenderer;
use crate::notify::Notifier;

/// Per-job-name mutual exclusion.
#[derive(Clone, Default)]
pub struct SingleFlight {
    running: Arc<Mutex<HashSet<String>>>,
}

/// Held while a job runs; releases the job name on drop.
pub struct FlightGuard {
    running: Arc<Mutex<HashSet<String>>>,
    job: String,
}

impl SingleFlight {
    /// Create an empty guard set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `job`, or return `None` if it is already running.
    #[must_use]
    pub fn try_acquire(&self, job: &str) -> Option<FlightGuard> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.insert(job.to_owned()) {
            Some(FlightGuard {
                running: Arc::clone(&self.running),
                job: job.to_owned(),
            })
        } else {
            None
        }
    }

    /// Whether `job` currently holds a guard.
    #[must_use]
    pub fn is_running(&self, job: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(job)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job);
    }
}

/// Jobs the scheduler knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Generate and persist a report, then email it to configured recipients.
    DailyReport,
    /// Send overdue alerts and at-risk reminders.
    DeadlineAlerts,
}

impl Job {
    /// Name used for the single-flight guard and in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DailyReport => "daily-report",
            Self::DeadlineAlerts => "deadline-alerts",
        }
    }
}

/// Result of asking the scheduler to start a job.
#[derive(Debug)]
pub enum TickOutcome {
    /// The job was started on its own task.
    Started(JoinHandle<()>),
    /// A previous run of the job is still active.
    Skipped,
}

/// Background job runner.
#[derive(Clone)]
pub struct Scheduler {
    generator: ReportGenerator,
    notifier: Option<Arc<dyn Notifier>>,
    renderer: Arc<dyn DocumentRenderer>,
    config: SchedulerConfig,
    default_recipient: Option<String>,
    flights: SingleFlight,
}

impl Scheduler {
    /// Create a scheduler over shared collaborators.
    #[must_use]
    pub fn new(
        generator: ReportGenerator,
        notifier: Option<Arc<dyn Notifier>>,
        renderer: Arc<dyn DocumentRenderer>,
        config: SchedulerConfig,
        default_recipient: Option<String>,
    ) -> Self {
        Self {
            generator,
            notifier,
            renderer,
            config,
            default_recipient,
            flights: SingleFlight::new(),
        }
    }

    /// Jobs run on every tick.
    #[must_use]
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs = vec![Job::DailyReport];
        if self.config.send_deadline_alerts {
            jobs.push(Job::DeadlineAlerts);
        }
        jobs
    }

    /// The guard set, shared by every clone of this scheduler.
    #[must_use]
    pub fn flights(&self) -> &SingleFlight {
        &self.flights
    }

    /// Start `job` unless its previous run is still active.
    #[must_use]
    pub fn trigger(&self, job: Job) -> TickOutcome {
        let Some(guard) = self.flights.try_acquire(job.name()) else {
            warn!(job = job.name(), "previous run still active; skipping tick");
            return TickOutcome::Skipped;
        };

        let this = self.clone();
        let span = info_span!("scheduled_job", job = job.name());
        TickOutcome::Started(tokio::spawn(
            async move {
                let _guard = guard;
                match job {
                    Job::DailyReport => this.run_daily_report().await,
                    Job::DeadlineAlerts => this.run_deadline_alerts().await,
                }
            }
            .instrument(span),
        ))
    }

    /// Spawn the tick loop. The first tick fires after one full `interval`.
    #[must_use]
    pub fn spawn(self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = interval.as_secs(), "scheduler started");

            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        for job in self.jobs() {
                            // Runs detach; the guard outlives this tick.
                            drop(self.trigger(job));
                        }
                    }
                }
            }
        })
    }

    async fn run_daily_report(&self) {
        let outcome = self.generator.generate_report(&self.config.owner_user).await;
        info!(
            report_id = %outcome.report.id,
            persisted = outcome.persisted,
            warnings = outcome.warnings.len(),
            "scheduled report generated"
        );

        if self.config.report_recipients.is_empty() {
            return;
        }
        let Some(notifier) = &self.notifier else {
            warn!("report recipients configured but notifications are disabled");
            return;
        };

        let message =
            match report_message(&outcome.report, self.renderer.as_ref(), MessageBody::Full) {
                Ok(message) => message,
                Err(err) => {
                    error!(%err, "failed to package scheduled report");
                    return;
                }
            };
        for recipient in &self.config.report_recipients {
            if let Err(err) = notifier.send_report(&message, recipient).await {
                error!(%err, recipient, "failed to deliver scheduled report");
            }
        }
    }

    async fn run_deadline_alerts(&self) {
        let Some(notifier) = &self.notifier else {
            warn!("deadline alerts enabled but notifications are disabled");
            return;
        };
        let snapshot = self.generator.snapshot(Local::now().date_naive()).await;
        dispatch_deadline_alerts(
            &snapshot.classification,
            notifier.as_ref(),
            self.default_recipient.as_deref(),
        )
        .await;
    }
}
