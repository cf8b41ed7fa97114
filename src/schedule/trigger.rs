//! Schedule trigger that re-arms watch loops.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, TriggerConfig, WatchConfig};
use crate::notifier::Dispatcher;
use crate::watcher::{FileWatchLoop, LoopReport, WatcherError};

use super::CronSchedule;

/// Lifecycle of a schedule trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    #[default]
    Idle,
    Armed,
    Firing,
    Stopped,
}

/// Counters for one trigger lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerReport {
    /// Watch loops started.
    pub fired: usize,
    /// Firings skipped because a loop was still active.
    pub skipped: usize,
    /// Loops that ended cleanly.
    pub completed: usize,
    /// Loops that ended with an error.
    pub failed: usize,
}

type RunResult = Result<LoopReport, WatcherError>;

/// Starts a [`FileWatchLoop`] at every firing of a cron schedule.
///
/// With `allow_concurrent` set, a firing neither waits for nor cancels
/// loops started earlier. Otherwise at most one loop is active and firings
/// that find one running are skipped.
pub struct ScheduleTrigger {
    schedule: CronSchedule,
    config: Arc<WatchConfig>,
    dispatcher: Arc<Dispatcher>,
    options: TriggerConfig,
    cancel: CancellationToken,
    runs: JoinSet<RunResult>,
    state: watch::Sender<TriggerState>,
    report: TriggerReport,
    last_fired: Option<DateTime<Local>>,
}

impl std::fmt::Debug for ScheduleTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleTrigger")
            .field("schedule", &self.schedule)
            .field("options", &self.options)
            .field("state", &*self.state.borrow())
            .field("active_runs", &self.runs.len())
            .finish_non_exhaustive()
    }
}

impl ScheduleTrigger {
    /// Create an idle trigger for `config.schedule`.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::ConfigurationInvalid`] if the configuration
    /// or its schedule is invalid.
    pub fn new(
        config: Arc<WatchConfig>,
        dispatcher: Arc<Dispatcher>,
        options: TriggerConfig,
    ) -> Result<Self, WatcherError> {
        config.validate()?;
        let schedule = CronSchedule::parse(&config.schedule)
            .map_err(|e| ConfigError::invalid("schedule", e.to_string()))?;
        let (state, _) = watch::channel(TriggerState::Idle);

        Ok(Self {
            schedule,
            config,
            dispatcher,
            options,
            cancel: CancellationToken::new(),
            runs: JoinSet::new(),
            state,
            report: TriggerReport::default(),
            last_fired: None,
        })
    }

    /// Set a cancellation token for shutdown.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn state(&self) -> TriggerState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TriggerState> {
        self.state.subscribe()
    }

    /// Number of watch loops that have not been reaped yet.
    #[must_use]
    pub fn active_runs(&self) -> usize {
        self.runs.len()
    }

    fn transition(&self, new_state: TriggerState) {
        let old = self.state.send_replace(new_state);
        tracing::debug!(from = ?old, to = ?new_state, "Trigger state transition");
    }

    /// Run until cancelled, then cancel every loop and wait for them.
    pub async fn run(mut self) -> TriggerReport {
        self.transition(TriggerState::Armed);
        tracing::info!(schedule = %self.schedule, "Schedule armed");

        if self.options.fire_on_start {
            self.fire();
        }

        loop {
            let now = Local::now();
            let from = self.last_fired.map_or(now, |last| last.max(now));
            let Some(next) = self.schedule.next_after(&from) else {
                tracing::warn!(schedule = %self.schedule, "Schedule has no further firings");
                self.cancel.cancelled().await;
                break;
            };
            let delay = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next = %next, "Next firing");

            tokio::select! {
                () = self.cancel.cancelled() => break,
                Some(result) = self.runs.join_next(), if !self.runs.is_empty() => {
                    self.record(result);
                }
                () = tokio::time::sleep(delay) => {
                    self.last_fired = Some(next);
                    self.fire();
                }
            }
        }

        self.shutdown().await
    }

    /// Start a watch loop now, honouring the overlap policy.
    pub fn fire(&mut self) {
        self.transition(TriggerState::Firing);

        while let Some(result) = self.runs.try_join_next() {
            self.record(result);
        }

        if !self.options.allow_concurrent && !self.runs.is_empty() {
            self.report.skipped += 1;
            tracing::info!(active = self.runs.len(), "Watch already active, skipping firing");
        } else {
            match FileWatchLoop::new(Arc::clone(&self.config), Arc::clone(&self.dispatcher)) {
                Ok(watch_loop) => {
                    let watch_loop = watch_loop.with_cancellation(self.cancel.child_token());
                    tracing::info!(run_id = %watch_loop.run_id(), "Starting watch loop");
                    self.runs.spawn(watch_loop.run());
                    self.report.fired += 1;
                }
                Err(e) => {
                    self.report.failed += 1;
                    tracing::error!(error = %e, "Cannot start watch loop");
                }
            }
        }

        self.transition(TriggerState::Armed);
    }

    fn record(&mut self, result: Result<RunResult, JoinError>) {
        match result {
            Ok(Ok(report)) => {
                self.report.completed += 1;
                tracing::info!(?report, "Watch loop finished");
            }
            Ok(Err(e)) => {
                self.report.failed += 1;
                tracing::error!(
                    error = %e,
                    fatal = e.is_fatal(),
                    "Watch loop failed, re-arming at next firing"
                );
            }
            Err(e) => {
                self.report.failed += 1;
                tracing::error!(error = %e, "Watch loop task aborted");
            }
        }
    }

    async fn shutdown(mut self) -> TriggerReport {
        self.cancel.cancel();
        while let Some(result) = self.runs.join_next().await {
            self.record(result);
        }
        self.transition(TriggerState::Stopped);
        tracing::info!(report = ?self.report, "Schedule stopped");
        self.report
    }
}
