//! The file watch loop.
//!
//! One loop instance owns one [`WatchSession`]. It waits for batches of
//! directory events, and for every content change of the target file
//! re-reads the whole file, extracts trace blocks for each signature and
//! hands them to the [`Dispatcher`].

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::WatchConfig;
use crate::extractor::{SignatureMatch, TraceExtractor};
use crate::notifier::Dispatcher;

use super::error::WatcherError;
use super::event::FileEvent;
use super::session::WatchSession;

/// What handling a single event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not a content change of the target file.
    Ignored,
    /// The target file was scanned; `blocks` were delivered.
    Scanned { blocks: usize },
}

/// Counters for one loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub events_seen: usize,
    pub scans: usize,
    pub blocks_forwarded: usize,
    pub failures: usize,
}

/// Watches one directory and forwards traces found in its target file.
#[derive(Debug)]
pub struct FileWatchLoop {
    run_id: Uuid,
    config: Arc<WatchConfig>,
    extractor: TraceExtractor,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl FileWatchLoop {
    /// Create a loop bound to `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::ConfigurationInvalid`] if `config` violates
    /// its invariants.
    pub fn new(config: Arc<WatchConfig>, dispatcher: Arc<Dispatcher>) -> Result<Self, WatcherError> {
        config.validate()?;
        let extractor = TraceExtractor::new(config.trace_lines()?);
        Ok(Self {
            run_id: Uuid::new_v4(),
            config,
            extractor,
            dispatcher,
            cancel: CancellationToken::new(),
        })
    }

    /// Set a cancellation token for graceful shutdown.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Register the watch and process events until cancelled.
    ///
    /// Returns the run's counters on cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be registered or the
    /// notification source fails. Per-event failures are logged and do not
    /// end the loop.
    pub async fn run(self) -> Result<LoopReport, WatcherError> {
        let span = tracing::info_span!("watch_loop", run_id = %self.run_id);
        async move {
            let mut session = WatchSession::open(&self.config)?;
            let result = self.drive(&mut session).await;
            session.close();
            result
        }
        .instrument(span)
        .await
    }

    /// Process event batches from `session` until cancellation or failure.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the loop.
    pub async fn drive(&self, session: &mut WatchSession) -> Result<LoopReport, WatcherError> {
        let mut report = LoopReport::default();
        loop {
            let batch = match session.next_batch(&self.cancel).await {
                Ok(batch) => batch,
                Err(WatcherError::NotificationWaitInterrupted) => {
                    tracing::info!(?report, "Watch loop cancelled");
                    return Ok(report);
                }
                Err(e) => {
                    tracing::error!(error = %e, ?report, "Watch loop terminated");
                    return Err(e);
                }
            };

            for event in &batch {
                report.events_seen += 1;
                match self.handle_event(event, session.target_path()).await {
                    Ok(EventOutcome::Ignored) => {
                        tracing::trace!(kind = ?event.kind, path = %event.path.display(), "Ignoring event");
                    }
                    Ok(EventOutcome::Scanned { blocks }) => {
                        report.scans += 1;
                        report.blocks_forwarded += blocks;
                    }
                    Err(e) => {
                        report.failures += 1;
                        tracing::warn!(
                            path = %event.path.display(),
                            error = %e,
                            "Failed to process log change"
                        );
                    }
                }
            }
        }
    }

    /// Handle one event, scanning `target` if the event is a content change
    /// of the configured file.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::FileReadFailed`] or
    /// [`WatcherError::DeliveryFailed`]; both are recoverable.
    pub async fn handle_event(
        &self,
        event: &FileEvent,
        target: &Path,
    ) -> Result<EventOutcome, WatcherError> {
        if !event.is_modify_of(&self.config.target_file) {
            return Ok(EventOutcome::Ignored);
        }

        let matches = self.scan(target).await?;
        if matches.is_empty() {
            tracing::debug!(path = %target.display(), "No trace signatures found");
            return Ok(EventOutcome::Scanned { blocks: 0 });
        }

        tracing::info!(
            path = %target.display(),
            blocks = matches.len(),
            "Captured traces"
        );
        let blocks = self.dispatcher.dispatch(&matches).await?;
        Ok(EventOutcome::Scanned { blocks })
    }

    /// Read the full current content of `target` and extract every block.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::FileReadFailed`] if the file cannot be read.
    pub async fn scan(&self, target: &Path) -> Result<Vec<SignatureMatch>, WatcherError> {
        let bytes = tokio::fs::read(target)
            .await
            .map_err(|source| WatcherError::FileReadFailed {
                path: target.to_path_buf(),
                source,
            })?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(self
            .extractor
            .extract_all(&content, &self.config.trigger_signatures))
    }
}
