//! A live registration with the filesystem notification facility.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;

use super::error::WatcherError;
use super::event::FileEvent;

type EventResult = notify::Result<Event>;

/// Watch handle for one directory plus the resolved target path.
///
/// Every event the facility reports is passed through; nothing is folded
/// into an earlier event. The handle is released by [`WatchSession::close`]
/// or on drop.
pub struct WatchSession {
    watcher: Option<RecommendedWatcher>,
    events: mpsc::UnboundedReceiver<EventResult>,
    batch_window: Duration,
    directory: PathBuf,
    target_path: PathBuf,
    alive: bool,
    /// Terminal error held back until the events before it were handed out.
    pending_error: Option<WatcherError>,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("directory", &self.directory)
            .field("target_path", &self.target_path)
            .field("batch_window", &self.batch_window)
            .field("alive", &self.alive)
            .field("pending_error", &self.pending_error)
            .finish_non_exhaustive()
    }
}

impl WatchSession {
    /// Register create/modify/delete interest on the configured directory.
    ///
    /// Registration is directory level and non-recursive; filtering to the
    /// target file happens when events are handled.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::WatchRegistrationFailed`] if the directory
    /// cannot be resolved or watched.
    pub fn open(config: &WatchConfig) -> Result<Self, WatcherError> {
        let registration_failed = |source: notify::Error| WatcherError::WatchRegistrationFailed {
            path: config.directory.clone(),
            source,
        };

        let directory = std::fs::canonicalize(&config.directory)
            .map_err(|e| registration_failed(notify::Error::io(e)))?;
        if !directory.is_dir() {
            return Err(registration_failed(
                notify::Error::generic("not a directory").add_path(directory),
            ));
        }

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |result: EventResult| {
                // Receiver gone means the session was closed.
                let _ = tx.send(result);
            },
            Config::default(),
        )
        .map_err(registration_failed)?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(registration_failed)?;

        let target_path = directory.join(&config.target_file);
        tracing::info!(
            directory = %directory.display(),
            target = %target_path.display(),
            "Watch registered"
        );

        Ok(Self {
            watcher: Some(watcher),
            events,
            batch_window: config.batch_window(),
            directory,
            target_path,
            alive: true,
            pending_error: None,
        })
    }

    /// A session fed by a channel instead of the OS facility.
    #[cfg(test)]
    pub(crate) fn from_channel(
        directory: impl Into<PathBuf>,
        target_file: &str,
    ) -> (Self, mpsc::UnboundedSender<EventResult>) {
        let directory = directory.into();
        let (tx, events) = mpsc::unbounded_channel();
        let session = Self {
            watcher: None,
            events,
            batch_window: Duration::ZERO,
            target_path: directory.join(target_file),
            directory,
            alive: true,
            pending_error: None,
        };
        (session, tx)
    }

    /// Resolved absolute path of the watched directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Resolved path of `directory/target_file`.
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Wait for the next batch of events.
    ///
    /// Blocks until at least one notification arrives, keeps collecting for
    /// the configured batch window, then drains whatever else is pending.
    /// Events keep their delivery order. When the source fails part way
    /// through, the events received before the failure are returned first
    /// and the failure is reported by the following call.
    ///
    /// # Errors
    ///
    /// - [`WatcherError::NotificationWaitInterrupted`] when `cancel` fires
    /// - [`WatcherError::NotificationSource`] on an unrecoverable notify error
    /// - [`WatcherError::WatchLost`] when the directory itself is removed
    /// - [`WatcherError::ChannelClosed`] when the facility stops delivering
    pub async fn next_batch(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEvent>, WatcherError> {
        if let Some(error) = self.pending_error.take() {
            return Err(error);
        }

        let first = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WatcherError::NotificationWaitInterrupted),
            result = self.events.recv() => result,
        };
        let Some(first) = first else {
            self.alive = false;
            return Err(WatcherError::ChannelClosed);
        };

        if !self.batch_window.is_zero() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(self.batch_window) => {}
            }
        }

        let mut pending = vec![first];
        while let Ok(result) = self.events.try_recv() {
            pending.push(result);
        }

        let mut batch = Vec::new();
        for result in pending {
            let terminal = match result {
                Ok(event) => self.collect(&event, &mut batch),
                Err(error) if is_unrecoverable(&error) => {
                    Some(WatcherError::NotificationSource(error))
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Transient watch error");
                    None
                }
            };

            if let Some(error) = terminal {
                self.alive = false;
                if batch.is_empty() {
                    return Err(error);
                }
                tracing::debug!(events = batch.len(), error = %error, "Deferring source failure");
                self.pending_error = Some(error);
                break;
            }
        }

        Ok(batch)
    }

    /// Append the events of `event` to `batch`, stopping at the removal of
    /// the watched directory.
    fn collect(&self, event: &Event, batch: &mut Vec<FileEvent>) -> Option<WatcherError> {
        for file_event in FileEvent::from_notify(event) {
            if file_event.is_removal_of(&self.directory) {
                return Some(WatcherError::WatchLost(file_event.path));
            }
            batch.push(file_event);
        }
        None
    }

    /// Release the watch handle.
    pub fn close(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.directory) {
                tracing::debug!(directory = %self.directory.display(), error = %e, "Unwatch failed");
            }
            tracing::debug!(directory = %self.directory.display(), "Watch released");
        }
        self.alive = false;
        self.events.close();
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn is_unrecoverable(error: &notify::Error) -> bool {
    use notify::ErrorKind;

    matches!(
        error.kind,
        ErrorKind::WatchNotFound | ErrorKind::PathNotFound | ErrorKind::MaxFilesWatch
    )
}
