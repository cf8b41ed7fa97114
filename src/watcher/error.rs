//! Watcher error types.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::notifier::NotifyError;

/// Errors that can occur while watching the log file.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Configuration is missing or out of range.
    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(#[from] ConfigError),

    /// The directory could not be registered with the watch facility.
    #[error("Failed to register watch on {path}: {source}")]
    WatchRegistrationFailed {
        path: PathBuf,
        source: notify::Error,
    },

    /// The wait for events was cancelled.
    #[error("Wait for notifications interrupted")]
    NotificationWaitInterrupted,

    /// The log file could not be read.
    #[error("Failed to read {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The notifier reported a failure.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(#[from] NotifyError),

    /// The notification source reported an unrecoverable error.
    #[error("Notification source failed: {0}")]
    NotificationSource(notify::Error),

    /// The watched directory disappeared.
    #[error("Watched directory removed: {0}")]
    WatchLost(PathBuf),

    /// The notification source stopped delivering.
    #[error("Notification source closed")]
    ChannelClosed,
}

impl WatcherError {
    /// Whether this error ends an activation rather than a single event.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationInvalid(_) | Self::WatchRegistrationFailed { .. }
        )
    }

    /// Whether this error terminates a running watch loop.
    #[must_use]
    pub fn ends_loop(&self) -> bool {
        !matches!(self, Self::FileReadFailed { .. } | Self::DeliveryFailed(_))
    }
}
