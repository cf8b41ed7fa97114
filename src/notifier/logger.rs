//! Notifier that writes captured traces to the log.

use async_trait::async_trait;

use super::{Notification, Notifier, NotifyError};

/// Emits every notification as a `tracing` event.
///
/// Used when no external delivery channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::warn!(
            subject = %notification.subject,
            to = ?notification.recipients.to,
            lines = notification.body.lines().count(),
            "Captured trace:\n{}",
            notification.body
        );
        Ok(())
    }
}
