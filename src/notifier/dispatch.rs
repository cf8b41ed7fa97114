//! Grouping of trace blocks into notifications.

use std::sync::Arc;

use crate::config::{DeliveryMode, NotifierConfig};
use crate::extractor::SignatureMatch;

use super::{Notification, Notifier, NotifyError, Recipients};

/// Turns extraction results into notifications and delivers them.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    recipients: Recipients,
    subject: String,
    mode: DeliveryMode,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("recipients", &self.recipients)
            .field("subject", &self.subject)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        recipients: Recipients,
        subject: impl Into<String>,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            notifier,
            recipients,
            subject: subject.into(),
            mode,
        }
    }

    /// Build a dispatcher using the recipients and mode from `config`.
    #[must_use]
    pub fn from_config(notifier: Arc<dyn Notifier>, config: &NotifierConfig) -> Self {
        Self::new(
            notifier,
            config.recipients(),
            config.subject.clone(),
            config.delivery,
        )
    }

    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Group matches into notifications according to the delivery mode.
    ///
    /// Batched mode joins every block into one body, blocks separated by a
    /// blank line. Per-block mode yields one notification per block with the
    /// signature appended to the subject.
    #[must_use]
    pub fn notifications(&self, matches: &[SignatureMatch]) -> Vec<Notification> {
        if matches.is_empty() {
            return Vec::new();
        }

        match self.mode {
            DeliveryMode::Batched => {
                let body = matches
                    .iter()
                    .map(|m| m.block.to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                vec![self.notification(self.subject.clone(), body)]
            }
            DeliveryMode::PerBlock => matches
                .iter()
                .map(|m| {
                    self.notification(
                        format!("{} ({})", self.subject, m.signature),
                        m.block.to_string(),
                    )
                })
                .collect(),
        }
    }

    fn notification(&self, subject: String, body: String) -> Notification {
        Notification {
            recipients: self.recipients.clone(),
            subject,
            body,
        }
    }

    /// Deliver the matches, returning how many blocks were delivered.
    ///
    /// Every notification is attempted even if an earlier one fails; the
    /// first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`NotifyError`] reported by the notifier.
    pub async fn dispatch(&self, matches: &[SignatureMatch]) -> Result<usize, NotifyError> {
        let notifications = self.notifications(matches);
        let blocks_per_notification = match self.mode {
            DeliveryMode::Batched => matches.len(),
            DeliveryMode::PerBlock => 1,
        };

        let mut delivered = 0;
        let mut first_error = None;
        for notification in &notifications {
            match self.notifier.deliver(notification).await {
                Ok(()) => delivered += blocks_per_notification,
                Err(e) => {
                    tracing::warn!(
                        subject = %notification.subject,
                        error = %e,
                        "Notification delivery failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(delivered),
        }
    }
}
