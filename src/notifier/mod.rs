//! Delivery of captured traces to external recipients.
//!
//! The watch loop hands finished trace blocks to a [`Dispatcher`], which
//! groups them into [`Notification`]s and passes them to a [`Notifier`].

mod dispatch;
mod error;
mod logger;
mod types;
mod webhook;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{NotifierConfig, NotifierKind};

pub use dispatch::Dispatcher;
pub use error::NotifyError;
pub use logger::LogNotifier;
pub use types::{Notification, Recipients};
pub use webhook::WebhookNotifier;

/// A destination for captured trace text.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Build the notifier selected by the configuration.
///
/// # Errors
///
/// Returns an error if the webhook URL is missing or the HTTP client cannot
/// be built.
pub fn from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierKind::Webhook => {
            let url = config
                .url
                .as_deref()
                .ok_or(NotifyError::MissingEndpoint)?;
            Ok(Arc::new(WebhookNotifier::new(url)?))
        }
    }
}
