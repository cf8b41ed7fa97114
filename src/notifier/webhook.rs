//! HTTP webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{Notification, Notifier, NotifyError};

/// Connection timeout for webhook requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for webhook requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts notifications as JSON to an HTTP endpoint.
///
/// The body is the serialized [`Notification`]: `to`, `cc`, `from`,
/// `subject` and `body` at the top level. Recipients are checked before
/// sending, mirroring what a mail gateway would require.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: Url,
}

impl WebhookNotifier {
    /// Create a notifier posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(endpoint: &str) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        notification.recipients.validate()?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint = %self.endpoint, %status, "Notification delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
