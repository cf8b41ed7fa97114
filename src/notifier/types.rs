//! Notification payload types.

use serde::{Deserialize, Serialize};

use super::NotifyError;

/// Who a notification is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients {
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub from: String,
}

impl Recipients {
    /// Check that the mandatory fields are present.
    ///
    /// `to` and `from` are required; an empty `cc` is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::MissingRecipient`] naming the empty field.
    pub fn validate(&self) -> Result<(), NotifyError> {
        if self.to.iter().all(|addr| addr.trim().is_empty()) {
            return Err(NotifyError::MissingRecipient("to"));
        }
        if self.from.trim().is_empty() {
            return Err(NotifyError::MissingRecipient("from"));
        }
        if self.cc.is_empty() {
            tracing::warn!("Notification has no cc recipients");
        }
        Ok(())
    }
}

/// One message carrying captured trace text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(flatten)]
    pub recipients: Recipients,
    pub subject: String,
    pub body: String,
}
