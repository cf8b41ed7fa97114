//! Notifier error types.

/// Errors reported by notification delivery.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    /// A mandatory recipient field is empty.
    #[error("Missing recipient field: {0}")]
    MissingRecipient(&'static str),

    /// No endpoint configured for a network notifier.
    #[error("Notifier endpoint not configured")]
    MissingEndpoint,

    /// Invalid endpoint URL.
    #[error("Invalid notifier endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// The request could not be sent.
    #[error("Delivery request failed: {0}")]
    RequestFailed(String),

    /// The endpoint answered with a non-success status.
    #[error("Delivery rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request timed out.
    #[error("Delivery request timed out")]
    Timeout,
}
