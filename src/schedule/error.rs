//! Schedule error types.

/// Errors produced while parsing a schedule expression.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Wrong number of whitespace-separated fields.
    #[error("Cron expression '{expression}' has {found} fields, expected 6 (or 7 with year)")]
    FieldCount { expression: String, found: usize },

    /// A field could not be parsed.
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
}
