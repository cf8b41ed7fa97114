//! Configuration types.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::notifier::Recipients;
use crate::schedule::CronSchedule;

use super::ConfigError;

/// What to watch and how much trace to capture.
///
/// Immutable for the lifetime of one activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory holding the log file.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Name of the log file inside `directory`.
    #[serde(default = "default_target_file")]
    pub target_file: String,
    /// Substrings that start a trace capture.
    #[serde(default = "default_trigger_signatures")]
    pub trigger_signatures: Vec<String>,
    /// Number of lines in every captured trace.
    #[serde(default = "default_trace_line_count")]
    pub trace_line_count: usize,
    /// Six-field cron expression that re-arms the watch.
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// How long to keep collecting notifications after the first one of a
    /// batch, in milliseconds. Zero hands out each batch immediately.
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
}

fn default_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_target_file() -> String {
    "error.log".to_string()
}

fn default_trigger_signatures() -> Vec<String> {
    vec![
        "NullPointerException".to_string(),
        "InvalidItemStateException".to_string(),
    ]
}

fn default_trace_line_count() -> usize {
    10
}

fn default_schedule() -> String {
    "0 0 12 ? * MON-FRI".to_string()
}

fn default_batch_window_ms() -> u64 {
    50
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            target_file: default_target_file(),
            trigger_signatures: default_trigger_signatures(),
            trace_line_count: default_trace_line_count(),
            schedule: default_schedule(),
            batch_window_ms: default_batch_window_ms(),
        }
    }
}

impl WatchConfig {
    /// Path of the watched file, `directory/target_file`.
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        self.directory.join(&self.target_file)
    }

    /// Trace length as a non-zero count.
    ///
    /// # Errors
    ///
    /// Returns an error if `trace_line_count` is zero.
    pub fn trace_lines(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.trace_line_count)
            .ok_or_else(|| ConfigError::invalid("trace_line_count", "must be at least 1"))
    }

    #[must_use]
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    /// Check the invariants every activation relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::invalid("directory", "must not be empty"));
        }
        if self.target_file.is_empty() {
            return Err(ConfigError::invalid("target_file", "must not be empty"));
        }
        if Path::new(&self.target_file).components().count() != 1
            || self.target_file.contains(['/', '\\'])
        {
            return Err(ConfigError::invalid(
                "target_file",
                format!("'{}' must be a bare file name", self.target_file),
            ));
        }
        if self.trigger_signatures.is_empty() {
            return Err(ConfigError::invalid(
                "trigger_signatures",
                "at least one signature is required",
            ));
        }
        if self.trigger_signatures.iter().any(String::is_empty) {
            return Err(ConfigError::invalid(
                "trigger_signatures",
                "signatures must not be empty strings",
            ));
        }
        self.trace_lines()?;
        CronSchedule::parse(&self.schedule)
            .map_err(|e| ConfigError::invalid("schedule", e.to_string()))?;
        Ok(())
    }
}

/// Re-arming behaviour of the schedule trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Start a new watch on every firing even if earlier ones are still running.
    pub allow_concurrent: bool,
    /// Fire once immediately when the activation starts.
    pub fire_on_start: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            allow_concurrent: true,
            fire_on_start: false,
        }
    }
}

/// Notifier backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Emit captured traces as log events.
    #[default]
    Log,
    /// POST captured traces to an HTTP endpoint.
    Webhook,
}

/// How captured blocks are grouped into notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One notification per qualifying event, all blocks joined.
    #[default]
    Batched,
    /// One notification per trace block.
    PerBlock,
}

/// Notification delivery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    /// Webhook endpoint, required when `kind = "webhook"`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryMode,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_subject() -> String {
    "Following logs were captured".to_string()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            url: None,
            delivery: DeliveryMode::default(),
            to: Vec::new(),
            cc: Vec::new(),
            from: String::new(),
            subject: default_subject(),
        }
    }
}

impl NotifierConfig {
    /// Recipient metadata attached to every notification.
    #[must_use]
    pub fn recipients(&self) -> Recipients {
        Recipients {
            to: self.to.clone(),
            cc: self.cc.clone(),
            from: self.from.clone(),
        }
    }

    /// Check the backend has what it needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a webhook has no usable URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == NotifierKind::Webhook {
            let raw = self
                .url
                .as_deref()
                .ok_or_else(|| ConfigError::invalid("notifier.url", "required for webhook"))?;
            let parsed = url::Url::parse(raw)
                .map_err(|e| ConfigError::invalid("notifier.url", e.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::invalid(
                    "notifier.url",
                    format!("unsupported scheme '{}'", parsed.scheme()),
                ));
            }
        }
        if self.cc.is_empty() {
            tracing::warn!("No cc recipients configured");
        }
        Ok(())
    }
}

/// Resolved configuration for one activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Settings {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watch.validate()?;
        self.notifier.validate()
    }
}
