//! Log Watcher - captures stack traces from application logs and forwards them.

pub mod activation;
pub mod config;
pub mod display;
pub mod extractor;
pub mod notifier;
pub mod schedule;
pub mod watcher;

#[cfg(test)]
mod test_support;
