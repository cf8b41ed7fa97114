//! Colored CLI display utilities.
//!
//! Used by the one-shot commands to print scan results and schedule
//! previews to the terminal.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use crate::extractor::SignatureMatch;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Print one captured trace block.
pub fn print_match(index: usize, found: &SignatureMatch) {
    println!(
        "{} {} #{} signature={}",
        timestamp().dimmed(),
        "[TRACE]".red().bold(),
        index + 1,
        found.signature.yellow()
    );
    for line in found.block.lines() {
        println!("    {line}");
    }
    let _ = io::stdout().flush();
}

/// Print the outcome of scanning a file.
pub fn print_scan_summary(path: &Path, matches: usize, signatures: usize) {
    let label = if matches == 0 {
        "[CLEAN]".green().bold().to_string()
    } else {
        "[FOUND]".red().bold().to_string()
    };
    println!(
        "{} {} {} trace(s) for {} signature(s) in {}",
        timestamp().dimmed(),
        label,
        matches,
        signatures,
        truncate(&path.display().to_string(), 80).cyan()
    );
}

/// Print upcoming schedule firings.
pub fn print_firings(expression: &str, firings: &[DateTime<Local>]) {
    println!("{} {}", "[SCHEDULE]".blue().bold(), expression.cyan());
    for firing in firings {
        println!("    {}", firing.format("%a %Y-%m-%d %H:%M:%S %Z"));
    }
}

/// Print an informational message.
pub fn print_info(message: &str) {
    println!("{} {} {}", timestamp().dimmed(), "[WATCH]".blue().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
}
