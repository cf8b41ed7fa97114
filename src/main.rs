//! Log Watcher - captures stack traces from application logs and forwards them.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use log_watcher::activation::Activation;
use log_watcher::config::{ConfigLoader, Settings};
use log_watcher::display;
use log_watcher::extractor::TraceExtractor;
use log_watcher::notifier::{self, Dispatcher};
use log_watcher::schedule::CronSchedule;
use log_watcher::watcher::FileWatchLoop;

#[derive(Parser)]
#[command(
    name = "log-watcher",
    about = "Watch application logs for error signatures and forward stack traces",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arm the schedule and watch until interrupted.
    Run,
    /// Watch the log file immediately, without waiting for the schedule.
    Watch,
    /// Scan a file once and print the captured traces.
    Scan {
        /// File to scan.
        file: PathBuf,
        /// Trigger signature (repeatable). Defaults to the configured ones.
        #[arg(short, long = "signature")]
        signatures: Vec<String>,
        /// Lines per trace. Defaults to the configured count.
        #[arg(short = 'n', long)]
        lines: Option<NonZeroUsize>,
    },
    /// Print the next firings of the configured schedule.
    Next {
        /// Number of firings to show.
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings, String> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    loader.load().map_err(|e| e.to_string())
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Interrupt received, shutting down");
        token.cancel();
    });
}

async fn run(settings: Settings) -> Result<(), String> {
    let notifier = notifier::from_config(&settings.notifier).map_err(|e| e.to_string())?;
    let activation = Activation::start(settings, notifier).map_err(|e| e.to_string())?;
    display::print_info(&format!(
        "Armed with schedule '{}'",
        activation.settings().watch.schedule
    ));

    let interrupted = CancellationToken::new();
    cancel_on_interrupt(interrupted.clone());
    interrupted.cancelled().await;

    let report = activation.stop().await.map_err(|e| e.to_string())?;
    display::print_info(&format!(
        "Stopped: {} watch(es) started, {} skipped, {} failed",
        report.fired, report.skipped, report.failed
    ));
    Ok(())
}

async fn watch(settings: Settings) -> Result<(), String> {
    let notifier = notifier::from_config(&settings.notifier).map_err(|e| e.to_string())?;
    let dispatcher = Arc::new(Dispatcher::from_config(notifier, &settings.notifier));
    let watch_loop = FileWatchLoop::new(Arc::new(settings.watch.clone()), dispatcher)
        .map_err(|e| e.to_string())?;
    cancel_on_interrupt(watch_loop.cancellation_token());

    display::print_info(&format!(
        "Watching {}",
        settings.watch.target_path().display()
    ));
    let report = watch_loop.run().await.map_err(|e| e.to_string())?;
    display::print_info(&format!(
        "Stopped: {} event(s), {} scan(s), {} trace(s) forwarded",
        report.events_seen, report.scans, report.blocks_forwarded
    ));
    Ok(())
}

fn scan(
    settings: &Settings,
    file: &Path,
    signatures: Vec<String>,
    lines: Option<NonZeroUsize>,
) -> Result<(), String> {
    let signatures = if signatures.is_empty() {
        settings.watch.trigger_signatures.clone()
    } else {
        signatures
    };
    let lines = match lines {
        Some(n) => n,
        None => settings.watch.trace_lines().map_err(|e| e.to_string())?,
    };

    let bytes = std::fs::read(file).map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    let matches = TraceExtractor::new(lines).extract_all(&content, &signatures);

    for (index, found) in matches.iter().enumerate() {
        display::print_match(index, found);
    }
    display::print_scan_summary(file, matches.len(), signatures.len());
    Ok(())
}

fn next(settings: &Settings, count: usize) -> Result<(), String> {
    let schedule = CronSchedule::parse(&settings.watch.schedule).map_err(|e| e.to_string())?;
    display::print_firings(schedule.expression(), &schedule.upcoming(count));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match load_settings(cli.config) {
        Ok(settings) => match cli.command {
            Commands::Run => run(settings).await,
            Commands::Watch => watch(settings).await,
            Commands::Scan {
                file,
                signatures,
                lines,
            } => scan(&settings, &file, signatures, lines),
            Commands::Next { count } => next(&settings, count),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            display::print_error(&message);
            ExitCode::FAILURE
        }
    }
}
