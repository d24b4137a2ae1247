//! `Tickbox`: a local-first todo list.
//!
//! Runs one command against the task list stored under the data directory.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/tickbox/config.toml`).
//!
//! ```bash
//! cargo run --bin tickbox -- add Buy milk
//! cargo run --bin tickbox -- list
//! TICKBOX_DATA_DIR=/tmp/tickbox cargo run --bin tickbox -- toggle 0190
//! ```

use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use tickbox::app::App;
use tickbox::config::{AppConfig, CliArgs};
use tickbox::persistence::Persistence;
use tickbox::report::ErrorReporter;
use tickbox::store::FileStore;
use tickbox::tasks::TaskManager;

#[tokio::main]
async fn main() -> ExitCode {
    let mut cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match AppConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            AppConfig::from_cli(&cli)
        }
    };

    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());
    tracing::info!(data_dir = %config.data_dir.display(), "configuration loaded");
    tracing::debug!(?config, "tickbox starting");

    let store = match FileStore::open(&config.data_dir).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: cannot open {}: {e}", config.data_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let reporter = Arc::new(ErrorReporter::new(config.report_capacity));
    let persistence = Persistence::new(store)
        .with_policy(config.retry)
        .with_reporter(Arc::clone(&reporter));
    let app = App::new(TaskManager::mount(persistence).await, Arc::clone(&reporter));

    let result = app.execute(cli.command.take().unwrap_or_default()).await;
    let flushed = reporter.flush();
    tracing::debug!(reports = flushed.len(), "error reports flushed");

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging.
///
/// With a usable `file_path` logs go through a non-blocking file writer and
/// the returned [`WorkerGuard`] must be held until shutdown so buffered
/// entries are flushed. Otherwise they go to stderr.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(split_log_path) else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        if let Some(path) = file_path {
            tracing::warn!(path = %path.display(), "unusable log file path, logging to stderr");
        }
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Directory and file name of a log path. `None` when the path has no
/// file name (`/`, `..`).
fn split_log_path(path: &Path) -> Option<(&Path, &OsStr)> {
    let file_name = path.file_name()?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Some((dir, file_name))
}
