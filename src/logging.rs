use std::path::Path;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a `tracing` filter, e.g. `chorely=debug`
pub const LOG_ENV_VAR: &str = "CHORELY_LOG";

pub const LOG_FILE_PREFIX: &str = "chorely.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    DirectoryError(#[from] std::io::Error),
    #[error("Failed to install log subscriber: {0}")]
    InitError(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter from `CHORELY_LOG`, falling back to `default_directives`
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Log to a daily file under `log_dir`, and to stderr as well when `verbose`.
///
/// The TUI owns the terminal, so stderr output is only wanted for the
/// one-shot subcommands. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init(log_dir: &Path, default_directives: &str, verbose: bool) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(env_filter(default_directives))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}
