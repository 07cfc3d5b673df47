//! Logging initialization with file output support

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::paths;

/// Initialize logging with optional file output.
///
/// Intended for applications embedding the session; the library itself only
/// emits `tracing` events. Returns a guard that must be kept alive for the
/// duration of the program when a log directory is given.
pub fn init_logging(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_target(true).with_thread_ids(false);

    match log_dir {
        Some(dir) => {
            // Daily rotating log file
            let file_appender = tracing_appender::rolling::daily(&dir, "sftp-util.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);

            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .try_init();

            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
            None
        }
    }
}

/// Initialize logging to the default log directory (see
/// [`paths::log_dir`]), falling back to console-only output if it cannot be
/// created.
pub fn init_default_logging() -> Option<WorkerGuard> {
    match paths::ensure_log_dir() {
        Ok(dir) => init_logging(Some(dir)),
        Err(e) => {
            let guard = init_logging(None);
            tracing::warn!("Logging to console only: {}", e);
            guard
        }
    }
}
