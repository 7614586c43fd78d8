//! Tracing setup. The interactive view owns the terminal, so it logs to a
//! file; the print commands log to stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "snitch_diff_client=info,snitch_diff_core=info,snitch_diff_tui=info";
const LOG_FILE_NAME: &str = "snitch-diff.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.snitch/log`, falling back to the system temp dir.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".snitch").join("log"))
        .unwrap_or_else(|| std::env::temp_dir().join("snitch"))
}

/// Log to a file under [`log_dir`]. Keep the guard alive until exit so
/// buffered lines get flushed.
pub fn init_file_logging() -> std::io::Result<WorkerGuard> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }
    let log_file = log_file_opts.open(log_dir.join(LOG_FILE_NAME))?;

    let (non_blocking, guard) = non_blocking(log_file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter());
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}

pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
