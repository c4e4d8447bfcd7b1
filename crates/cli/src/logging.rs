//! Tracing subscriber setup.

use color_eyre::eyre::{Result, WrapErr};
use od_core::config::loader::CONFIG_DIR;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Variable holding the log filter, e.g. `od_core=debug`.
const LOG_ENV: &str = "OPSDESK_LOG";

const LOG_FILE: &str = "opsdesk.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to `<root>/.opsdesk/logs/opsdesk.log`. Keep the guard alive until exit.
pub fn init_file(root: &Path) -> Result<WorkerGuard> {
    let log_dir = root.join(CONFIG_DIR).join("logs");
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

/// Log to stderr, keeping stdout for command output.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
