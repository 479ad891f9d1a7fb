//! Process-wide tracing setup: human-readable stdout plus a rotating file
//! under the configured log directory.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const STDOUT_FILTER: &str = "microblog=debug,tower_http=debug";
const FILE_FILTER: &str = "microblog=info,tower_http=info";
const KEEP_LOG_FILES: usize = 3;

/// Install the global subscriber. Hold the returned guard until shutdown or
/// buffered file lines are lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(log_dir)?);

    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| STDOUT_FILTER.into());

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(stdout_filter))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_FILTER)),
        )
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}

/// `microblog.<date>.log`, rolled daily, oldest files pruned.
pub fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("microblog")
        .filename_suffix("log")
        .max_log_files(KEEP_LOG_FILES)
        .build(log_dir)
        .with_context(|| format!("cannot open log file in {}", log_dir.display()))
}
