//! File logging. The terminal belongs to the UI, so nothing goes to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

pub const LOG_FILE_NAME: &str = "vidtree.log";

/// Installs the global subscriber. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init(cfg: &LogConfig) -> Result<WorkerGuard> {
    let log_dir = log_dir(cfg);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!(version = crate::VERSION, dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}

pub fn log_dir(cfg: &LogConfig) -> PathBuf {
    cfg.directory
        .clone()
        .unwrap_or_else(|| Path::new(".").join("logs"))
}
