//! Tracing setup: console output plus an optional per-run log file.
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LogConfig;

/// Log file name for a run started at `started`: `{timestamp}_{file}`.
pub fn log_file_name(started: DateTime<Local>, file: &str) -> String {
    format!("{}_{}", started.format("%Y-%m-%d_%H-%M-%S"), file)
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `config.level`. When `config.dir` is non-empty the
/// directory is created and each run writes to a fresh timestamped file in
/// it; the path is returned.
pub fn init(config: &LogConfig) -> Result<Option<PathBuf>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let (file_layer, path) = if config.dir.is_empty() {
        (None, None)
    } else {
        let path = open_log_path(Path::new(&config.dir), &config.file)?;
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(filter());
        (Some(layer), Some(path))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter()))
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(path)
}

fn open_log_path(dir: &Path, file: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir.join(log_file_name(Local::now(), file)))
}
