// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Logging setup: an application-wide subscriber plus one log file per converted CSV.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{Dispatch, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::LoggingConfig;
use crate::logic::file_manager::{ensure_directory, log_file_name};

/// Application log file inside the log directory.
pub const APP_LOG_FILE: &str = "csv2rdf.log";

/// `RUST_LOG` when set, otherwise the configured level.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Keeps the application log writer alive for the lifetime of the process.
pub struct LogHandle {
    _guard: Option<WorkerGuard>,
    file_error: Option<String>,
}

impl LogHandle {
    /// Why the application log file is unavailable, when only stderr is logged.
    pub fn file_error(&self) -> Option<&str> {
        self.file_error.as_deref()
    }
}

/// Open `csv2rdf.log` in `log_dir` for appending, creating the directory.
pub fn open_app_log(log_dir: &Path) -> Result<File> {
    ensure_directory(log_dir)?;
    let path = log_dir.join(APP_LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))
}

/// Install the global subscriber: stderr plus `csv2rdf.log` in `log_dir`.
///
/// Never fails. When the log file cannot be opened only stderr is used and
/// the reason is kept in the returned handle.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> LogHandle {
    let (file_layer, guard, file_error) = match open_app_log(log_dir) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_filter(filter(&config.level));
            (Some(layer), Some(guard), None)
        }
        Err(err) => (None, None, Some(format!("{err:#}"))),
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter(&config.level));

    let subscriber = Registry::default().with(console_layer).with(file_layer);
    let file_error = match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => file_error,
        Err(err) => Some(format!("Failed to install global tracing subscriber: {err}")),
    };

    LogHandle {
        _guard: guard,
        file_error,
    }
}

/// Hands out per-file log sinks so every CSV gets its own log next to the app log.
#[derive(Clone, Debug)]
pub struct LoggerManager {
    log_dir: PathBuf,
    level: String,
}

impl LoggerManager {
    pub fn new(log_dir: PathBuf, level: impl Into<String>) -> Self {
        Self {
            log_dir,
            level: level.into(),
        }
    }

    pub fn from_config(config: &LoggingConfig, log_dir: PathBuf) -> Self {
        Self::new(log_dir, config.level.clone())
    }

    /// Build a dispatcher that appends to `<log_dir>/<csv stem>.log` and mirrors to stderr.
    pub fn file_dispatch(&self, csv_name: &str) -> Result<(Dispatch, PathBuf)> {
        ensure_directory(&self.log_dir)?;
        let path = self.log_dir.join(log_file_name(csv_name));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {:?}", path))?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_filter(filter(&self.level));
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter(&self.level));

        let subscriber = Registry::default().with(file_layer).with(console_layer);
        Ok((Dispatch::new(subscriber), path))
    }

    /// Run `f` with events routed to the log of `csv_name`.
    ///
    /// Falls back to the current dispatcher when the log file cannot be opened.
    pub fn in_file_scope<T>(&self, csv_name: &str, f: impl FnOnce() -> T) -> T {
        match self.file_dispatch(csv_name) {
            Ok((dispatch, _)) => tracing::dispatcher::with_default(&dispatch, f),
            Err(err) => {
                warn!("{err:#}; logging to the application log only");
                f()
            }
        }
    }
}
