// Release builds are windowed on Windows: no console next to the GUI.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod logging;
mod logic;
mod models;
mod mvu;
mod ui;
mod utils;

use anyhow::anyhow;
use tracing::{info, warn};

use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let config_path = AppConfig::default_path();
    let loaded = AppConfig::load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => AppConfig::default(),
    };

    let log_dir = config.log_directory(&config_path);
    let logs = logging::init(&config.logging, &log_dir);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "starting csv2rdf"
    );

    let mut notices = Vec::new();
    if let Some(err) = logs.file_error() {
        warn!("{err}; logging to stderr only");
        notices.push(format!("Application log unavailable:\n\n{err}"));
    }
    match loaded {
        Ok(Some(_)) => {}
        Ok(None) => info!(path = %config_path.display(), "config file not found, using defaults"),
        Err(err) => {
            warn!("{err:#}; falling back to default configuration");
            notices.push(format!(
                "Configuration could not be loaded, defaults are in use:\n\n{err:#}"
            ));
        }
    }

    let result = app::run(config, config_path, log_dir, notices);
    drop(logs);
    result.map_err(|err| anyhow!("Failed to run UI: {err}"))
}
