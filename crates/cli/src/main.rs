use std::process::ExitCode;

use anyhow::{anyhow, Result};
use configurator_core::config::{AppConfig, LoadOptions, LogFormat};

fn init_logging() -> Result<()> {
    use tracing::Level;

    // A broken config is reported by the command itself; log with defaults meanwhile.
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    // stdout carries the JSON command payload, so logs go to stderr.
    let installed = match config.logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(log_level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(log_level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(log_level)
            .json()
            .try_init(),
    };

    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> Result<ExitCode> {
    init_logging()?;
    Ok(configurator_cli::run())
}
