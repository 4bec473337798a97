//! # Logging
//!
//! Installs the global `tracing` subscriber.
//!
//! Logs always go to stderr: stdout is reserved for the rendered template so
//! `tap synth > template.json` stays clean. `RUST_LOG` takes precedence over
//! `LOG_LEVEL` when both are set.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// Build the filter: `RUST_LOG` if set, else the configured level
fn env_filter(settings: &LogSettings) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(settings.log_level.to_lowercase())
            .with_context(|| format!("Invalid LOG_LEVEL '{}'", settings.log_level)),
    }
}

/// Initialize logging once per process
///
/// # Errors
///
/// Fails on an unparseable level or if a global subscriber is already set.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if settings.is_json() {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
    } else {
        builder
            .with_ansi(settings.log_enable_color)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
    }
}
