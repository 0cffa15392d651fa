//! `tracing` subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{invalid_config, Result};

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

pub fn parse_level(level: &str) -> Result<tracing::Level> {
    match level {
        "error" => Ok(tracing::Level::ERROR),
        "warn" => Ok(tracing::Level::WARN),
        "info" => Ok(tracing::Level::INFO),
        "debug" => Ok(tracing::Level::DEBUG),
        "trace" => Ok(tracing::Level::TRACE),
        _ => Err(invalid_config(format!("invalid log level: {level}"))),
    }
}

/// Installs the global subscriber. Diagnostics go to stderr so the report
/// on stdout stays readable.
pub fn setup_logging(level: &str) -> Result<()> {
    let level_filter = parse_level(level)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            level_filter,
        ))
        .try_init()
        .map_err(|e| invalid_config(format!("can't install logger: {e}")))
}
