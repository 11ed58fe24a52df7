//! Logging pipeline with JSON/compact formats.
//!
//! Environment-driven:
//! - `XR_LOG_FORMAT`: `json` or `compact` (default)
//! - `XR_LOG_LEVEL`: an `EnvFilter` directive (default `info`)
//!
//! Logs go to stderr so a compiled document on stdout stays parseable.

use anyhow::Result;
use std::io::Write;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGING_CONFIG: OnceLock<LoggingConfig> = OnceLock::new();

/// Logging configuration from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

/// Supported log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable compact format
    Compact,
    /// Machine-readable JSON format
    Json,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("XR_LOG_FORMAT").ok().as_deref(),
            std::env::var("XR_LOG_LEVEL").ok().as_deref(),
        )
    }

    fn from_vars(format: Option<&str>, level: Option<&str>) -> Self {
        let format = match format.map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        let level = level
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("info")
            .to_owned();
        Self { format, level }
    }
}

/// Initialize the logging system once. A second call is an error.
pub fn init_logging() -> Result<()> {
    let config = LoggingConfig::from_env();
    LOGGING_CONFIG
        .set(config.clone())
        .map_err(|_| anyhow::anyhow!("logging already initialized"))?;

    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow::anyhow!("invalid XR_LOG_LEVEL {:?}: {e}", config.level))?;

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
    }

    tracing::debug!(format = ?config.format, level = %config.level, "logging initialized");
    Ok(())
}

/// Flush buffered output before `process::exit`, which skips destructors.
pub fn flush_logs() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_compact_info() {
        let c = LoggingConfig::from_vars(None, None);
        assert_eq!(c.format, LogFormat::Compact);
        assert_eq!(c.level, "info");
    }

    #[test]
    fn json_format_and_custom_level() {
        let c = LoggingConfig::from_vars(Some("json"), Some("xr_config=debug"));
        assert_eq!(c.format, LogFormat::Json);
        assert_eq!(c.level, "xr_config=debug");
    }

    #[test]
    fn unknown_format_and_blank_level_fall_back() {
        let c = LoggingConfig::from_vars(Some("pretty"), Some("  "));
        assert_eq!(c.format, LogFormat::Compact);
        assert_eq!(c.level, "info");
    }
}
