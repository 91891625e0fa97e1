use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

const LOG_FILE_NAME: &str = "policy-rag.log";

/// Logger implementation using tracing
///
/// Console output goes to stderr; stdout is reserved for answers and `--json`
/// output.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Install the global subscriber. Keep the returned value alive for the
    /// lifetime of the process so buffered file output is flushed.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let json = match config.format.to_lowercase().as_str() {
            "json" => true,
            "pretty" => false,
            other => anyhow::bail!("Invalid log format: {other}"),
        };

        let env_filter = || {
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy()
        };

        let console_layer = if json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter())
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(env_filter())
                .boxed()
        };

        let (file_layer, guard) = match config.log_dir {
            Some(ref log_dir) => {
                std::fs::create_dir_all(log_dir).with_context(|| {
                    format!("Failed to create log directory {}", log_dir.display())
                })?;
                let appender = parse_rotation(&config.rotation, log_dir)?;
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                // Files are always JSON.
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(env_filter())
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;

        tracing::debug!(
            level = %config.level,
            format = %config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// Parse log level string to Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

/// Build a rolling appender for `rotation` (hourly, daily or never).
pub fn parse_rotation(rotation: &str, log_dir: &Path) -> Result<RollingFileAppender> {
    match rotation.to_lowercase().as_str() {
        "hourly" => Ok(rolling::hourly(log_dir, LOG_FILE_NAME)),
        "daily" => Ok(rolling::daily(log_dir, LOG_FILE_NAME)),
        "never" => Ok(rolling::never(log_dir, LOG_FILE_NAME)),
        other => anyhow::bail!("Invalid log rotation: {other}"),
    }
}
