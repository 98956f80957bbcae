//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays clean. The format is
//! plain text by default and JSON when `DAYBOOK_LOG_FORMAT=json`. `RUST_LOG`
//! takes precedence over everything; otherwise `--verbose` selects debug and
//! `DAYBOOK_LOG_LEVEL` (default `info`) selects the level for this crate.

use crate::constants::{
    DEFAULT_LOG_LEVEL, ENV_VAR_DAYBOOK_LOG_FORMAT, ENV_VAR_DAYBOOK_LOG_LEVEL, LOG_FORMAT_JSON,
    LOG_FORMAT_TEXT, TRACING_SERVICE_NAME,
};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            LOG_FORMAT_TEXT => Ok(LogFormat::Text),
            LOG_FORMAT_JSON => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format '{}', expected '{}' or '{}'",
                other, LOG_FORMAT_TEXT, LOG_FORMAT_JSON
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str(LOG_FORMAT_TEXT),
            LogFormat::Json => f.write_str(LOG_FORMAT_JSON),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set.
    pub default_directive: String,
}

impl LogSettings {
    /// Reads the format and level from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unknown `DAYBOOK_LOG_FORMAT`.
    pub fn from_env(verbose: bool) -> AppResult<Self> {
        let format = match env::var(ENV_VAR_DAYBOOK_LOG_FORMAT) {
            Ok(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => LogFormat::default(),
        };

        let level = if verbose {
            "debug".to_string()
        } else {
            env::var(ENV_VAR_DAYBOOK_LOG_LEVEL)
                .ok()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
        };

        Ok(Self {
            format,
            default_directive: format!("warn,{}={}", TRACING_SERVICE_NAME, level),
        })
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `AppError::Config` if the level directive is invalid or a
/// subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> AppResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.default_directive).map_err(|e| {
            AppError::Config(format!(
                "Invalid log level in {}: {}",
                ENV_VAR_DAYBOOK_LOG_LEVEL, e
            ))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Text => registry
            .with(tfmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tfmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Config(format!("Failed to initialize logging: {}", e)))
}
