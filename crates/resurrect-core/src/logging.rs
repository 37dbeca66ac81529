//! Structured logging for resurrect-core.
//!
//! Built on `tracing` with configurable output formats:
//!
//! - **Pretty format**: human-friendly output for interactive use
//! - **JSON format**: machine-parseable JSON lines for CI and ops
//! - **File output**: optional log file
//!
//! Initialize once at startup:
//!
//! ```ignore
//! use resurrect_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! ```
//!
//! # Safety
//!
//! Never log raw pane contents — scrollback text can contain secrets.
//! Log pane ids, byte counts, and paths instead.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Global flag to track whether logging has been initialized.
static LOGGING_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error).
    /// Can be overridden by the `RUST_LOG` environment variable.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file path; when set, output goes to the file instead
    /// of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Error type for logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("failed to create log file: {0}")]
    FileCreate(#[from] io::Error),

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize the global tracing subscriber from a [`LogConfig`].
///
/// # Errors
/// Returns an error if logging was already initialized, the level string
/// is invalid, or the log file cannot be created.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|_| LogError::InvalidLevel(config.level.clone()))?;

    let file = match &config.file {
        Some(path) => {
            crate::fsutil::ensure_parent_dir(path)?;
            Some(Arc::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            ))
        }
        None => None,
    };

    match (config.format, file) {
        (LogFormat::Pretty, None) => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        (LogFormat::Pretty, Some(file)) => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        (LogFormat::Json, None) => {
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        (LogFormat::Json, Some(file)) => {
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let _ = LOGGING_INITIALIZED.set(true);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_config_defaults() {
        let c = LogConfig::default();
        assert_eq!(c.level, "info");
        assert_eq!(c.format, LogFormat::Pretty);
        assert!(c.file.is_none());
    }

    #[test]
    fn log_format_serde() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
        let parsed: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(parsed, LogFormat::Pretty);
    }

    #[test]
    fn config_serde_defaults_on_missing() {
        let parsed: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.level, "info");
    }
}
