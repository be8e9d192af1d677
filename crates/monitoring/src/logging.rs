//! Logging configuration and initialization.
//!
//! Supports console output or daily rotating file logging, selected by
//! environment variable. Log filtering follows `RUST_LOG` via
//! `EnvFilter`, so tests and embedders control verbosity without any
//! process-global custom logger.

use anyhow::Result;
use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the non-blocking file writer flushing; hold it for the process
/// lifetime when file logging is active.
pub type LogGuard = Option<WorkerGuard>;

/// Initialize tracing with a configurable output destination.
///
/// ## Environment Variables
///
/// - `LOG_DESTINATION`: "console" (default) or "file"
/// - `LOG_DIR`: directory for log files (default: "./logs")
/// - `LOG_FILE_PREFIX`: prefix for log file names (default: "stanza")
/// - `RUST_LOG`: filter directives (default: "info")
pub fn init_logging() -> Result<LogGuard> {
    let destination = env::var("LOG_DESTINATION").unwrap_or_else(|_| "console".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    match destination.to_lowercase().as_str() {
        "file" => {
            let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
            let prefix = env::var("LOG_FILE_PREFIX").unwrap_or_else(|_| "stanza".to_string());

            std::fs::create_dir_all(&log_dir).map_err(|e| {
                anyhow::anyhow!("failed to create log directory '{}': {}", log_dir, e)
            })?;

            let file_appender = rolling::daily(&log_dir, &prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(false),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;

            Ok(Some(guard))
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_ansi(true)
                        .with_target(false),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;

            Ok(None)
        }
    }
}
