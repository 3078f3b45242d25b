//! File logging through `tracing`.
//!
//! The terminal belongs to the UI, so log lines go to a daily rolling file.
//! `RUST_LOG` overrides the configured filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LoggingSettings, default_log_dir};
use crate::error::LoggingError;

/// Keeps the background log writer alive; dropping it flushes pending lines.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    pub directory: PathBuf,
}

/// Install the global subscriber.
pub fn init(settings: &LoggingSettings) -> Result<LoggingGuard, LoggingError> {
    let directory = settings
        .directory
        .clone()
        .or_else(default_log_dir)
        .ok_or(LoggingError::NoDirectory)?;

    if !directory.exists() {
        std::fs::create_dir_all(&directory).map_err(|source| {
            LoggingError::DirectoryCreationFailed {
                path: directory.clone(),
                source,
            }
        })?;
    }

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(&settings.level, rust_log.as_deref())?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &directory, &settings.file_prefix);
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        directory,
    })
}

/// Filter from `RUST_LOG` when set, else from the configured level.
fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directives = rust_log.filter(|s| !s.trim().is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter {
        filter: directives.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used_without_rust_log() {
        let filter = build_filter("debug", None).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn rust_log_wins_over_configured_level() {
        let filter = build_filter("info", Some("pochette=trace")).unwrap();
        assert_eq!(filter.to_string(), "pochette=trace");

        let filter = build_filter("warn", Some("  ")).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn bad_level_is_reported() {
        let err = build_filter("pochette=loud", None).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { .. }));
    }
}
