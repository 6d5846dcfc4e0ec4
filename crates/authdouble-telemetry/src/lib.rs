//! Logging for authdouble.
//!
//! Structured JSON (or pretty) logging through `tracing-subscriber`, plus the
//! standard event names every authdouble crate logs under.
//!
//! # Usage
//!
//! ```ignore
//! use authdouble_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig::new().with_log_format(LogFormat::Pretty))?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogConfig, LogFormat};
pub use logging::{events, init_logging, init_test_logging};

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new()
            .with_log_level("debug")
            .with_log_format(LogFormat::Pretty);

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_logging_init_error_message() {
        let err = TelemetryError::LoggingInit("already set".to_string());
        assert_eq!(err.to_string(), "failed to initialize logging: already set");
    }
}
