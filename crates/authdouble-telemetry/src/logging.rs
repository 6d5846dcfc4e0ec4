//! Structured logging with JSON output.
//!
//! Events go to stderr so command output on stdout stays machine-readable.

use std::sync::Once;

use crate::{LogConfig, LogFormat, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &LogConfig) -> Result<(), TelemetryError> {
    // Build the env filter from config or RUST_LOG
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

/// Install a test-friendly subscriber once per process.
///
/// Output goes through the test writer so `cargo test` captures it. A
/// subscriber installed elsewhere first is left in place.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// Interception was switched on for a test.
    pub const INTERCEPTION_ACTIVATED: &str = "interception_activated";

    /// Interception was switched off and its bindings cleared.
    pub const INTERCEPTION_DEACTIVATED: &str = "interception_deactivated";

    /// A (method, URL) binding was added.
    pub const BINDING_REGISTERED: &str = "binding_registered";

    /// An outbound call was answered by a responder.
    pub const REQUEST_INTERCEPTED: &str = "request_intercepted";

    /// An outbound call matched no binding.
    pub const UNMATCHED_REQUEST: &str = "unmatched_request";

    /// A simulated authentication was rejected.
    pub const AUTH_FAILURE: &str = "auth_failure";

    /// The application's storage schema was reset.
    pub const SCHEMA_RESET: &str = "schema_reset";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_interception_activated {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::INTERCEPTION_ACTIVATED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_interception_deactivated {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::INTERCEPTION_DEACTIVATED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_binding_registered {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::BINDING_REGISTERED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_request_intercepted {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::REQUEST_INTERCEPTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_unmatched_request {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::UNMATCHED_REQUEST,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_auth_failure {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::AUTH_FAILURE,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_schema_reset {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::SCHEMA_RESET,
            $($field)*
        )
    };
}
