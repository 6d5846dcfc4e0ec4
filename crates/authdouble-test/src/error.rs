use http::Method;
use thiserror::Error;

/// Errors from interception setup, dispatch and teardown.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("no binding matches {method} {url}")]
    Unmatched { method: Method, url: String },

    #[error("interception is not active")]
    NotActive,

    #[error("interception is already active")]
    AlreadyActive,

    #[error("invalid URL pattern: {0}")]
    InvalidPattern(#[from] regex_lite::Error),

    #[error("bindings never called: {}", .0.join(", "))]
    UnfiredBindings(Vec<String>),

    #[error("schema reset failed: {0}")]
    Reset(String),
}

/// Errors from loading a [`HarnessConfig`](crate::HarnessConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid harness config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid userinfo_pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}
