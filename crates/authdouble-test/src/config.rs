//! Harness configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Default Hawk authentication endpoint.
pub const DEFAULT_HAWK_ENDPOINT: &str = "https://auth.taskcluster.net/v1/authenticate-hawk";

/// Default userinfo URL pattern: exact host and path, any query string.
pub const DEFAULT_USERINFO_PATTERN: &str = r"^https://auth\.mozilla\.auth0\.com/userinfo.*";

/// Controls which URLs are intercepted and how strictly.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// URL the Hawk responder is bound to (POST, query string ignored).
    pub hawk_endpoint: String,

    /// Regex the userinfo responder is bound to (GET), matched from the
    /// start of the full URL.
    pub userinfo_pattern: String,

    /// Unmatched calls are errors instead of passing through.
    pub strict: bool,

    /// Teardown fails if any binding was never called.
    pub assert_all_fired: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            hawk_endpoint: DEFAULT_HAWK_ENDPOINT.to_string(),
            userinfo_pattern: DEFAULT_USERINFO_PATTERN.to_string(),
            strict: false,
            assert_all_fired: false,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that `userinfo_pattern` compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        regex_lite::Regex::new(&self.userinfo_pattern)?;
        Ok(())
    }

    pub fn with_hawk_endpoint(mut self, url: impl Into<String>) -> Self {
        self.hawk_endpoint = url.into();
        self
    }

    pub fn with_userinfo_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.userinfo_pattern = pattern.into();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_assert_all_fired(mut self, assert_all_fired: bool) -> Self {
        self.assert_all_fired = assert_all_fired;
        self
    }
}
