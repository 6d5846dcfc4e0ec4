//! Test harness that intercepts an application's outbound authentication
//! calls.
//!
//! Each test owns an [`InterceptionRegistry`]. [`TestHarness::setup`] resets
//! the application's storage, activates the registry and binds:
//!
//! - the Hawk responder to `POST <hawk_endpoint>` when the application
//!   declares Hawk auth;
//! - the userinfo responder to `GET <userinfo_pattern>` when it declares
//!   bearer auth.
//!
//! The application (or its HTTP client shim) hands every outbound call to
//! [`InterceptionRegistry::dispatch`]. Teardown happens when the returned
//! guard is finished or dropped.

pub mod app;
pub mod config;
pub mod error;
pub mod fixture;
pub mod registry;

pub use app::{AppConfig, AppUnderTest, SchemaReset};
pub use config::HarnessConfig;
pub use error::{ConfigError, InterceptError};
pub use fixture::{ActiveInterception, TestHarness};
pub use registry::{CallRecord, Dispatch, InterceptionRegistry, UrlPattern};

/// Mint a Hawk header for `client_id` carrying `scopes`.
///
/// Shorthand for tests that drive an application guarded by Hawk auth.
pub fn hawk_header<I, S>(client_id: &str, scopes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    authdouble_hawk::Credential::new(client_id)
        .with_scopes(scopes)
        .encode()
}
