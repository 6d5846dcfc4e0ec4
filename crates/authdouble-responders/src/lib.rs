//! Canned responders for intercepted authentication calls.
//!
//! Each responder maps an [`InterceptedRequest`] to a synthetic [`Response`]
//! that follows the contract of the remote service it stands in for:
//!
//! - [`HawkAuthResponder`]: Hawk header validation (`authenticate-hawk`).
//! - [`UserInfoResponder`]: OIDC userinfo lookup by bearer token.

pub mod clock;
pub mod hawk_auth;
pub mod types;
pub mod userinfo;

pub use clock::{Clock, FixedClock, SystemClock};
pub use hawk_auth::{AuthError, AuthOutcome, HawkAuthResponder};
pub use types::{InterceptedRequest, Response};
pub use userinfo::{UserInfo, UserInfoOutcome, UserInfoResponder, DUMMY_USERINFO};

/// Produces a synthetic response for an intercepted call.
///
/// Implementations run inline on the calling thread and must not fail:
/// error conditions are expressed in the returned response.
pub trait Responder: Send + Sync {
    fn respond(&self, request: &InterceptedRequest) -> Response;
}

impl<F> Responder for F
where
    F: Fn(&InterceptedRequest) -> Response + Send + Sync,
{
    fn respond(&self, request: &InterceptedRequest) -> Response {
        self(request)
    }
}
