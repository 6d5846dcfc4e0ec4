//! Stand-in for a Hawk `authenticate-hawk` endpoint.
//!
//! The caller POSTs `{"authorization": "<Hawk header>"}` and receives either
//! `{"status": "auth-success", "scopes": [...], "scheme": "hawk",
//! "clientId": ..., "expires": ...}` with 200, or
//! `{"status": "auth-failure", "message": ...}` with 401.

use authdouble_hawk::{decode, ExtensionPayload, HeaderError};
use authdouble_telemetry::log_auth_failure;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::types::{InterceptedRequest, Response};
use crate::Responder;

/// Value of `scheme` in every successful outcome.
pub const HAWK_SCHEME: &str = "hawk";

/// Format of `expires`: local time, no offset, no fractional seconds.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// How long a successful authentication stays valid.
pub const VALIDITY_DAYS: i64 = 1;

/// Result of a simulated Hawk authentication.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum AuthOutcome {
    #[serde(rename = "auth-success")]
    Success {
        scopes: Vec<String>,
        scheme: String,
        #[serde(rename = "clientId")]
        client_id: String,
        #[serde(rename = "expires", serialize_with = "serialize_expiry")]
        expires_at: NaiveDateTime,
    },
    #[serde(rename = "auth-failure")]
    Failure { message: String },
}

/// Reasons an authentication request is turned into a failure outcome.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization")]
    MissingAuthorization,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Header(#[from] HeaderError),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    /// 200 for success, 401 for failure.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthOutcome::Success { .. } => 200,
            AuthOutcome::Failure { .. } => 401,
        }
    }

    /// Render as an `application/json` response.
    pub fn into_response(self) -> Response {
        let body = serde_json::to_string(&self).expect("auth outcome always serializes");
        Response::json(self.status_code(), body)
    }
}

/// Answers Hawk authentication calls without checking the `mac`.
///
/// Any header that parses is accepted; its scopes come from the `scopes`
/// entry of the extension payload.
#[derive(Debug, Clone, Default)]
pub struct HawkAuthResponder<C = SystemClock> {
    clock: C,
}

impl HawkAuthResponder<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> HawkAuthResponder<C> {
    /// Use `clock` for expiry stamps.
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Authenticate the raw request body. Never fails: every error becomes
    /// [`AuthOutcome::Failure`].
    pub fn authenticate(&self, body: Option<&str>) -> AuthOutcome {
        match self.try_authenticate(body) {
            Ok(outcome) => outcome,
            Err(e) => {
                log_auth_failure!(reason = %e);
                AuthOutcome::Failure {
                    message: e.to_string(),
                }
            }
        }
    }

    fn try_authenticate(&self, body: Option<&str>) -> Result<AuthOutcome, AuthError> {
        let header = authorization_from_body(body)?;
        let parsed = decode(&header)?;

        Ok(AuthOutcome::Success {
            scopes: scopes_from_ext(&parsed.ext),
            scheme: HAWK_SCHEME.to_string(),
            client_id: parsed.id,
            expires_at: self.clock.now() + chrono::Duration::days(VALIDITY_DAYS),
        })
    }
}

impl<C: Clock> Responder for HawkAuthResponder<C> {
    fn respond(&self, request: &InterceptedRequest) -> Response {
        self.authenticate(request.body.as_deref()).into_response()
    }
}

/// Extract the `authorization` string from a JSON request body.
fn authorization_from_body(body: Option<&str>) -> Result<String, AuthError> {
    let body = body.ok_or_else(|| AuthError::InvalidBody("empty body".to_string()))?;
    let payload: Value =
        serde_json::from_str(body).map_err(|e| AuthError::InvalidBody(e.to_string()))?;
    let object = payload
        .as_object()
        .ok_or_else(|| AuthError::InvalidBody("expected a JSON object".to_string()))?;

    match object.get("authorization") {
        None => Err(AuthError::MissingAuthorization),
        Some(Value::String(header)) => Ok(header.clone()),
        Some(_) => Err(AuthError::InvalidBody(
            "authorization must be a string".to_string(),
        )),
    }
}

/// String entries of `ext.scopes`; empty if absent or not an array.
fn scopes_from_ext(ext: &ExtensionPayload) -> Vec<String> {
    ext.get("scopes")
        .and_then(Value::as_array)
        .map(|scopes| {
            scopes
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn serialize_expiry<S: Serializer>(at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&at.format(EXPIRY_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use authdouble_hawk::Credential;
    use chrono::NaiveDate;
    use serde_json::json;

    fn fixed_responder() -> HawkAuthResponder<FixedClock> {
        let now = NaiveDate::from_ymd_opt(2024, 2, 28)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap();
        HawkAuthResponder::with_clock(FixedClock(now))
    }

    fn body_for(header: &str) -> String {
        json!({ "authorization": header }).to_string()
    }

    #[test]
    fn test_success_response() {
        let header = Credential::new("c1")
            .with_timestamp(1)
            .with_nonce(42)
            .with_scopes(["read"])
            .encode();
        let resp = fixed_responder().respond(
            &InterceptedRequest::post("https://auth").with_body(body_for(&header)),
        );

        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type(), Some("application/json"));
        let body = resp.json_body().unwrap();
        assert_eq!(body["status"], "auth-success");
        assert_eq!(body["clientId"], "c1");
        assert_eq!(body["scopes"], json!(["read"]));
        assert_eq!(body["scheme"], "hawk");
        // Leap day, no fractional seconds, no offset.
        assert_eq!(body["expires"], "2024-02-29T23:59:58");
    }

    #[test]
    fn test_success_without_ext_has_empty_scopes() {
        let header = Credential::new("c2").encode();
        let outcome = fixed_responder().authenticate(Some(&body_for(&header)));
        match outcome {
            AuthOutcome::Success {
                scopes, client_id, ..
            } => {
                assert!(scopes.is_empty());
                assert_eq!(client_id, "c2");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_forged_mac_still_succeeds() {
        let header = r#"Hawk id="anyone", ts="1", nonce="1", mac="nope""#;
        let outcome = fixed_responder().authenticate(Some(&body_for(header)));
        assert!(outcome.is_success());
    }

    #[test]
    fn test_missing_authorization() {
        let resp = fixed_responder()
            .respond(&InterceptedRequest::post("https://auth").with_body("{}"));
        assert_eq!(resp.status, 401);
        assert_eq!(resp.content_type(), Some("application/json"));
        let body = resp.json_body().unwrap();
        assert_eq!(body["status"], "auth-failure");
        assert_eq!(body["message"], "Missing authorization");
    }

    #[test]
    fn test_missing_prefix_failure() {
        let outcome = fixed_responder().authenticate(Some(&body_for(r#"id="c1""#)));
        assert_eq!(
            outcome,
            AuthOutcome::Failure {
                message: "Missing Hawk prefix".to_string()
            }
        );
        assert_eq!(outcome.status_code(), 401);
    }

    #[test]
    fn test_missing_field_failure() {
        let header = r#"Hawk id="c1", ts="1", nonce="2""#;
        let outcome = fixed_responder().authenticate(Some(&body_for(header)));
        assert_eq!(
            outcome,
            AuthOutcome::Failure {
                message: "Missing header part mac".to_string()
            }
        );
    }

    #[test]
    fn test_bad_ext_yields_success_with_no_scopes() {
        let header = r#"Hawk id="c1", ts="1", nonce="2", ext="%%%", mac="m""#;
        let outcome = fixed_responder().authenticate(Some(&body_for(header)));
        match outcome {
            AuthOutcome::Success { scopes, .. } => assert!(scopes.is_empty()),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_non_string_scopes_are_dropped() {
        let mut ext = ExtensionPayload::new();
        ext.insert("scopes".to_string(), json!(["a", 1, null, "b"]));
        assert_eq!(scopes_from_ext(&ext), vec!["a", "b"]);

        ext.insert("scopes".to_string(), json!("a"));
        assert!(scopes_from_ext(&ext).is_empty());
    }

    #[test]
    fn test_invalid_body_is_failure() {
        for body in [None, Some("not json"), Some("[]"), Some(r#"{"authorization": 5}"#)] {
            let outcome = fixed_responder().authenticate(body);
            match outcome {
                AuthOutcome::Failure { message } => {
                    assert!(message.starts_with("Invalid request body"), "{}", message)
                }
                other => panic!("expected failure for {:?}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let outcome = AuthOutcome::Failure {
            message: "boom".to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({"status": "auth-failure", "message": "boom"}));
    }
}
