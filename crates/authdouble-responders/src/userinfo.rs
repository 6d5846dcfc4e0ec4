//! Stand-in for an OIDC `/userinfo` endpoint.
//!
//! The access token is read from the `access_token` query parameter. The
//! remote service answers 200 even for a rejected token, so rejection is
//! signalled only by a `text/plain` body of `Unauthorized`.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{InterceptedRequest, Response};
use crate::Responder;

/// Token value that is always rejected.
pub const BAD_TOKEN: &str = "badtoken";

/// Query parameter carrying the bearer token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Body returned for a rejected token.
pub const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// Identity record returned for every accepted token.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub family_name: &'static str,
    pub given_name: &'static str,
    pub nickname: &'static str,
    pub groups: &'static [&'static str],
    pub emails: &'static [&'static str],
    pub dn: &'static str,
    #[serde(rename = "organizationUnits")]
    pub organization_units: &'static str,
    pub email: &'static str,
    pub name: &'static str,
    pub picture: &'static str,
    pub email_verified: bool,
    #[serde(rename = "clientID")]
    pub client_id: &'static str,
    pub updated_at: &'static str,
    pub user_id: &'static str,
    pub identities: &'static [ProviderIdentity],
    pub created_at: &'static str,
    pub multifactor: &'static [&'static str],
    pub sub: &'static str,
}

/// Upstream identity-provider entry of a [`UserInfo`].
#[derive(Debug, Serialize)]
pub struct ProviderIdentity {
    pub user_id: &'static str,
    pub provider: &'static str,
    pub connection: &'static str,
    #[serde(rename = "isSocial")]
    pub is_social: bool,
}

// Fictional person.
pub static DUMMY_USERINFO: UserInfo = UserInfo {
    family_name: "Moran",
    given_name: "Lydia",
    nickname: "Lydia Moran",
    groups: &[
        "avengers",
        "JusticeLeague",
        "x_men",
        "the_specials",
        "fantastic4",
    ],
    emails: &["lmoran@mozilla.com"],
    dn: "mail=lmoran@mozilla.com,o=com,dc=mozilla",
    organization_units: "mail=lmoran@mozilla.com,o=com,dc=mozilla",
    email: "lmoran@mozilla.com",
    name: "Lydia Moran",
    picture: "http://people.mozilla.com/~faaborg/files/shiretoko/firefoxIcon/firefox-128.png",
    email_verified: true,
    client_id: "abcdefghijklmnopqrstuvwxyz123456",
    updated_at: "2017-04-25T09:36:57.950Z",
    user_id: "ad|Mozilla-LDAP|lmoran",
    identities: &[ProviderIdentity {
        user_id: "Mozilla-LDAP|lmoran",
        provider: "ad",
        connection: "Mozilla-LDAP",
        is_social: false,
    }],
    created_at: "2017-03-07T10:14:51.077Z",
    multifactor: &["duo"],
    sub: "ad|Mozilla-LDAP|lmoran",
};

/// Result of a userinfo lookup.
#[derive(Debug)]
pub enum UserInfoOutcome {
    Authorized(&'static UserInfo),
    Unauthorized,
}

impl UserInfoOutcome {
    /// Always status 200; JSON profile or plain-text `Unauthorized`.
    pub fn into_response(self) -> Response {
        match self {
            UserInfoOutcome::Authorized(profile) => Response::json(
                200,
                serde_json::to_string(profile).expect("static userinfo always serializes"),
            ),
            UserInfoOutcome::Unauthorized => Response::text(200, UNAUTHORIZED_BODY),
        }
    }
}

/// Answers userinfo lookups with [`DUMMY_USERINFO`] unless the token is
/// missing or equal to [`BAD_TOKEN`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserInfoResponder;

impl UserInfoResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, request: &InterceptedRequest) -> UserInfoOutcome {
        let params = parse_query(request.query().unwrap_or_default());
        match params.get(ACCESS_TOKEN_PARAM) {
            None => UserInfoOutcome::Unauthorized,
            Some(&token) if token == BAD_TOKEN => UserInfoOutcome::Unauthorized,
            Some(_) => UserInfoOutcome::Authorized(&DUMMY_USERINFO),
        }
    }
}

impl Responder for UserInfoResponder {
    fn respond(&self, request: &InterceptedRequest) -> Response {
        self.lookup(request).into_response()
    }
}

/// Split a raw query string on `&`, then each pair on its first `=`.
///
/// Values are not percent-decoded. A parameter without `=` maps to an empty
/// value, empty segments are skipped, and later duplicates win.
pub fn parse_query(query: &str) -> HashMap<&str, &str> {
    query
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect()
}
