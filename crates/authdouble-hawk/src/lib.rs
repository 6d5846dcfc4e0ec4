//! Fake Hawk authorization headers.
//!
//! Builds and parses `Hawk id="...", ts="...", nonce="...", [ext="...",] mac="..."`
//! headers for test doubles of services that authenticate callers with Hawk.
//! The `mac` is a plain SHA-1 over the preceding field values; it carries no
//! key and is never checked when parsing. Has no I/O and no async
//! dependencies.

mod ext;

pub use ext::{canonical_json, decode_ext, encode_ext, ExtensionPayload};

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use regex::Regex;
use sha1::{Digest, Sha1};
use thiserror::Error;

// --- Constants ---

/// Scheme prefix every header starts with.
pub const SCHEME_PREFIX: &str = "Hawk ";

/// Upper bound (inclusive) for randomly chosen nonces.
pub const MAX_NONCE: u32 = 100_000;

/// Fields that must be present for a header to parse, in check order.
const REQUIRED_FIELDS: [&str; 4] = ["id", "mac", "ts", "nonce"];

// --- Public types ---

/// Errors from [`decode`].
///
/// The `Display` text is what a responder reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The header does not start with [`SCHEME_PREFIX`].
    #[error("Missing Hawk prefix")]
    MalformedHeader,

    /// One of `id`, `mac`, `ts`, `nonce` is absent.
    #[error("Missing header part {0}")]
    MissingField(&'static str),
}

/// A credential to be serialized into a header.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    /// Client identifier.
    pub id: String,
    /// Signing timestamp, seconds since the Unix epoch.
    pub ts: u64,
    pub nonce: u32,
    /// Optional extension payload, carried base64-encoded in `ext`.
    pub ext: Option<ExtensionPayload>,
}

/// The fields recovered from a header by [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHeader {
    pub id: String,
    pub ts: String,
    pub nonce: String,
    pub mac: String,
    /// The raw `ext` text as it appeared in the header.
    pub ext_raw: Option<String>,
    /// Decoded extension payload. Empty when `ext` is absent or undecodable.
    pub ext: ExtensionPayload,
}

// --- Credential ---

impl Credential {
    /// Create a credential for `id`, stamped with the current time and a
    /// random nonce in `0..=MAX_NONCE`.
    pub fn new(id: impl Into<String>) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            id: id.into(),
            ts,
            nonce: rand::rng().random_range(0..=MAX_NONCE),
            ext: None,
        }
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, ts: u64) -> Self {
        self.ts = ts;
        self
    }

    /// Set the nonce.
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    /// Attach an extension payload.
    pub fn with_ext(mut self, ext: ExtensionPayload) -> Self {
        self.ext = Some(ext);
        self
    }

    /// Attach `{"scopes": [...]}` as the extension payload.
    pub fn with_scopes<I, S>(self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes: Vec<serde_json::Value> = scopes
            .into_iter()
            .map(|s| serde_json::Value::String(s.into()))
            .collect();
        let mut ext = ExtensionPayload::new();
        ext.insert("scopes".to_string(), serde_json::Value::Array(scopes));
        self.with_ext(ext)
    }

    /// Serialize into a header. Shorthand for [`encode`].
    pub fn encode(&self) -> String {
        encode(self)
    }
}

// --- Public functions ---

/// Serialize a credential into a `Hawk ...` header.
///
/// Fields are emitted as `id, ts, nonce, [ext], mac`. The `mac` is computed
/// over the newline-joined values of every preceding field, with `ext`
/// contributing its base64 text.
pub fn encode(credential: &Credential) -> String {
    let mut fields: Vec<(&str, String)> = vec![
        ("id", credential.id.clone()),
        ("ts", credential.ts.to_string()),
        ("nonce", credential.nonce.to_string()),
    ];
    if let Some(ext) = &credential.ext {
        fields.push(("ext", encode_ext(ext)));
    }

    let mac = compute_mac(fields.iter().map(|(_, v)| v.as_str()));
    fields.push(("mac", mac));

    let parts = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{}", SCHEME_PREFIX, parts)
}

/// Parse a `Hawk ...` header.
///
/// The `mac` is not checked. A missing or undecodable `ext` yields an empty
/// payload rather than an error.
pub fn decode(header: &str) -> Result<ParsedHeader, HeaderError> {
    if !header.starts_with(SCHEME_PREFIX) {
        return Err(HeaderError::MalformedHeader);
    }

    // Later duplicates win.
    let parts: HashMap<&str, &str> = field_pattern()
        .captures_iter(header)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();

    for field in REQUIRED_FIELDS {
        if !parts.contains_key(field) {
            return Err(HeaderError::MissingField(field));
        }
    }
    let field = |name: &str| parts.get(name).map(|v| v.to_string()).unwrap_or_default();

    let ext_raw = parts.get("ext").map(|v| v.to_string());
    let ext = ext_raw.as_deref().map(decode_ext).unwrap_or_default();

    Ok(ParsedHeader {
        id: field("id"),
        ts: field("ts"),
        nonce: field("nonce"),
        mac: field("mac"),
        ext_raw,
        ext,
    })
}

/// SHA-1 hex digest over the newline-joined `values`.
pub fn compute_mac<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let contents = values.into_iter().collect::<Vec<_>>().join("\n");
    let mut hasher = Sha1::new();
    hasher.update(contents.as_bytes());
    hex::encode(hasher.finalize())
}

impl ParsedHeader {
    /// The `mac` a well-formed client would have sent for these fields.
    pub fn expected_mac(&self) -> String {
        let mut values = vec![self.id.as_str(), self.ts.as_str(), self.nonce.as_str()];
        if let Some(ext) = &self.ext_raw {
            values.push(ext.as_str());
        }
        compute_mac(values)
    }

    /// Whether the carried `mac` matches [`expected_mac`](Self::expected_mac).
    ///
    /// Diagnostic only: parsing never rejects a header on this basis.
    pub fn mac_matches(&self) -> bool {
        self.expected_mac() == self.mac
    }
}

// --- Private helpers ---

// Values admit Unicode word characters plus `= . @ / + -`; `+` is needed
// for standard base64 `ext` values.
fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(\w+)="([\w=.@/+-]+)""#).expect("header field pattern is valid")
    })
}

// --- Tests ---
