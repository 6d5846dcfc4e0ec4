use http::Method;
use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "content-type";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

/// An outbound HTTP call captured before it reached the network.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    /// Full URL, including any query string.
    pub url: String,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The URL with any query string and fragment removed.
    pub fn url_without_query(&self) -> &str {
        let end = self.url.find(['?', '#']).unwrap_or(self.url.len());
        &self.url[..end]
    }

    /// The raw query string (between `?` and `#`), if any.
    pub fn query(&self) -> Option<&str> {
        let (_, rest) = self.url.split_once('?')?;
        Some(rest.split_once('#').map_or(rest, |(query, _)| query))
    }
}

/// A synthetic response produced by a responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl Response {
    /// A response with `content-type` set and the given body.
    pub fn with_content_type(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        Self {
            status,
            headers,
            body: Some(body.into()),
        }
    }

    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self::with_content_type(status, APPLICATION_JSON, body)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::with_content_type(status, TEXT_PLAIN, body)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }

    /// Parse the body as JSON. `None` when there is no body or it is not JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.body.as_deref()?).ok()
    }
}
