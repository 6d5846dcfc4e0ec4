//! Per-test table of (method, URL) bindings to responders.

use std::fmt;

use authdouble_responders::types::CONTENT_TYPE;
use authdouble_responders::{InterceptedRequest, Responder, Response};
use authdouble_telemetry::{
    log_binding_registered, log_interception_activated, log_interception_deactivated,
    log_request_intercepted, log_unmatched_request,
};
use http::Method;
use regex_lite::Regex;

use crate::error::InterceptError;

/// What a binding's URL is compared against.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Equal to the request URL with its query string removed.
    Exact(String),
    /// Matches the full request URL starting at its first character.
    Regex(Regex),
}

impl UrlPattern {
    pub fn exact(url: impl Into<String>) -> Self {
        UrlPattern::Exact(url.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, InterceptError> {
        Ok(UrlPattern::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        match self {
            UrlPattern::Exact(url) => request.url_without_query() == url,
            UrlPattern::Regex(re) => re.find(&request.url).is_some_and(|m| m.start() == 0),
        }
    }
}

/// Exact patterns compare by URL, regex patterns by source text.
impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UrlPattern::Exact(a), UrlPattern::Exact(b)) => a == b,
            (UrlPattern::Regex(a), UrlPattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for UrlPattern {}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Exact(url) => f.write_str(url),
            UrlPattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// Outcome of routing one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A responder answered.
    Intercepted(Response),
    /// Nothing matched (or interception is off); the call goes out as usual.
    Passthrough,
}

/// One call answered by a responder.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub request: InterceptedRequest,
    pub response: Response,
}

struct Binding {
    method: Method,
    pattern: UrlPattern,
    responder: Box<dyn Responder>,
    /// Applied when the responder leaves `content-type` unset.
    content_type: Option<String>,
    hits: usize,
}

impl Binding {
    fn describe(&self) -> String {
        format!("{} {}", self.method, self.pattern)
    }
}

/// Interception table owned by a single test.
///
/// Starts inactive. While active, calls matching a binding are answered by
/// its responder; the first matching binding in registration order wins.
/// Deactivating clears every binding and the call log.
pub struct InterceptionRegistry {
    active: bool,
    strict: bool,
    assert_all_fired: bool,
    bindings: Vec<Binding>,
    calls: Vec<CallRecord>,
}

impl Default for InterceptionRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for InterceptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptionRegistry")
            .field("active", &self.active)
            .field("strict", &self.strict)
            .field(
                "bindings",
                &self.bindings.iter().map(Binding::describe).collect::<Vec<_>>(),
            )
            .field("calls", &self.calls.len())
            .finish()
    }
}

impl InterceptionRegistry {
    /// Create an inactive registry. With `strict`, unmatched calls made while
    /// active are errors.
    pub fn new(strict: bool) -> Self {
        Self {
            active: false,
            strict,
            assert_all_fired: false,
            bindings: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Make [`deactivate`](Self::deactivate) fail when a binding was never hit.
    pub fn with_assert_all_fired(mut self, assert_all_fired: bool) -> Self {
        self.assert_all_fired = assert_all_fired;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Calls answered since activation, in order.
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    /// How many times the first binding for exactly `method` and `pattern`
    /// was hit.
    pub fn hits(&self, method: &Method, pattern: &UrlPattern) -> Option<usize> {
        self.bindings
            .iter()
            .find(|b| b.method == *method && b.pattern == *pattern)
            .map(|b| b.hits)
    }

    pub fn activate(&mut self) -> Result<(), InterceptError> {
        if self.active {
            return Err(InterceptError::AlreadyActive);
        }
        self.active = true;
        log_interception_activated!(strict = self.strict);
        Ok(())
    }

    /// Bind `responder` to `method` + `pattern`.
    pub fn add<R>(
        &mut self,
        method: Method,
        pattern: UrlPattern,
        responder: R,
    ) -> Result<(), InterceptError>
    where
        R: Responder + 'static,
    {
        self.add_with_content_type(method, pattern, responder, None)
    }

    /// Bind `responder`, defaulting `content-type` to `content_type` on
    /// responses that do not set one.
    pub fn add_with_content_type<R>(
        &mut self,
        method: Method,
        pattern: UrlPattern,
        responder: R,
        content_type: Option<&str>,
    ) -> Result<(), InterceptError>
    where
        R: Responder + 'static,
    {
        if !self.active {
            return Err(InterceptError::NotActive);
        }
        let binding = Binding {
            method,
            pattern,
            responder: Box::new(responder),
            content_type: content_type.map(str::to_string),
            hits: 0,
        };
        log_binding_registered!(binding = %binding.describe());
        self.bindings.push(binding);
        Ok(())
    }

    /// Route an outbound call.
    ///
    /// Inactive registries pass everything through. Active ones answer from
    /// the first matching binding; unmatched calls pass through unless the
    /// registry is strict.
    pub fn dispatch(&mut self, request: &InterceptedRequest) -> Result<Dispatch, InterceptError> {
        if !self.active {
            return Ok(Dispatch::Passthrough);
        }

        let Some(binding) = self
            .bindings
            .iter_mut()
            .find(|b| b.method == request.method && b.pattern.matches(request))
        else {
            log_unmatched_request!(method = %request.method, url = %request.url, strict = self.strict);
            if self.strict {
                return Err(InterceptError::Unmatched {
                    method: request.method.clone(),
                    url: request.url.clone(),
                });
            }
            return Ok(Dispatch::Passthrough);
        };

        let mut response = binding.responder.respond(request);
        if let Some(content_type) = &binding.content_type {
            response
                .headers
                .entry(CONTENT_TYPE.to_string())
                .or_insert_with(|| content_type.clone());
        }
        binding.hits += 1;

        log_request_intercepted!(
            method = %request.method,
            url = %request.url,
            status = response.status
        );
        self.calls.push(CallRecord {
            request: request.clone(),
            response: response.clone(),
        });
        Ok(Dispatch::Intercepted(response))
    }

    /// Switch interception off and clear all bindings and the call log.
    ///
    /// With `assert_all_fired`, returns [`InterceptError::UnfiredBindings`]
    /// naming every binding that was never hit; state is cleared either way.
    pub fn deactivate(&mut self) -> Result<(), InterceptError> {
        let unfired: Vec<String> = if self.assert_all_fired {
            self.bindings
                .iter()
                .filter(|b| b.hits == 0)
                .map(Binding::describe)
                .collect()
        } else {
            Vec::new()
        };

        let was_active = std::mem::replace(&mut self.active, false);
        self.bindings.clear();
        self.calls.clear();
        if was_active {
            log_interception_deactivated!(unfired = unfired.len());
        }

        if unfired.is_empty() {
            Ok(())
        } else {
            Err(InterceptError::UnfiredBindings(unfired))
        }
    }
}
