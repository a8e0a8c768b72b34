//! Per-request context and per-call options.

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use super::observer::RequestObserver;

/// Ephemeral state for one logical request.
///
/// Built fresh per call from the resolved defaults plus per-call options,
/// handed to request-phase hooks and interceptors (which may mutate headers
/// before dispatch), and discarded when the call settles. `attempt` is the
/// transient retry counter — `0` for the initial attempt.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method.
    pub method: Method,
    /// Fully resolved URL, including query parameters.
    pub url: Url,
    /// The API path the caller asked for (prefix included, no host).
    pub path: String,
    /// Outgoing headers; interceptors and `on_request` hooks add to these.
    pub headers: HeaderMap,
    /// JSON body, when the verb carries one.
    pub body: Option<Value>,
    /// 0-based attempt counter.
    pub attempt: u32,
}

/// Per-call overrides for one pipeline request.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Extra headers for this call only.
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Observer notified before the globally-registered ones.
    pub observer: Option<Arc<dyn RequestObserver>>,
}

impl RequestOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add one query parameter.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Extend the query parameters.
    pub fn with_query(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(params);
        self
    }

    /// Attach a per-call lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}
