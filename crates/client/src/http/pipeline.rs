//! The request pipeline: hooks, interceptors, bounded retry, classification.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::context::{RequestContext, RequestOptions};
use super::observer::RequestObserver;
use super::response::{lowercase_headers, ApiResponse, ResponseParts};
use super::retry::HttpRetryPolicy;
use crate::config::SdkConfig;
use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::interceptors::Interceptor;
use crate::pagination::Pagination;
use woosdk_common::events::{EventBus, SdkEvent};
use woosdk_common::resilience::{RetryDecision, RetryPolicy};

/// Executes logical requests against one site.
///
/// Owns one `reqwest::Client` for its SDK instance; the client and the
/// interceptor chain are created once and reused by reference for every
/// request. Failures always resolve to a classified [`ApiError`] — the
/// pipeline never panics on network-level conditions.
pub struct HttpPipeline {
    client: Client,
    config: Arc<SdkConfig>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    observers: Vec<Arc<dyn RequestObserver>>,
    events: EventBus,
}

impl HttpPipeline {
    /// Assemble a pipeline. Called by the SDK facade during initialization.
    pub fn new(
        client: Client,
        config: Arc<SdkConfig>,
        interceptors: Vec<Arc<dyn Interceptor>>,
        observers: Vec<Arc<dyn RequestObserver>>,
        events: EventBus,
    ) -> Self {
        Self { client, config, interceptors, observers, events }
    }

    /// The resolved configuration this pipeline was built with.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The event bus requests report into.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// `GET path`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::GET, path, None, options).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::request(format!("failed to serialize request body: {e}")))?;
        self.request(Method::POST, path, Some(body), options).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::request(format!("failed to serialize request body: {e}")))?;
        self.request(Method::PUT, path, Some(body), options).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::DELETE, path, None, options).await
    }

    /// Execute one logical request.
    ///
    /// Lifecycle: `on_loading(true)` → `on_request` → interceptor request
    /// phase → dispatch (with bounded retry) → interceptor response phase →
    /// `on_response` / `on_error` → `on_finally` → `on_loading(false)`.
    /// The final two phases run on every settlement path so loading-state
    /// transitions always pair up.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let per_call = options.observer.clone();
        let per_call = per_call.as_deref();

        self.notify_loading(true, per_call).await;
        let outcome = self.execute(method, path, body, &options, per_call).await;
        self.notify_finally(per_call).await;
        self.notify_loading(false, per_call).await;
        outcome
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: &RequestOptions,
        per_call: Option<&dyn RequestObserver>,
    ) -> ApiResult<T> {
        let mut ctx = match self.build_context(method, path, body, options) {
            Ok(ctx) => ctx,
            Err(error) => {
                self.settle_error(&error, per_call).await;
                return Err(error);
            }
        };

        self.notify_request(&mut ctx, per_call).await;
        for interceptor in &self.interceptors {
            if let Err(error) = interceptor.before_request(&mut ctx).await {
                self.settle_error(&error, per_call).await;
                return Err(error);
            }
        }

        match self.dispatch_with_retry(&mut ctx, per_call).await {
            Ok((parts, body_bytes)) => {
                for interceptor in &self.interceptors {
                    interceptor.after_response(&ctx, &parts).await;
                }
                self.notify_response(&parts, per_call).await;

                let pagination = Pagination::from_headers(&parts.headers);
                match parse_body::<T>(&body_bytes) {
                    Ok(data) => Ok(ApiResponse {
                        data,
                        status: parts.status,
                        headers: parts.headers,
                        pagination,
                    }),
                    Err(error) => {
                        self.settle_error(&error, per_call).await;
                        Err(error)
                    }
                }
            }
            Err(error) => {
                // Session-affecting headers (rotated nonces, cart tokens)
                // also arrive on rejected responses.
                if let ApiError::Server { status, headers, .. } = &error {
                    let parts = ResponseParts { status: *status, headers: headers.clone() };
                    for interceptor in &self.interceptors {
                        interceptor.after_response(&ctx, &parts).await;
                    }
                }
                self.settle_error(&error, per_call).await;
                Err(error)
            }
        }
    }

    /// Attempt loop: `0..=max_retries` dispatches, consulting the retry
    /// policy between failures and surfacing only the last error.
    async fn dispatch_with_retry(
        &self,
        ctx: &mut RequestContext,
        per_call: Option<&dyn RequestObserver>,
    ) -> Result<(ResponseParts, Vec<u8>), ApiError> {
        let retry = &self.config.request.retry;
        let policy = HttpRetryPolicy::new(retry, ctx.method.clone());
        let max_retries = if retry.enabled { retry.max_retries } else { 0 };

        loop {
            match self.send_once(ctx).await {
                Ok(success) => return Ok(success),
                Err(error) => {
                    if ctx.attempt >= max_retries {
                        return Err(error);
                    }
                    let delay = match policy.should_retry(&error, ctx.attempt) {
                        RetryDecision::Stop => return Err(error),
                        RetryDecision::Retry => retry.backoff.calculate_delay(ctx.attempt),
                        RetryDecision::RetryAfter(delay) => delay,
                    };
                    self.notify_retry(ctx.attempt, &error, ctx, per_call).await;
                    warn!(
                        attempt = ctx.attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "request failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    ctx.attempt += 1;
                }
            }
        }
    }

    async fn send_once(
        &self,
        ctx: &RequestContext,
    ) -> Result<(ResponseParts, Vec<u8>), ApiError> {
        debug!(attempt = ctx.attempt, url = %ctx.url, "dispatching request");

        let mut builder = self
            .client
            .request(ctx.method.clone(), ctx.url.clone())
            .headers(ctx.headers.clone());
        if let Some(body) = &ctx.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        let headers = lowercase_headers(response.headers());
        let parts = ResponseParts { status: status.as_u16(), headers };

        if status.is_success() {
            let body = response.bytes().await.map_err(|e| ApiError::Network {
                code: "network_error".to_owned(),
                message: format!("failed to read response body: {e}"),
            })?;
            Ok((parts, body.to_vec()))
        } else {
            let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            Err(classify_status_error(parts.status, &body, parts.headers))
        }
    }

    fn build_context(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> Result<RequestContext, ApiError> {
        let mut url = self
            .config
            .url_for(path)
            .map_err(|e| ApiError::request(e.to_string()))?;
        if !options.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &options.query {
                pairs.append_pair(name, value);
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::request(format!("invalid header name `{name}`: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::request(format!("invalid value for header `{name}`: {e}")))?;
            headers.insert(header_name, header_value);
        }

        Ok(RequestContext {
            method,
            url,
            path: path.to_owned(),
            headers,
            body,
            attempt: 0,
        })
    }

    async fn notify_loading(&self, loading: bool, per_call: Option<&dyn RequestObserver>) {
        if let Some(observer) = per_call {
            observer.on_loading(loading).await;
        }
        for observer in &self.observers {
            observer.on_loading(loading).await;
        }
    }

    async fn notify_request(
        &self,
        ctx: &mut RequestContext,
        per_call: Option<&dyn RequestObserver>,
    ) {
        if let Some(observer) = per_call {
            observer.on_request(ctx).await;
        }
        for observer in &self.observers {
            observer.on_request(ctx).await;
        }
    }

    async fn notify_response(&self, parts: &ResponseParts, per_call: Option<&dyn RequestObserver>) {
        if let Some(observer) = per_call {
            observer.on_response(parts).await;
        }
        for observer in &self.observers {
            observer.on_response(parts).await;
        }
    }

    async fn notify_retry(
        &self,
        attempt: u32,
        error: &ApiError,
        ctx: &RequestContext,
        per_call: Option<&dyn RequestObserver>,
    ) {
        if let Some(observer) = per_call {
            observer.on_retry(attempt, error, ctx).await;
        }
        for observer in &self.observers {
            observer.on_retry(attempt, error, ctx).await;
        }
    }

    async fn notify_finally(&self, per_call: Option<&dyn RequestObserver>) {
        if let Some(observer) = per_call {
            observer.on_finally().await;
        }
        for observer in &self.observers {
            observer.on_finally().await;
        }
    }

    async fn settle_error(&self, error: &ApiError, per_call: Option<&dyn RequestObserver>) {
        self.events.emit(&SdkEvent::RequestError {
            status: error.status(),
            code: error.code().to_owned(),
        });
        if let Some(observer) = per_call {
            observer.on_error(error).await;
        }
        for observer in &self.observers {
            observer.on_error(error).await;
        }
    }
}

/// Map a transport failure onto the taxonomy: builder problems could not be
/// dispatched, everything else was sent without a response arriving.
fn classify_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_builder() {
        return ApiError::request(format!("request could not be dispatched: {error}"));
    }
    let code = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else {
        "network_error"
    };
    ApiError::Network { code: code.to_owned(), message: error.to_string() }
}

/// Non-2xx responses keep their body verbatim when it already speaks the
/// error shape; anything else gets a synthesized `http_<status>` body.
fn classify_status_error(
    status: u16,
    body: &[u8],
    headers: std::collections::BTreeMap<String, String>,
) -> ApiError {
    let body = serde_json::from_slice::<ErrorBody>(body)
        .unwrap_or_else(|_| ErrorBody::from_status(status));
    ApiError::Server { status, body, headers }
}

/// Deserialize a response body, treating an empty body as JSON `null` so
/// 204/205 responses deserialize into `()` and `Option<T>`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.is_empty() {
        return serde_json::from_value(Value::Null).map_err(|e| {
            ApiError::request(format!(
                "no-content response cannot deserialize into the requested type: {e}"
            ))
        });
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::request(format!("failed to parse response body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_reads_json() {
        let value: Vec<u64> = parse_body(b"[1,2,3]").unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn parse_body_treats_empty_as_null() {
        parse_body::<()>(b"").unwrap();
        let value: Option<u64> = parse_body(b"").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn parse_body_reports_malformed_json() {
        let result = parse_body::<Vec<u64>>(b"not json");
        assert!(matches!(result, Err(ApiError::Request { .. })));
    }

    #[test]
    fn status_classification_prefers_well_shaped_bodies() {
        let body = br#"{"code":"woocommerce_rest_invalid","message":"nope","data":{"status":404}}"#;
        match classify_status_error(404, body, Default::default()) {
            ApiError::Server { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body.code, "woocommerce_rest_invalid");
                assert_eq!(body.message, "nope");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn status_classification_synthesizes_for_opaque_bodies() {
        match classify_status_error(500, b"<html>boom</html>", Default::default()) {
            ApiError::Server { body, .. } => {
                assert_eq!(body.code, "http_500");
                assert_eq!(body.data.status, 500);
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }
}
