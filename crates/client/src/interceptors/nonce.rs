//! Store-API nonce attachment and capture.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::Interceptor;
use crate::config::{ConfigError, NonceConfig};
use crate::error::ApiError;
use crate::http::{RequestContext, ResponseParts};
use woosdk_common::events::{EventBus, SdkEvent};
use woosdk_common::storage::TokenStorage;

/// Attaches the stored nonce to outgoing requests and persists rotated
/// nonces from response headers, emitting `nonce:changed` on rotation.
///
/// When no nonce is stored yet and a bootstrap endpoint is configured, one
/// bare fetch (bypassing the interceptor chain, so no recursion) seeds the
/// store.
pub struct NonceInterceptor {
    config: NonceConfig,
    header: HeaderName,
    storage: Arc<dyn TokenStorage>,
    events: EventBus,
    bootstrap: Option<(Client, Url)>,
}

impl NonceInterceptor {
    /// Build the interceptor; fails when the configured header name is not a
    /// valid HTTP header.
    pub fn new(
        config: NonceConfig,
        storage: Arc<dyn TokenStorage>,
        events: EventBus,
        bootstrap: Option<(Client, Url)>,
    ) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(config.header.as_bytes()).map_err(|e| {
            ConfigError::InvalidHeader { name: config.header.clone(), reason: e.to_string() }
        })?;
        Ok(Self { config, header, storage, events, bootstrap })
    }

    async fn current_or_bootstrapped(&self) -> Result<Option<String>, ApiError> {
        let stored = self
            .storage
            .get()
            .await
            .map_err(|e| ApiError::request(format!("nonce storage failure: {e}")))?;
        if stored.is_some() {
            return Ok(stored);
        }

        let Some((client, url)) = &self.bootstrap else {
            return Ok(None);
        };
        match client.get(url.clone()).send().await {
            Ok(response) => {
                let value = response
                    .headers()
                    .get(&self.header)
                    .and_then(|v| v.to_str().ok())
                    .map(ToOwned::to_owned);
                if let Some(value) = &value {
                    let _ = self.storage.set(value).await;
                }
                Ok(value)
            }
            Err(error) => {
                debug!(error = %error, "nonce bootstrap fetch failed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Interceptor for NonceInterceptor {
    async fn before_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        if self.config.disabled || ctx.headers.contains_key(&self.header) {
            return Ok(());
        }
        if let Some(nonce) = self.current_or_bootstrapped().await? {
            let value = HeaderValue::from_str(&nonce)
                .map_err(|e| ApiError::request(format!("stored nonce is not a valid header value: {e}")))?;
            ctx.headers.insert(self.header.clone(), value);
        }
        Ok(())
    }

    async fn after_response(&self, _ctx: &RequestContext, parts: &ResponseParts) {
        if self.config.disabled {
            return;
        }
        let Some(received) = parts.header(self.header.as_str()) else {
            return;
        };
        let current = self.storage.get().await.ok().flatten();
        if current.as_deref() == Some(received) {
            return;
        }
        if self.storage.set(received).await.is_ok() {
            debug!("nonce rotated by server");
            self.events.emit(&SdkEvent::NonceChanged { nonce: received.to_owned() });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::Method;

    use super::*;
    use woosdk_common::storage::MemoryStorage;

    fn context(path: &str) -> RequestContext {
        RequestContext {
            method: Method::GET,
            url: Url::parse(&format!("https://shop.example.com{path}")).unwrap(),
            path: path.to_owned(),
            headers: Default::default(),
            body: None,
            attempt: 0,
        }
    }

    fn parts_with_nonce(value: &str) -> ResponseParts {
        let mut headers = std::collections::BTreeMap::new();
        headers.insert("nonce".to_owned(), value.to_owned());
        ResponseParts { status: 200, headers }
    }

    #[tokio::test]
    async fn attaches_stored_nonce() {
        let storage = Arc::new(MemoryStorage::with_value("abc123"));
        let interceptor =
            NonceInterceptor::new(NonceConfig::default(), storage, EventBus::new(), None).unwrap();

        let mut ctx = context("/wp-json/wc/store/v1/cart");
        interceptor.before_request(&mut ctx).await.unwrap();
        assert_eq!(ctx.headers.get("nonce").unwrap().to_str().unwrap(), "abc123");
    }

    #[tokio::test]
    async fn attaches_nothing_without_stored_nonce() {
        let storage = Arc::new(MemoryStorage::new());
        let interceptor =
            NonceInterceptor::new(NonceConfig::default(), storage, EventBus::new(), None).unwrap();

        let mut ctx = context("/wp-json/wc/store/v1/cart");
        interceptor.before_request(&mut ctx).await.unwrap();
        assert!(ctx.headers.get("nonce").is_none());
    }

    #[tokio::test]
    async fn disabled_section_is_a_passthrough() {
        let storage = Arc::new(MemoryStorage::with_value("abc123"));
        let config = NonceConfig { disabled: true, ..NonceConfig::default() };
        let interceptor =
            NonceInterceptor::new(config, storage, EventBus::new(), None).unwrap();

        let mut ctx = context("/wp-json/wc/store/v1/cart");
        interceptor.before_request(&mut ctx).await.unwrap();
        assert!(ctx.headers.get("nonce").is_none());
    }

    #[tokio::test]
    async fn rotated_nonce_is_persisted_and_announced() {
        let storage = Arc::new(MemoryStorage::with_value("old"));
        let events = EventBus::new();
        let rotations = Arc::new(AtomicUsize::new(0));
        let _sub = {
            let rotations = Arc::clone(&rotations);
            events.on("nonce:changed", move |event| {
                if let SdkEvent::NonceChanged { nonce } = event {
                    assert_eq!(nonce, "new");
                    rotations.fetch_add(1, Ordering::SeqCst);
                }
            })
        };
        let interceptor = NonceInterceptor::new(
            NonceConfig::default(),
            Arc::clone(&storage) as Arc<dyn TokenStorage>,
            events,
            None,
        )
        .unwrap();

        let ctx = context("/wp-json/wc/store/v1/cart");
        interceptor.after_response(&ctx, &parts_with_nonce("new")).await;
        assert_eq!(storage.get().await.unwrap(), Some("new".to_owned()));
        assert_eq!(rotations.load(Ordering::SeqCst), 1);

        // An unchanged nonce is not re-announced.
        interceptor.after_response(&ctx, &parts_with_nonce("new")).await;
        assert_eq!(rotations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_header_names_fail_fast() {
        let config = NonceConfig { header: "bad header\n".to_owned(), ..NonceConfig::default() };
        let result = NonceInterceptor::new(
            config,
            Arc::new(MemoryStorage::new()),
            EventBus::new(),
            None,
        );
        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
    }
}
