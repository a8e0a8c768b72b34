//! Cart-token attachment and capture.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::Interceptor;
use crate::config::{CartTokenConfig, ConfigError};
use crate::error::ApiError;
use crate::http::{RequestContext, ResponseParts};
use woosdk_common::events::{EventBus, SdkEvent};
use woosdk_common::storage::TokenStorage;

/// Attaches the stored cart token to outgoing requests and persists rotated
/// tokens from response headers, emitting `cart:token:changed` on rotation.
///
/// The store API issues a cart token on the first cart interaction; once
/// captured it identifies the guest cart across requests.
pub struct CartTokenInterceptor {
    config: CartTokenConfig,
    header: HeaderName,
    storage: Arc<dyn TokenStorage>,
    events: EventBus,
    bootstrap: Option<(Client, Url)>,
}

impl CartTokenInterceptor {
    /// Build the interceptor; fails when the configured header name is not a
    /// valid HTTP header.
    pub fn new(
        config: CartTokenConfig,
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
            .map_err(|e| ApiError::request(format!("cart token storage failure: {e}")))?;
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
                debug!(error = %error, "cart token bootstrap fetch failed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Interceptor for CartTokenInterceptor {
    async fn before_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        if self.config.disabled || ctx.headers.contains_key(&self.header) {
            return Ok(());
        }
        if let Some(token) = self.current_or_bootstrapped().await? {
            let value = HeaderValue::from_str(&token).map_err(|e| {
                ApiError::request(format!("stored cart token is not a valid header value: {e}"))
            })?;
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
            debug!("cart token rotated by server");
            self.events.emit(&SdkEvent::CartTokenChanged { token: received.to_owned() });
        }
    }
}
