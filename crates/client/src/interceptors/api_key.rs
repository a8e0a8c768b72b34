//! Fixed API-key header.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

use super::Interceptor;
use crate::config::{ApiKeyConfig, ConfigError};
use crate::error::ApiError;
use crate::http::RequestContext;

/// Attaches a fixed `x-api-key` (or configured) header to every request.
pub struct ApiKeyInterceptor {
    config: ApiKeyConfig,
    header: HeaderName,
}

impl ApiKeyInterceptor {
    /// Build the interceptor; fails when the configured header name is not a
    /// valid HTTP header.
    pub fn new(config: ApiKeyConfig) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(config.header.as_bytes()).map_err(|e| {
            ConfigError::InvalidHeader { name: config.header.clone(), reason: e.to_string() }
        })?;
        Ok(Self { config, header })
    }
}

#[async_trait]
impl Interceptor for ApiKeyInterceptor {
    async fn before_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        if self.config.disabled {
            return Ok(());
        }
        let Some(key) = &self.config.key else {
            return Ok(());
        };
        let value = HeaderValue::from_str(key)
            .map_err(|e| ApiError::request(format!("api key is not a valid header value: {e}")))?;
        ctx.headers.insert(self.header.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use url::Url;

    use super::*;

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

    #[tokio::test]
    async fn attaches_key_on_every_surface() {
        let interceptor = ApiKeyInterceptor::new(ApiKeyConfig {
            disabled: false,
            key: Some("secret-key".to_owned()),
            header: "x-api-key".to_owned(),
        })
        .unwrap();

        for path in ["/wp-json/wc/store/v1/cart", "/wp-json/wc/v3/orders", "/wp-json/woosdk/v1/auth"] {
            let mut ctx = context(path);
            interceptor.before_request(&mut ctx).await.unwrap();
            assert_eq!(
                ctx.headers.get("x-api-key").unwrap().to_str().unwrap(),
                "secret-key"
            );
        }
    }

    #[tokio::test]
    async fn missing_key_attaches_nothing() {
        let interceptor = ApiKeyInterceptor::new(ApiKeyConfig::default()).unwrap();
        let mut ctx = context("/wp-json/wc/store/v1/cart");
        interceptor.before_request(&mut ctx).await.unwrap();
        assert!(ctx.headers.get("x-api-key").is_none());
    }
}
