//! Consumer-credential basic auth for admin endpoints.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderValue, AUTHORIZATION};

use super::Interceptor;
use crate::config::AdminConfig;
use crate::error::ApiError;
use crate::http::RequestContext;

/// Attaches `Authorization: Basic base64(key:secret)` to admin-REST
/// requests when consumer credentials are configured.
///
/// Only paths under the admin prefix are touched; store and custom
/// endpoints never see the consumer credentials.
pub struct AdminAuthInterceptor {
    config: AdminConfig,
    admin_prefix: String,
}

impl AdminAuthInterceptor {
    /// `admin_prefix` is the admin-API path prefix the credentials apply to.
    pub fn new(config: AdminConfig, admin_prefix: String) -> Self {
        Self { config, admin_prefix }
    }
}

#[async_trait]
impl Interceptor for AdminAuthInterceptor {
    async fn before_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        if !self.config.is_configured() || ctx.headers.contains_key(AUTHORIZATION) {
            return Ok(());
        }
        if !ctx.path.starts_with(self.admin_prefix.as_str()) {
            return Ok(());
        }
        let (Some(key), Some(secret)) =
            (&self.config.consumer_key, &self.config.consumer_secret)
        else {
            return Ok(());
        };
        let encoded = STANDARD.encode(format!("{key}:{secret}"));
        let value = HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|e| {
            ApiError::request(format!("consumer credentials are not header-safe: {e}"))
        })?;
        ctx.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
