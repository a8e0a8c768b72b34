//! Bearer-token injection for store and custom endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};

use super::Interceptor;
use crate::error::ApiError;
use crate::http::RequestContext;
use woosdk_common::storage::TokenStorage;

/// Attaches `Authorization: Bearer <token>` to requests whose path falls
/// under one of the configured prefixes.
///
/// Admin paths are deliberately not in the prefix list: admin endpoints
/// authenticate with consumer credentials, and sending the user's access
/// token there would leak it to the wrong API surface.
pub struct BearerTokenInterceptor {
    storage: Arc<dyn TokenStorage>,
    prefixes: Vec<String>,
    disabled: bool,
}

impl BearerTokenInterceptor {
    /// `prefixes` are the path prefixes the token may travel to.
    pub fn new(storage: Arc<dyn TokenStorage>, prefixes: Vec<String>, disabled: bool) -> Self {
        Self { storage, prefixes, disabled }
    }
}

#[async_trait]
impl Interceptor for BearerTokenInterceptor {
    async fn before_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        if self.disabled || ctx.headers.contains_key(AUTHORIZATION) {
            return Ok(());
        }
        if !self.prefixes.iter().any(|prefix| ctx.path.starts_with(prefix.as_str())) {
            return Ok(());
        }
        let token = self
            .storage
            .get()
            .await
            .map_err(|e| ApiError::request(format!("access token storage failure: {e}")))?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                ApiError::request(format!("stored access token is not a valid header value: {e}"))
            })?;
            ctx.headers.insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}
