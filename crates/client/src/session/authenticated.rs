//! Pipeline wrapper that recovers from expired access tokens.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::refresh::{AuthError, RefreshCoordinator, TokenPair};
use super::tokens::SessionTokens;
use crate::error::ApiResult;
use crate::http::{HttpPipeline, RequestOptions};
use woosdk_common::events::SdkEvent;

/// Executes requests through the pipeline and, on a 401 with refresh
/// configured, runs the single-flight refresh and replays the request once.
///
/// The replay is a fresh logical request, so the bearer interceptor re-reads
/// storage and picks up the refreshed token. When the refresh itself fails
/// the original 401 is surfaced unchanged and the session storages are left
/// untouched.
pub struct AuthenticatedClient {
    pipeline: Arc<HttpPipeline>,
    session: Arc<SessionTokens>,
    coordinator: Arc<RefreshCoordinator>,
    refresh_path: String,
    recovery_enabled: bool,
}

impl AuthenticatedClient {
    /// Wire the wrapper. `refresh_path` is the full refresh-endpoint path;
    /// `recovery_enabled` is false when the auth section is disabled.
    pub fn new(
        pipeline: Arc<HttpPipeline>,
        session: Arc<SessionTokens>,
        coordinator: Arc<RefreshCoordinator>,
        refresh_path: String,
        recovery_enabled: bool,
    ) -> Self {
        Self { pipeline, session, coordinator, refresh_path, recovery_enabled }
    }

    /// The wrapped pipeline.
    pub fn pipeline(&self) -> &Arc<HttpPipeline> {
        &self.pipeline
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &Arc<SessionTokens> {
        &self.session
    }

    /// The refresh coordinator (exposed for state inspection).
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Execute a request with 401-triggered refresh-and-replay.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let first = self
            .pipeline
            .request(method.clone(), path, body.clone(), options.clone())
            .await;

        let Err(error) = &first else {
            return first;
        };
        if !self.recovery_enabled || !error.is_auth_error() {
            return first;
        }
        if !matches!(self.session.refresh_token().await, Ok(Some(_))) {
            return first;
        }

        debug!(path, "access token rejected, attempting refresh");
        match self.refresh_session().await {
            Ok(_) => self.pipeline.request(method, path, body, options).await,
            Err(refresh_error) => {
                debug!(error = %refresh_error, "refresh failed, surfacing original rejection");
                first
            }
        }
    }

    /// Run the single-flight refresh exchange.
    ///
    /// On success both session tokens are updated together and
    /// `auth:refreshed` is emitted; on failure the storages are untouched
    /// and `auth:changed(false)` announces that re-authentication is
    /// required.
    pub async fn refresh_session(&self) -> Result<TokenPair, AuthError> {
        let pipeline = Arc::clone(&self.pipeline);
        let session = Arc::clone(&self.session);
        let refresh_path = self.refresh_path.clone();

        let result = self
            .coordinator
            .refresh(move || async move {
                let refresh_token = session
                    .refresh_token()
                    .await
                    .map_err(|e| AuthError::Storage(e.to_string()))?
                    .ok_or(AuthError::NoRefreshToken)?;

                let body = serde_json::json!({ "refresh_token": refresh_token });
                let response = pipeline
                    .post::<TokenPair, Value>(&refresh_path, &body, RequestOptions::default())
                    .await
                    .map_err(AuthError::from)?;

                let pair = response.data;
                session
                    .set_session(&pair.access_token, pair.refresh_token.as_deref())
                    .await
                    .map_err(|e| AuthError::Storage(e.to_string()))?;
                session.events().emit(&SdkEvent::TokensRefreshed);
                Ok(pair)
            })
            .await;

        if result.is_err() {
            self.session
                .events()
                .emit(&SdkEvent::AuthChanged { authenticated: false });
        }
        result
    }
}
