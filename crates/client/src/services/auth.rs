//! Credential-based authentication flows.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::http::RequestOptions;
use crate::session::{AuthError, AuthenticatedClient, SessionTokens, TokenPair};

/// Tokens and profile facts returned by a successful login.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoginResponse {
    /// Access token for subsequent requests.
    pub access_token: String,
    /// Refresh token, when the backend issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access-token lifetime in seconds, when reported.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Login / refresh / logout against the custom auth endpoints.
pub struct AuthService {
    client: Arc<AuthenticatedClient>,
    session: Arc<SessionTokens>,
    login_path: String,
    revoke_path: String,
}

impl AuthService {
    /// Bind the resolved endpoint paths.
    pub fn new(
        client: Arc<AuthenticatedClient>,
        session: Arc<SessionTokens>,
        login_path: String,
        revoke_path: String,
    ) -> Self {
        Self { client, session, login_path, revoke_path }
    }

    /// Exchange credentials for a session.
    ///
    /// On success both token storages are updated together and
    /// `auth:changed(true)` is emitted.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = json!({ "username": username, "password": password });
        let response = self
            .client
            .pipeline()
            .post::<LoginResponse, Value>(&self.login_path, &body, RequestOptions::default())
            .await?;

        self.session
            .set_session(
                &response.data.access_token,
                response.data.refresh_token.as_deref(),
            )
            .await
            .map_err(|e| ApiError::request(format!("failed to persist session: {e}")))?;
        info!("login succeeded");
        Ok(response)
    }

    /// Run the single-flight refresh exchange directly.
    pub async fn refresh(&self) -> Result<TokenPair, AuthError> {
        self.client.refresh_session().await
    }

    /// Revoke the refresh token and clear the local session.
    ///
    /// The local session is cleared even when the revoke call fails — the
    /// caller asked to be logged out, and a dead backend must not keep the
    /// client authenticated.
    pub async fn logout(&self) -> ApiResult<Value> {
        let refresh_token = self.session.refresh_token().await.ok().flatten();
        let result = match refresh_token {
            Some(refresh_token) => {
                let body = json!({ "refresh_token": refresh_token });
                self.client
                    .pipeline()
                    .post::<Value, Value>(&self.revoke_path, &body, RequestOptions::default())
                    .await
            }
            None => {
                self.client
                    .pipeline()
                    .post::<Value, Value>(&self.revoke_path, &json!({}), RequestOptions::default())
                    .await
            }
        };

        if let Err(error) = &result {
            warn!(error = %error, "token revocation failed, clearing local session anyway");
        }
        self.session
            .clear_session()
            .await
            .map_err(|e| ApiError::request(format!("failed to clear session: {e}")))?;
        result
    }

    /// Whether an access token is currently stored.
    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }
}
