//! SDK configuration.
//!
//! Every section is optional from the caller's point of view: `Default`
//! impls carry the documented defaults, and feature sections carry a
//! `disabled` flag that turns the matching interceptor into a passthrough.
//! Plain-data sections are serde-friendly; anything holding durations or
//! closures is configured through [`SdkBuilder`](crate::sdk::SdkBuilder)
//! setters instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;
use woosdk_common::resilience::BackoffStrategy;

/// Configuration problems detected at build or first-use time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL did not parse.
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl {
        /// The offending value.
        url: String,
        /// Parser diagnostics.
        reason: String,
    },
    /// A section was enabled without its required values.
    #[error("incomplete configuration: {0}")]
    Incomplete(String),
    /// A configured header name is not a valid HTTP header.
    #[error("invalid header name `{name}`: {reason}")]
    InvalidHeader {
        /// The offending name.
        name: String,
        /// Parser diagnostics.
        reason: String,
    },
    /// The HTTP transport could not be constructed.
    #[error("failed to build http transport: {0}")]
    Transport(String),
}

/// Path prefixes of the three API surfaces the SDK talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiPrefixes {
    /// Store API (cart, checkout, public catalog).
    pub store: String,
    /// Admin REST API (consumer-key authenticated).
    pub admin: String,
    /// Custom endpoints (auth, extensions).
    pub custom: String,
}

impl Default for ApiPrefixes {
    fn default() -> Self {
        Self {
            store: "/wp-json/wc/store/v1".to_owned(),
            admin: "/wp-json/wc/v3".to_owned(),
            custom: "/wp-json/woosdk/v1".to_owned(),
        }
    }
}

/// Token-based authentication endpoints, resolved under the custom prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// Disables bearer injection and 401-triggered refresh entirely.
    pub disabled: bool,
    /// Login endpoint path.
    pub login_path: String,
    /// Refresh-token exchange endpoint path.
    pub refresh_path: String,
    /// Token revocation endpoint path.
    pub revoke_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            login_path: "/auth".to_owned(),
            refresh_path: "/auth/refresh".to_owned(),
            revoke_path: "/auth/revoke".to_owned(),
        }
    }
}

/// Store-API nonce handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NonceConfig {
    /// Disables nonce attachment and capture.
    pub disabled: bool,
    /// Header the nonce travels in, both directions.
    pub header: String,
    /// Endpoint fetched once to bootstrap a nonce when none is stored.
    pub endpoint: Option<String>,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self { disabled: false, header: "nonce".to_owned(), endpoint: None }
    }
}

/// Cart-token handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CartTokenConfig {
    /// Disables cart-token attachment and capture.
    pub disabled: bool,
    /// Header the cart token travels in, both directions.
    pub header: String,
    /// Endpoint fetched once to bootstrap a token when none is stored.
    pub endpoint: Option<String>,
}

impl Default for CartTokenConfig {
    fn default() -> Self {
        Self { disabled: false, header: "cart-token".to_owned(), endpoint: None }
    }
}

/// Admin REST API consumer credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminConfig {
    /// Disables basic-auth injection even when credentials are present.
    pub disabled: bool,
    /// Consumer key (`ck_...`).
    pub consumer_key: Option<String>,
    /// Consumer secret (`cs_...`).
    pub consumer_secret: Option<String>,
}

impl AdminConfig {
    /// Whether basic-auth injection is active.
    pub fn is_configured(&self) -> bool {
        !self.disabled && self.consumer_key.is_some() && self.consumer_secret.is_some()
    }
}

/// Fixed API-key header attached to every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiKeyConfig {
    /// Disables the header even when a key is present.
    pub disabled: bool,
    /// The key value; nothing is attached while `None`.
    pub key: Option<String>,
    /// Header name.
    pub header: String,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self { disabled: false, key: None, header: "x-api-key".to_owned() }
    }
}

/// Custom retry predicate: `(error, attempt) -> keep retrying?`
pub type RetryPredicate = Arc<dyn Fn(&ApiError, u32) -> bool + Send + Sync>;

/// Bounded-retry behavior of the request pipeline.
#[derive(Clone)]
pub struct RetryOptions {
    /// Master switch; a disabled pipeline performs a single attempt.
    pub enabled: bool,
    /// Retries after the initial attempt (`3` means up to 4 attempts).
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: BackoffStrategy,
    /// Response statuses worth retrying.
    pub retryable_statuses: Vec<u16>,
    /// Methods whose status-based failures may be retried. Deliberately
    /// excludes POST and PATCH so side-effecting calls are never duplicated
    /// on an ambiguous failure. Pure network failures retry regardless.
    pub retryable_methods: Vec<Method>,
    /// Extra gate consulted for every candidate retry.
    pub predicate: Option<RetryPredicate>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: 3,
            backoff: BackoffStrategy::default(),
            retryable_statuses: vec![408, 429, 500, 502, 503, 504],
            retryable_methods: vec![
                Method::GET,
                Method::HEAD,
                Method::OPTIONS,
                Method::PUT,
                Method::DELETE,
            ],
            predicate: None,
        }
    }
}

impl RetryOptions {
    /// Enabled options with the documented defaults.
    pub fn enabled() -> Self {
        Self { enabled: true, ..Self::default() }
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("enabled", &self.enabled)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .field("retryable_statuses", &self.retryable_statuses)
            .field("retryable_methods", &self.retryable_methods)
            .field("predicate", &self.predicate.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

/// Transport-level request defaults.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Passed through to the transport; the pipeline adds no timeout of its
    /// own.
    pub timeout: Duration,
    /// Optional User-Agent override.
    pub user_agent: Option<String>,
    /// Retry behavior.
    pub retry: RetryOptions,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            retry: RetryOptions::default(),
        }
    }
}

/// Complete SDK configuration.
#[derive(Debug, Clone, Default)]
pub struct SdkConfig {
    /// Site root, e.g. `https://shop.example.com`.
    pub base_url: String,
    /// API surface prefixes.
    pub prefixes: ApiPrefixes,
    /// Token-auth section.
    pub auth: AuthConfig,
    /// Nonce section.
    pub nonce: NonceConfig,
    /// Cart-token section.
    pub cart_token: CartTokenConfig,
    /// Admin-credentials section.
    pub admin: AdminConfig,
    /// API-key section.
    pub api_key: ApiKeyConfig,
    /// Transport and retry defaults.
    pub request: RequestConfig,
}

impl SdkConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Join `path` onto the base URL.
    pub fn url_for(&self, path: &str) -> Result<url::Url, ConfigError> {
        let base = url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        base.join(path).map_err(|e| ConfigError::InvalidBaseUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }

    /// Fail fast on values that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if self.admin.consumer_key.is_some() != self.admin.consumer_secret.is_some() {
            return Err(ConfigError::Incomplete(
                "admin consumer_key and consumer_secret must be configured together".to_owned(),
            ));
        }
        Ok(())
    }
}
