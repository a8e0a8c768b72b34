//! The SDK facade.
//!
//! [`SdkBuilder`] collects configuration and injected collaborators
//! (storages, observers, an external bus), validates them fail-fast, and
//! produces an [`Sdk`]. The transport context — one `reqwest::Client` plus
//! the interceptor chain — is created exactly once per instance on first
//! use and reused by reference thereafter; repeated initialization is
//! idempotent, with the first successful configuration winning. Two `Sdk`
//! values in one process are fully independent: nothing here is global.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::{
    AdminConfig, ApiKeyConfig, ApiPrefixes, AuthConfig, CartTokenConfig, ConfigError,
    NonceConfig, RetryOptions, SdkConfig,
};
use crate::http::{HttpPipeline, RequestObserver};
use crate::interceptors::{
    AdminAuthInterceptor, ApiKeyInterceptor, BearerTokenInterceptor, CartTokenInterceptor,
    Interceptor, NonceInterceptor,
};
use crate::services::{AdminApi, AuthService, StoreApi};
use crate::session::{AuthenticatedClient, RefreshCoordinator, SessionTokens};
use woosdk_common::events::EventBus;
use woosdk_common::storage::{MemoryStorage, TokenStorage};

/// The assembled transport context: created once, reused by reference.
struct SdkContext {
    pipeline: Arc<HttpPipeline>,
    client: Arc<AuthenticatedClient>,
}

/// One SDK instance for one site.
pub struct Sdk {
    config: Arc<SdkConfig>,
    events: EventBus,
    session: Arc<SessionTokens>,
    coordinator: Arc<RefreshCoordinator>,
    observers: Vec<Arc<dyn RequestObserver>>,
    context: OnceCell<SdkContext>,
}

impl Sdk {
    /// Start configuring an instance for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> SdkBuilder {
        SdkBuilder::new(base_url)
    }

    /// Eagerly build the transport context.
    ///
    /// Optional — the context is built on first use either way — and
    /// idempotent: calling `init` (or any accessor) again observes the
    /// context built first.
    pub fn init(&self) -> Result<(), ConfigError> {
        self.context().map(|_| ())
    }

    /// The resolved configuration.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The instance's event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The session credential group.
    pub fn session(&self) -> &Arc<SessionTokens> {
        &self.session
    }

    /// The single-flight refresh coordinator.
    pub fn refresh_coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// The request pipeline. Every call returns the same instance.
    pub fn http(&self) -> Result<Arc<HttpPipeline>, ConfigError> {
        Ok(Arc::clone(&self.context()?.pipeline))
    }

    /// The refresh-aware client the service groups run on.
    pub fn client(&self) -> Result<Arc<AuthenticatedClient>, ConfigError> {
        Ok(Arc::clone(&self.context()?.client))
    }

    /// Authentication flows (login / refresh / logout).
    pub fn auth(&self) -> Result<AuthService, ConfigError> {
        let context = self.context()?;
        let prefixes = &self.config.prefixes;
        Ok(AuthService::new(
            Arc::clone(&context.client),
            Arc::clone(&self.session),
            format!("{}{}", prefixes.custom, self.config.auth.login_path),
            format!("{}{}", prefixes.custom, self.config.auth.revoke_path),
        ))
    }

    /// Store-API services (catalog, cart).
    pub fn store(&self) -> Result<StoreApi, ConfigError> {
        let context = self.context()?;
        Ok(StoreApi::new(Arc::clone(&context.client), self.config.prefixes.store.clone()))
    }

    /// Admin-API services (consumer-key CRUD).
    pub fn admin(&self) -> Result<AdminApi, ConfigError> {
        let context = self.context()?;
        Ok(AdminApi::new(Arc::clone(&context.client), self.config.prefixes.admin.clone()))
    }

    fn context(&self) -> Result<&SdkContext, ConfigError> {
        self.context.get_or_try_init(|| self.build_context())
    }

    fn build_context(&self) -> Result<SdkContext, ConfigError> {
        let mut builder = reqwest::Client::builder().timeout(self.config.request.timeout);
        if let Some(user_agent) = &self.config.request.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().map_err(|e| ConfigError::Transport(e.to_string()))?;

        let prefixes = &self.config.prefixes;
        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();

        interceptors.push(Arc::new(ApiKeyInterceptor::new(self.config.api_key.clone())?));

        let nonce_bootstrap = match &self.config.nonce.endpoint {
            Some(endpoint) => Some((client.clone(), self.config.url_for(endpoint)?)),
            None => None,
        };
        interceptors.push(Arc::new(NonceInterceptor::new(
            self.config.nonce.clone(),
            self.session.nonce_storage(),
            self.events.clone(),
            nonce_bootstrap,
        )?));

        let cart_bootstrap = match &self.config.cart_token.endpoint {
            Some(endpoint) => Some((client.clone(), self.config.url_for(endpoint)?)),
            None => None,
        };
        interceptors.push(Arc::new(CartTokenInterceptor::new(
            self.config.cart_token.clone(),
            self.session.cart_storage(),
            self.events.clone(),
            cart_bootstrap,
        )?));

        interceptors.push(Arc::new(BearerTokenInterceptor::new(
            self.session.access_storage(),
            vec![prefixes.store.clone(), prefixes.custom.clone()],
            self.config.auth.disabled,
        )));

        interceptors.push(Arc::new(AdminAuthInterceptor::new(
            self.config.admin.clone(),
            prefixes.admin.clone(),
        )));

        let pipeline = Arc::new(HttpPipeline::new(
            client,
            Arc::clone(&self.config),
            interceptors,
            self.observers.clone(),
            self.events.clone(),
        ));

        let refresh_path = format!("{}{}", prefixes.custom, self.config.auth.refresh_path);
        let authenticated = Arc::new(AuthenticatedClient::new(
            Arc::clone(&pipeline),
            Arc::clone(&self.session),
            Arc::clone(&self.coordinator),
            refresh_path,
            !self.config.auth.disabled,
        ));

        info!(base_url = %self.config.base_url, "sdk transport initialized");
        Ok(SdkContext { pipeline, client: authenticated })
    }
}

/// Configuration collector for [`Sdk`].
pub struct SdkBuilder {
    config: SdkConfig,
    access_storage: Option<Arc<dyn TokenStorage>>,
    refresh_storage: Option<Arc<dyn TokenStorage>>,
    nonce_storage: Option<Arc<dyn TokenStorage>>,
    cart_storage: Option<Arc<dyn TokenStorage>>,
    observers: Vec<Arc<dyn RequestObserver>>,
    events: Option<EventBus>,
}

impl SdkBuilder {
    /// Start from a base URL and defaults everywhere else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_config(SdkConfig::new(base_url))
    }

    /// Start from a prepared configuration.
    pub fn from_config(config: SdkConfig) -> Self {
        Self {
            config,
            access_storage: None,
            refresh_storage: None,
            nonce_storage: None,
            cart_storage: None,
            observers: Vec::new(),
            events: None,
        }
    }

    /// Replace the API path prefixes.
    pub fn prefixes(mut self, prefixes: ApiPrefixes) -> Self {
        self.config.prefixes = prefixes;
        self
    }

    /// Replace the auth section.
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Replace the nonce section.
    pub fn nonce(mut self, nonce: NonceConfig) -> Self {
        self.config.nonce = nonce;
        self
    }

    /// Replace the cart-token section.
    pub fn cart_token(mut self, cart_token: CartTokenConfig) -> Self {
        self.config.cart_token = cart_token;
        self
    }

    /// Set admin consumer credentials.
    pub fn admin_credentials(
        mut self,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        self.config.admin = AdminConfig {
            disabled: false,
            consumer_key: Some(consumer_key.into()),
            consumer_secret: Some(consumer_secret.into()),
        };
        self
    }

    /// Set a fixed API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = ApiKeyConfig { key: Some(key.into()), ..ApiKeyConfig::default() };
        self
    }

    /// Transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request.timeout = timeout;
        self
    }

    /// User-Agent override.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.request.user_agent = Some(user_agent.into());
        self
    }

    /// Retry behavior.
    pub fn retry(mut self, retry: RetryOptions) -> Self {
        self.config.request.retry = retry;
        self
    }

    /// Storage backing the access token.
    pub fn access_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.access_storage = Some(storage);
        self
    }

    /// Storage backing the refresh token.
    pub fn refresh_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.refresh_storage = Some(storage);
        self
    }

    /// Storage backing the nonce.
    pub fn nonce_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.nonce_storage = Some(storage);
        self
    }

    /// Storage backing the cart token.
    pub fn cart_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.cart_storage = Some(storage);
        self
    }

    /// Register a global lifecycle observer.
    pub fn observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Use an externally-owned event bus (e.g. a scoped view of an
    /// application-wide bus).
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate and assemble the instance.
    ///
    /// Fails fast on configuration that can never work; the transport
    /// itself is built lazily on first use (or eagerly via [`Sdk::init`]).
    pub fn build(self) -> Result<Sdk, ConfigError> {
        self.config.validate()?;

        let events = self.events.unwrap_or_default();
        let session = SessionTokens::new(
            self.access_storage.unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            self.refresh_storage.unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            self.nonce_storage.unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            self.cart_storage.unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            events.clone(),
        );

        Ok(Sdk {
            config: Arc::new(self.config),
            events,
            session: Arc::new(session),
            coordinator: Arc::new(RefreshCoordinator::new()),
            observers: self.observers,
            context: OnceCell::new(),
        })
    }
}
