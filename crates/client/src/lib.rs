//! Typed client SDK core for WooCommerce-style REST APIs.
//!
//! The crate is organized around one HTTP request pipeline and the session
//! machinery that feeds it:
//!
//! ```text
//! ┌─────────┐    ┌──────────────────┐    ┌──────────────────────┐
//! │   Sdk   │───►│ AuthenticatedCli │───►│     HttpPipeline     │
//! └────┬────┘    │ (401 → refresh)  │    │ hooks + interceptors │
//!      │         └────────┬─────────┘    │ + bounded retry      │
//!      │                  │              └──────────┬───────────┘
//!      │         ┌────────▼─────────┐               │
//!      │         │RefreshCoordinator│        ┌──────▼───────┐
//!      │         │  (single-flight) │        │   reqwest    │
//!      │         └──────────────────┘        └──────────────┘
//!      │
//!      ├──► services: auth / store / admin (thin CRUD passthroughs)
//!      ├──► SessionTokens (access / refresh / nonce / cart storages)
//!      └──► EventBus (auth:changed, nonce:changed, ...)
//! ```
//!
//! - [`http`]: the request pipeline — lifecycle hooks, retry with backoff,
//!   and three-way error classification
//! - [`interceptors`]: header injection and session-header capture
//! - [`session`]: token grouping and the single-flight refresh coordinator
//! - [`pagination`]: header-driven pagination and the full-collection walk
//! - [`services`]: thin typed wrappers over the pipeline verbs
//! - [`sdk`]: the facade wiring everything together

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod error;
pub mod http;
pub mod interceptors;
pub mod pagination;
pub mod sdk;
pub mod services;
pub mod session;

// Re-export the types most integrations touch.
pub use config::{
    AdminConfig, ApiKeyConfig, ApiPrefixes, AuthConfig, CartTokenConfig, ConfigError,
    NonceConfig, RequestConfig, RetryOptions, SdkConfig,
};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use http::{ApiResponse, HttpPipeline, RequestContext, RequestObserver, RequestOptions};
pub use pagination::{PagedRequest, Pagination, WalkOptions, WalkOutcome};
pub use sdk::{Sdk, SdkBuilder};
pub use session::{AuthError, RefreshCoordinator, SessionTokens, TokenPair};

// Re-export the shared infrastructure crate so integrations need only one
// dependency.
pub use woosdk_common as common;
