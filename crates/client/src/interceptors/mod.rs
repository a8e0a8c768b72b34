//! Request/response interceptors
//!
//! Interceptors are registered on the pipeline once, at SDK initialization,
//! and run for every request: the request phase may mutate outgoing headers
//! (credential injection), the response phase reacts to session-affecting
//! response headers (nonce and cart-token rotation).
//!
//! Credential interceptors are conditional on URL path prefixes — the bearer
//! token only travels to store/custom endpoints and the admin basic-auth
//! only to admin endpoints, so neither credential ever leaks to the other
//! API surface. Every interceptor collapses to a passthrough when its
//! configuration section is disabled.

mod admin_auth;
mod api_key;
mod bearer;
mod cart_token;
mod nonce;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{RequestContext, ResponseParts};

pub use admin_auth::AdminAuthInterceptor;
pub use api_key::ApiKeyInterceptor;
pub use bearer::BearerTokenInterceptor;
pub use cart_token::CartTokenInterceptor;
pub use nonce::NonceInterceptor;

/// One request/response interception pair.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Mutate the outgoing request. Runs once per logical request, before
    /// the retry loop. Returning an error aborts dispatch with a classified
    /// failure.
    async fn before_request(&self, ctx: &mut RequestContext) -> Result<(), ApiError>;

    /// React to a received response (success or rejected). Defaults to a
    /// no-op.
    async fn after_response(&self, _ctx: &RequestContext, _parts: &ResponseParts) {}
}
