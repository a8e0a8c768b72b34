//! Request lifecycle hooks.

use async_trait::async_trait;

use super::context::RequestContext;
use super::response::ResponseParts;
use crate::error::ApiError;

/// Lifecycle hooks for one request.
///
/// All methods default to no-ops; implement the phases you care about.
/// Observers are awaited in sequence (per-call observer first, then each
/// global observer), so `on_request` may mutate outgoing headers with the
/// guarantee that the mutation lands before dispatch.
#[async_trait]
pub trait RequestObserver: Send + Sync {
    /// Loading-state transition; `true` before the request starts, `false`
    /// after it settles. The two calls always pair up.
    async fn on_loading(&self, _loading: bool) {}

    /// The request is about to be dispatched; the context is still mutable.
    async fn on_request(&self, _ctx: &mut RequestContext) {}

    /// A success response arrived.
    async fn on_response(&self, _parts: &ResponseParts) {}

    /// The request settled with a classified error.
    async fn on_error(&self, _error: &ApiError) {}

    /// A retryable failure occurred; the next attempt follows after the
    /// backoff delay. `attempt` is the 0-based index of the attempt that
    /// just failed.
    async fn on_retry(&self, _attempt: u32, _error: &ApiError, _ctx: &RequestContext) {}

    /// Runs on every settlement path, right before the final
    /// `on_loading(false)`.
    async fn on_finally(&self) {}
}
