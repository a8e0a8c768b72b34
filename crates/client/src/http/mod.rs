//! HTTP request pipeline
//!
//! One [`HttpPipeline`] executes one logical request: it builds a
//! [`RequestContext`], runs the lifecycle hooks and interceptor chain,
//! dispatches through `reqwest` with bounded retry, and classifies failures
//! into the three-kind taxonomy in [`crate::error`].
//!
//! Hook ordering is deterministic: for every lifecycle phase the per-call
//! observer runs first, then each globally-registered observer, and all of
//! them are awaited in sequence — a hook that mutates outgoing headers is
//! guaranteed to complete before dispatch. `on_finally` and
//! `on_loading(false)` run on every exit path, success or failure, so
//! loading-state transitions always pair up.

mod context;
mod observer;
mod pipeline;
mod response;
mod retry;

pub use context::{RequestContext, RequestOptions};
pub use observer::RequestObserver;
pub use pipeline::HttpPipeline;
pub use response::{ApiResponse, ResponseParts};
