//! Resilience building blocks
//!
//! Generic retry primitives shared by the HTTP layer: backoff strategies for
//! computing inter-attempt delays, and the [`RetryPolicy`] trait that decides
//! whether a failed attempt is worth repeating. The HTTP pipeline owns the
//! actual retry loop because it interleaves lifecycle hooks between
//! attempts; this module stays free of any transport knowledge.

pub mod retry;

pub use retry::{
    policies, BackoffStrategy, RetryDecision, RetryPolicy,
};
