//! Retry decisions and backoff delay computation.
//!
//! A retry loop built on these pieces asks its [`RetryPolicy`] whether the
//! last error warrants another attempt, then sleeps for the delay produced
//! by its [`BackoffStrategy`]. Policies are generic over the error type so
//! transport-specific predicates live with the transport, not here.

use std::time::Duration;

/// How long to wait before retry attempt `attempt` (0-based).
#[derive(Debug, Clone, PartialEq)]
#[allow(unpredictable_function_pointer_comparisons)]
pub enum BackoffStrategy {
    /// The same delay between every attempt.
    Fixed(Duration),
    /// `initial_delay + attempt * increment`.
    Linear {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Added for each subsequent retry.
        increment: Duration,
    },
    /// `initial_delay * base^attempt`, capped at `max_delay`.
    Exponential {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Growth factor per attempt.
        base: f64,
        /// Upper bound for the computed delay.
        max_delay: Duration,
    },
    /// Caller-supplied delay function of the attempt index.
    Custom(fn(u32) -> Duration),
}

impl Default for BackoffStrategy {
    /// One second between attempts.
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(1000))
    }
}

impl BackoffStrategy {
    /// Compute the delay preceding retry `attempt` (0-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Linear { initial_delay, increment } => {
                *initial_delay + increment.saturating_mul(attempt)
            }
            Self::Exponential { initial_delay, base, max_delay } => {
                let delay = initial_delay.as_millis() as f64 * base.powi(attempt as i32);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
            Self::Custom(f) => f(attempt),
        }
    }
}

/// Outcome of consulting a [`RetryPolicy`] after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the backoff-computed delay.
    Retry,
    /// Retry after this specific delay instead.
    RetryAfter(Duration),
    /// Give up and surface the error.
    Stop,
}

/// Decides whether a failed attempt should be repeated.
pub trait RetryPolicy<E> {
    /// Inspect `error` after 0-based `attempt` and decide.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Ready-made policies for common cases.
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Retries on every error.
    #[derive(Debug, Clone, Copy)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retries.
    #[derive(Debug, Clone, Copy)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }

    /// Retries while the predicate holds.
    #[derive(Debug)]
    pub struct PredicateRetry<F> {
        predicate: F,
    }

    impl<F> PredicateRetry<F> {
        /// Wrap a `(error, attempt) -> bool` predicate.
        pub fn new(predicate: F) -> Self {
            Self { predicate }
        }
    }

    impl<F, E> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E, u32) -> bool,
    {
        fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
            if (self.predicate)(error, attempt) {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }
}
