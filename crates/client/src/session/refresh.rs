//! Single-flight token refresh coordination.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;

/// Tokens produced by a refresh exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// New access token.
    pub access_token: String,
    /// New refresh token; absent when the backend keeps the old one valid.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Failures of the refresh exchange.
///
/// `Clone` because every waiter attached to a single-flight refresh receives
/// the same failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// There is no refresh token to exchange.
    #[error("no refresh token available")]
    NoRefreshToken,
    /// The backend rejected the exchange.
    #[error("refresh rejected ({status} {code}): {message}")]
    Rejected {
        /// Response status.
        status: u16,
        /// Backend error code.
        code: String,
        /// Backend error message.
        message: String,
    },
    /// The exchange never produced a response.
    #[error("refresh transport failure: {0}")]
    Transport(String),
    /// Reading or writing session storage failed.
    #[error("session storage failure: {0}")]
    Storage(String),
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Server { status, body, .. } => {
                Self::Rejected { status, code: body.code, message: body.message }
            }
            ApiError::Network { code, message } => Self::Transport(format!("{code}: {message}")),
            ApiError::Request { message } => Self::Transport(message),
        }
    }
}

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenPair, AuthError>>>;

/// Ensures at most one refresh exchange is in flight per SDK instance.
///
/// The slot is written under the lock, synchronously, before the refresh
/// future is first polled — two tasks that both observe an expired token
/// can never both start an exchange, because whichever takes the lock
/// second finds the first one's future and attaches to it. The slot is
/// cleared when the exchange settles (generation-checked, so a newer
/// exchange is never clobbered by a stale waiter).
#[derive(Default)]
pub struct RefreshCoordinator {
    inflight: Mutex<Option<(u64, RefreshFuture)>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    /// A coordinator in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` as the single-flight refresh.
    ///
    /// The first caller stores the operation's future and drives it; callers
    /// arriving while it is in flight await the same future and receive the
    /// identical outcome. `operation` is only invoked when no exchange is in
    /// flight.
    pub async fn refresh<F, Fut>(&self, operation: F) -> Result<TokenPair, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenPair, AuthError>> + Send + 'static,
    {
        let (generation, future, started) = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some((generation, future)) => (*generation, future.clone(), false),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let future: RefreshFuture = operation().boxed().shared();
                    *slot = Some((generation, future.clone()));
                    (generation, future, true)
                }
            }
        };

        if started {
            debug!(generation, "starting token refresh");
        } else {
            debug!(generation, "attaching to in-flight token refresh");
        }

        let result = future.await;

        let mut slot = self.inflight.lock();
        if slot.as_ref().map(|(g, _)| *g) == Some(generation) {
            *slot = None;
        }
        result
    }

    /// Whether an exchange is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inflight.lock().is_some()
    }

    /// Force the idle state, abandoning any in-flight exchange.
    ///
    /// Test affordance only: waiters already attached still settle with the
    /// abandoned future's outcome.
    pub fn reset(&self) {
        *self.inflight.lock() = None;
    }
}
