//! Session token storage abstraction
//!
//! Every session credential the SDK tracks (access token, refresh token,
//! nonce, cart token) is one opaque string persisted through a
//! [`TokenStorage`]. Integrating applications supply their own backends
//! (browser storage bridges, server-side session stores); the SDK falls back
//! to the in-memory implementation when none is provided, and tests use the
//! same implementation directly.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStorage;

/// Errors surfaced by a storage backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The backend failed to read or write the value.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Async persistence for a single named string value.
///
/// Implementations must be cheap to call repeatedly; the SDK reads tokens on
/// every outgoing request. Each credential gets its own `TokenStorage`
/// instance, so implementations never need to namespace keys themselves.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Read the current value, `None` when nothing is stored.
    async fn get(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored value.
    async fn set(&self, value: &str) -> Result<(), StorageError>;

    /// Remove the stored value. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<(), StorageError>;
}
