//! In-memory token storage.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{StorageError, TokenStorage};

/// Process-local [`TokenStorage`] backed by a `RwLock`.
///
/// The default backend when the integrating application does not supply its
/// own, and the backend used throughout the test suite.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: RwLock<Option<String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self { value: RwLock::new(Some(value.into())) }
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.value.read().clone())
    }

    async fn set(&self, value: &str) -> Result<(), StorageError> {
        *self.value.write() = Some(value.to_owned());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.value.write() = None;
        Ok(())
    }
}
