//! Grouped session credential storage.

use std::sync::Arc;

use tracing::info;

use woosdk_common::events::{EventBus, SdkEvent};
use woosdk_common::storage::{StorageError, TokenStorage};

/// The four session credentials, each behind its own storage provider.
///
/// The storages are independent — clearing the nonce never touches the
/// access token — but the access/refresh pair moves together: a successful
/// login or refresh updates both, and logout clears both.
#[derive(Clone)]
pub struct SessionTokens {
    access: Arc<dyn TokenStorage>,
    refresh: Arc<dyn TokenStorage>,
    nonce: Arc<dyn TokenStorage>,
    cart: Arc<dyn TokenStorage>,
    events: EventBus,
}

impl SessionTokens {
    /// Group the four storages.
    pub fn new(
        access: Arc<dyn TokenStorage>,
        refresh: Arc<dyn TokenStorage>,
        nonce: Arc<dyn TokenStorage>,
        cart: Arc<dyn TokenStorage>,
        events: EventBus,
    ) -> Self {
        Self { access, refresh, nonce, cart, events }
    }

    /// The bus session transitions are announced on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Current access token.
    pub async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.access.get().await
    }

    /// Current refresh token.
    pub async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.refresh.get().await
    }

    /// Whether an access token is currently stored.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.access.get().await, Ok(Some(_)))
    }

    /// Store a fresh access/refresh pair and announce `auth:changed(true)`.
    ///
    /// Both storages are written before the announcement; when the backend
    /// did not issue a refresh token the existing one is left in place.
    pub async fn set_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), StorageError> {
        self.access.set(access_token).await?;
        if let Some(refresh_token) = refresh_token {
            self.refresh.set(refresh_token).await?;
        }
        info!("session established");
        self.events.emit(&SdkEvent::AuthChanged { authenticated: true });
        Ok(())
    }

    /// Clear the access/refresh pair and announce `auth:changed(false)`.
    pub async fn clear_session(&self) -> Result<(), StorageError> {
        self.access.clear().await?;
        self.refresh.clear().await?;
        info!("session cleared");
        self.events.emit(&SdkEvent::AuthChanged { authenticated: false });
        Ok(())
    }

    /// Storage handle for the access token (consumed by the bearer
    /// interceptor).
    pub fn access_storage(&self) -> Arc<dyn TokenStorage> {
        Arc::clone(&self.access)
    }

    /// Storage handle for the nonce.
    pub fn nonce_storage(&self) -> Arc<dyn TokenStorage> {
        Arc::clone(&self.nonce)
    }

    /// Storage handle for the cart token.
    pub fn cart_storage(&self) -> Arc<dyn TokenStorage> {
        Arc::clone(&self.cart)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::*;
    use woosdk_common::storage::MemoryStorage;

    fn session_with_bus(events: EventBus) -> SessionTokens {
        SessionTokens::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            events,
        )
    }

    #[tokio::test]
    async fn set_session_writes_both_tokens_and_announces() {
        let events = EventBus::new();
        let last_state = Arc::new(AtomicI32::new(-1));
        let _sub = {
            let last_state = Arc::clone(&last_state);
            events.on("auth:changed", move |event| {
                if let SdkEvent::AuthChanged { authenticated } = event {
                    last_state.store(i32::from(*authenticated), Ordering::SeqCst);
                }
            })
        };
        let session = session_with_bus(events);

        session.set_session("access-1", Some("refresh-1")).await.unwrap();
        assert_eq!(session.access_token().await.unwrap(), Some("access-1".to_owned()));
        assert_eq!(session.refresh_token().await.unwrap(), Some("refresh-1".to_owned()));
        assert!(session.is_authenticated().await);
        assert_eq!(last_state.load(Ordering::SeqCst), 1);

        session.clear_session().await.unwrap();
        assert_eq!(session.access_token().await.unwrap(), None);
        assert_eq!(session.refresh_token().await.unwrap(), None);
        assert_eq!(last_state.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_without_new_refresh_token_keeps_the_old_one() {
        let session = session_with_bus(EventBus::new());
        session.set_session("access-1", Some("refresh-1")).await.unwrap();
        session.set_session("access-2", None).await.unwrap();
        assert_eq!(session.access_token().await.unwrap(), Some("access-2".to_owned()));
        assert_eq!(session.refresh_token().await.unwrap(), Some("refresh-1".to_owned()));
    }
}
