//! The closed set of events the SDK can emit.

use serde_json::Value;

/// Well-known event keys.
///
/// Keys are what handlers subscribe to; scoped buses prepend their prefix to
/// these before touching the registry.
pub mod keys {
    /// Authentication state changed (login, logout, failed refresh).
    pub const AUTH_CHANGED: &str = "auth:changed";
    /// A token refresh completed successfully.
    pub const TOKENS_REFRESHED: &str = "auth:refreshed";
    /// The server rotated the store-API nonce.
    pub const NONCE_CHANGED: &str = "nonce:changed";
    /// The server issued or rotated the cart token.
    pub const CART_TOKEN_CHANGED: &str = "cart:token:changed";
    /// A request failed after classification (and retries, if any).
    pub const REQUEST_ERROR: &str = "request:error";
}

/// An event published on the [`EventBus`](super::EventBus).
///
/// Each variant maps to a fixed key (see [`keys`]); `Custom` lets integrating
/// applications define their own keyed payloads without widening the typed
/// set.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    /// Authentication state changed.
    AuthChanged {
        /// Whether a session is now established.
        authenticated: bool,
    },
    /// Access/refresh tokens were replaced by a successful refresh.
    TokensRefreshed,
    /// The store-API nonce changed.
    NonceChanged {
        /// The new nonce value.
        nonce: String,
    },
    /// The cart token changed.
    CartTokenChanged {
        /// The new cart token value.
        token: String,
    },
    /// A request settled with an error.
    RequestError {
        /// HTTP status of the failure, `0` when no response was received.
        status: u16,
        /// Machine-readable error code.
        code: String,
    },
    /// Application-defined event.
    Custom {
        /// Event key used for subscription matching.
        name: String,
        /// Arbitrary JSON payload.
        data: Value,
    },
}

impl SdkEvent {
    /// The subscription key this event is dispatched under (before any scope
    /// prefix is applied).
    pub fn key(&self) -> &str {
        match self {
            Self::AuthChanged { .. } => keys::AUTH_CHANGED,
            Self::TokensRefreshed => keys::TOKENS_REFRESHED,
            Self::NonceChanged { .. } => keys::NONCE_CHANGED,
            Self::CartTokenChanged { .. } => keys::CART_TOKEN_CHANGED,
            Self::RequestError { .. } => keys::REQUEST_ERROR,
            Self::Custom { name, .. } => name,
        }
    }

    /// Build a custom event from a key and JSON payload.
    pub fn custom(name: impl Into<String>, data: Value) -> Self {
        Self::Custom { name: name.into(), data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_keys_are_stable() {
        assert_eq!(SdkEvent::AuthChanged { authenticated: true }.key(), "auth:changed");
        assert_eq!(SdkEvent::TokensRefreshed.key(), "auth:refreshed");
        assert_eq!(SdkEvent::NonceChanged { nonce: "n".into() }.key(), "nonce:changed");
        assert_eq!(SdkEvent::CartTokenChanged { token: "t".into() }.key(), "cart:token:changed");
        assert_eq!(SdkEvent::RequestError { status: 500, code: "http_500".into() }.key(), "request:error");
    }

    #[test]
    fn custom_events_use_their_own_key() {
        let event = SdkEvent::custom("plugin:ready", Value::Null);
        assert_eq!(event.key(), "plugin:ready");
    }
}
