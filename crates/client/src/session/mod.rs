//! Session state and token refresh
//!
//! [`SessionTokens`] groups the four session credentials (access token,
//! refresh token, nonce, cart token) behind their storage providers and
//! enforces the one session invariant that matters: access and refresh
//! tokens are written together on login/refresh and cleared together on
//! logout, with `auth:changed` emitted on both transitions.
//!
//! [`RefreshCoordinator`] guarantees at most one in-flight refresh per SDK
//! instance; [`AuthenticatedClient`] wires it into the request path by
//! replaying a 401-rejected request once after a successful refresh.

mod authenticated;
mod refresh;
mod tokens;

pub use authenticated::AuthenticatedClient;
pub use refresh::{AuthError, RefreshCoordinator, TokenPair};
pub use tokens::SessionTokens;
