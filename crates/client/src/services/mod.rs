//! Domain service groups
//!
//! Thin typed wrappers over the pipeline verbs. Each wrapper is a one-call
//! passthrough: the interesting behavior (credentials, retry, refresh,
//! pagination) lives below them in the pipeline and session layers. The
//! generic [`Resource`] covers the uniform list/get/create/update/delete
//! shape every REST collection shares; the typed groups pin it to concrete
//! paths and DTOs.

mod admin;
mod auth;
mod resource;
mod store;
pub mod types;

pub use admin::AdminApi;
pub use auth::{AuthService, LoginResponse};
pub use resource::Resource;
pub use store::StoreApi;
