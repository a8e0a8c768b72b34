//! Admin-REST surface (consumer-key authenticated CRUD).

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::resource::Resource;
use super::types::{Order, Product};
use crate::session::AuthenticatedClient;

/// Admin-API service group.
pub struct AdminApi {
    client: Arc<AuthenticatedClient>,
    prefix: String,
}

impl AdminApi {
    /// Bind the admin prefix.
    pub fn new(client: Arc<AuthenticatedClient>, prefix: String) -> Self {
        Self { client, prefix }
    }

    /// Product management.
    pub fn products(&self) -> Resource<Product> {
        self.resource("products")
    }

    /// Order management.
    pub fn orders(&self) -> Resource<Order> {
        self.resource("orders")
    }

    /// Any other admin collection (`webhooks`, `coupons`, ...), with a
    /// caller-supplied DTO.
    pub fn resource<T: DeserializeOwned + Send + 'static>(&self, name: &str) -> Resource<T> {
        Resource::new(Arc::clone(&self.client), format!("{}/{name}", self.prefix))
    }
}
