//! Store-API surface (public catalog and cart).

use std::sync::Arc;

use reqwest::Method;

use super::resource::Resource;
use super::types::{Cart, Product};
use crate::error::ApiResult;
use crate::http::RequestOptions;
use crate::session::AuthenticatedClient;

/// Store-API service group.
pub struct StoreApi {
    client: Arc<AuthenticatedClient>,
    prefix: String,
}

impl StoreApi {
    /// Bind the store prefix.
    pub fn new(client: Arc<AuthenticatedClient>, prefix: String) -> Self {
        Self { client, prefix }
    }

    /// The product catalog.
    pub fn products(&self) -> Resource<Product> {
        Resource::new(Arc::clone(&self.client), format!("{}/products", self.prefix))
    }

    /// Fetch the current cart.
    pub async fn cart(&self) -> ApiResult<Cart> {
        self.client
            .request(
                Method::GET,
                &format!("{}/cart", self.prefix),
                None,
                RequestOptions::default(),
            )
            .await
    }
}
