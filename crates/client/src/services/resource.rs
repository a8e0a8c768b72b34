//! Generic CRUD wrapper over one REST collection.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::http::RequestOptions;
use crate::pagination::PagedRequest;
use crate::session::AuthenticatedClient;

/// Uniform list/get/create/update/delete over a collection path.
///
/// All verbs are passthroughs to the authenticated client; `list` returns a
/// lazy [`PagedRequest`] so callers choose between one page (`.await`) and
/// the full collection (`.walk(...)`).
pub struct Resource<T> {
    client: Arc<AuthenticatedClient>,
    path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Send + 'static> Resource<T> {
    /// Bind a collection path (e.g. `/wp-json/wc/v3/products`).
    pub fn new(client: Arc<AuthenticatedClient>, path: impl Into<String>) -> Self {
        Self { client, path: path.into(), _marker: PhantomData }
    }

    /// Lazy paged listing with the given query parameters. `page` and
    /// `per_page` are appended by the walk machinery per fetch.
    pub fn list(&self, params: Vec<(String, String)>) -> PagedRequest<T> {
        let client = Arc::clone(&self.client);
        let path = self.path.clone();
        PagedRequest::new(move |page| {
            let client = Arc::clone(&client);
            let path = path.clone();
            let mut params = params.clone();
            Box::pin(async move {
                params.push(("page".to_owned(), page.to_string()));
                client
                    .request::<Vec<T>>(
                        Method::GET,
                        &path,
                        None,
                        RequestOptions::default().with_query(params),
                    )
                    .await
            })
        })
    }

    /// Fetch one item by id.
    pub async fn get(&self, id: impl Display) -> ApiResult<T> {
        self.client
            .request(Method::GET, &format!("{}/{id}", self.path), None, RequestOptions::default())
            .await
    }

    /// Create an item.
    pub async fn create<B: Serialize>(&self, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::request(format!("failed to serialize request body: {e}")))?;
        self.client
            .request(Method::POST, &self.path, Some(body), RequestOptions::default())
            .await
    }

    /// Update an item by id.
    pub async fn update<B: Serialize>(&self, id: impl Display, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::request(format!("failed to serialize request body: {e}")))?;
        self.client
            .request(
                Method::PUT,
                &format!("{}/{id}", self.path),
                Some(body),
                RequestOptions::default(),
            )
            .await
    }

    /// Delete an item by id.
    pub async fn delete(&self, id: impl Display) -> ApiResult<T> {
        self.client
            .request(
                Method::DELETE,
                &format!("{}/{id}", self.path),
                None,
                RequestOptions::default(),
            )
            .await
    }
}
