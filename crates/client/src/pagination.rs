//! Header-driven pagination and the full-collection walk.
//!
//! WordPress collection endpoints report totals in `x-wp-total` /
//! `x-wp-totalpages` and neighbor pages in the `link` header.
//! [`Pagination`] normalizes those; [`PagedRequest`] wraps a page-fetch
//! closure into a lazy, reusable value: awaiting it fetches page 1, and
//! [`PagedRequest::walk`] performs a fresh sequential walk over all pages
//! with cooperative cancellation.

use std::collections::BTreeMap;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Pagination facts extracted from collection response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Total items across all pages (`x-wp-total`).
    pub total: Option<u64>,
    /// Total pages (`x-wp-totalpages`).
    pub total_pages: Option<u64>,
    /// URL of the next page (`link; rel="next"`).
    pub next: Option<String>,
    /// URL of the previous page (`link; rel="prev"`).
    pub prev: Option<String>,
}

impl Pagination {
    /// Parse the WordPress collection headers out of a lower-cased header
    /// map. Returns `None` when none of them are present.
    pub fn from_headers(headers: &BTreeMap<String, String>) -> Option<Self> {
        let total = headers.get("x-wp-total").and_then(|v| v.parse().ok());
        let total_pages = headers.get("x-wp-totalpages").and_then(|v| v.parse().ok());
        let (next, prev) = headers
            .get("link")
            .map(|raw| parse_link_header(raw))
            .unwrap_or((None, None));

        if total.is_none() && total_pages.is_none() && next.is_none() && prev.is_none() {
            return None;
        }
        Some(Self { total, total_pages, next, prev })
    }
}

/// Split an RFC 8288 `link` header into its `next` / `prev` targets.
fn parse_link_header(raw: &str) -> (Option<String>, Option<String>) {
    let mut next = None;
    let mut prev = None;
    for part in raw.split(',') {
        let Some((target, params)) = part.trim().split_once(';') else {
            continue;
        };
        let url = target.trim().trim_start_matches('<').trim_end_matches('>');
        if params.contains("rel=\"next\"") || params.contains("rel=next") {
            next = Some(url.to_owned());
        } else if params.contains("rel=\"prev\"") || params.contains("rel=prev") {
            prev = Some(url.to_owned());
        }
    }
    (next, prev)
}

type PageFetcher<T> =
    Arc<dyn Fn(u32) -> BoxFuture<'static, ApiResult<Vec<T>>> + Send + Sync>;

/// Read-only view of one fetched page, handed to the walk callback.
#[derive(Debug)]
pub struct PageView<'a, T> {
    /// 1-based page number.
    pub page: u32,
    /// The page's items, absent for error pages.
    pub items: Option<&'a [T]>,
    /// The page's error, absent for successful pages.
    pub error: Option<&'a ApiError>,
    /// Cumulative total-items knowledge at this point of the walk.
    pub total: Option<u64>,
    /// Cumulative total-pages knowledge at this point of the walk.
    pub total_pages: Option<u64>,
}

/// Callback invoked after every fetched page, error pages included.
pub type PageCallback<T> = Arc<dyn Fn(PageView<'_, T>) + Send + Sync>;

/// Options for [`PagedRequest::walk`].
#[derive(Clone)]
pub struct WalkOptions<T> {
    /// Stop after this many pages; unlimited when `None`.
    pub max_pages: Option<u32>,
    /// Sleep between pages (not before the first).
    pub delay: Duration,
    /// Stop at the first error page. When `false` the walk continues and the
    /// last error is reported in the outcome.
    pub stop_on_error: bool,
    /// Cooperative cancellation, checked at loop top and again after each
    /// inter-page delay.
    pub cancel: Option<CancellationToken>,
    /// Per-page callback.
    pub on_page: Option<PageCallback<T>>,
}

impl<T> Default for WalkOptions<T> {
    fn default() -> Self {
        Self {
            max_pages: None,
            delay: Duration::ZERO,
            stop_on_error: true,
            cancel: None,
            on_page: None,
        }
    }
}

/// Result of one full walk.
#[derive(Debug)]
pub struct WalkOutcome<T> {
    /// Items accumulated from every successful page.
    pub items: Vec<T>,
    /// Last-seen total-items header.
    pub total: Option<u64>,
    /// Last-seen total-pages header.
    pub total_pages: Option<u64>,
    /// Pages actually fetched.
    pub pages_fetched: u32,
    /// The last error encountered, even when later pages succeeded.
    pub last_error: Option<ApiError>,
    /// Whether the walk stopped because cancellation was signalled.
    pub cancelled: bool,
}

impl<T> Default for WalkOutcome<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
            total_pages: None,
            pages_fetched: 0,
            last_error: None,
            cancelled: false,
        }
    }
}

/// A lazy, reusable handle over a paged list operation.
///
/// Nothing is fetched until the value is awaited (page 1) or walked. The
/// handle holds only the fetch closure and its captured parameters, so every
/// [`walk`](Self::walk) performs its own independent page sequence.
#[derive(Clone)]
pub struct PagedRequest<T> {
    fetch: PageFetcher<T>,
}

impl<T: Send + 'static> PagedRequest<T> {
    /// Wrap a page-fetch closure (`page` is 1-based).
    pub fn new<F>(fetch: F) -> Self
    where
        F: Fn(u32) -> BoxFuture<'static, ApiResult<Vec<T>>> + Send + Sync + 'static,
    {
        Self { fetch: Arc::new(fetch) }
    }

    /// Fetch one specific page.
    pub async fn page(&self, page: u32) -> ApiResult<Vec<T>> {
        (self.fetch.as_ref())(page).await
    }

    /// Walk all pages sequentially, accumulating items.
    ///
    /// Termination: `max_pages` reached, known `total_pages` exceeded, no
    /// `next` link while totals are unknown, an empty page, an error with
    /// `stop_on_error`, or cancellation. Cancellation returns the items
    /// collected so far without raising an error.
    pub async fn walk(&self, options: WalkOptions<T>) -> WalkOutcome<T> {
        let mut outcome = WalkOutcome::default();
        let mut page: u32 = 1;

        loop {
            if let Some(cancel) = &options.cancel {
                if cancel.is_cancelled() {
                    outcome.cancelled = true;
                    break;
                }
            }
            if let Some(max) = options.max_pages {
                if page > max {
                    break;
                }
            }
            if let Some(total_pages) = outcome.total_pages {
                if u64::from(page) > total_pages {
                    break;
                }
            }

            let result = (self.fetch.as_ref())(page).await;
            outcome.pages_fetched += 1;

            let mut has_next = false;
            if let Ok(response) = &result {
                if let Some(pagination) = &response.pagination {
                    if pagination.total.is_some() {
                        outcome.total = pagination.total;
                    }
                    if pagination.total_pages.is_some() {
                        outcome.total_pages = pagination.total_pages;
                    }
                    has_next = pagination.next.is_some();
                }
            }

            if let Some(on_page) = &options.on_page {
                let view = match &result {
                    Ok(response) => PageView {
                        page,
                        items: Some(&response.data),
                        error: None,
                        total: outcome.total,
                        total_pages: outcome.total_pages,
                    },
                    Err(error) => PageView {
                        page,
                        items: None,
                        error: Some(error),
                        total: outcome.total,
                        total_pages: outcome.total_pages,
                    },
                };
                (on_page.as_ref())(view);
            }

            let proceed = match result {
                Ok(response) => {
                    if response.data.is_empty() {
                        // Empty page: stop even when totals promise more,
                        // so a malformed backend cannot loop us forever.
                        debug!(page, "empty page terminates the walk");
                        false
                    } else {
                        outcome.items.extend(response.data);
                        outcome.total_pages.is_some() || has_next
                    }
                }
                Err(error) => {
                    outcome.last_error = Some(error);
                    !options.stop_on_error
                }
            };
            if !proceed {
                break;
            }

            page += 1;
            if !options.delay.is_zero() {
                tokio::time::sleep(options.delay).await;
                if let Some(cancel) = &options.cancel {
                    if cancel.is_cancelled() {
                        outcome.cancelled = true;
                        break;
                    }
                }
            }
        }

        outcome
    }
}

impl<T: Send + 'static> IntoFuture for PagedRequest<T> {
    type Output = ApiResult<Vec<T>>;
    type IntoFuture = BoxFuture<'static, ApiResult<Vec<T>>>;

    /// Awaiting the handle fetches page 1.
    fn into_future(self) -> Self::IntoFuture {
        let fetch = self.fetch;
        Box::pin(async move { (fetch.as_ref())(1).await })
    }
}
