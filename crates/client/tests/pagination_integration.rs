//! Full-collection walks over a mock server with WordPress collection
//! headers.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use woosdk_client::pagination::WalkOptions;
use woosdk_client::Sdk;

const PRODUCTS_PATH: &str = "/wp-json/wc/store/v1/products";

async fn mount_page(server: &MockServer, page: u32, ids: Vec<u64>, total: u64, total_pages: u64) {
    let body: Vec<_> = ids
        .into_iter()
        .map(|id| json!({ "id": id, "name": format!("Product {id}") }))
        .collect();
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .insert_header("X-WP-Total", total.to_string().as_str())
                .insert_header("X-WP-TotalPages", total_pages.to_string().as_str()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn walk_collects_the_whole_catalog() {
    let server = MockServer::start().await;
    mount_page(&server, 1, vec![1, 2], 5, 3).await;
    mount_page(&server, 2, vec![3, 4], 5, 3).await;
    mount_page(&server, 3, vec![5], 5, 3).await;

    let sdk = Sdk::builder(server.uri()).build().unwrap();
    let products = sdk.store().unwrap().products();

    let outcome = products.list(Vec::new()).walk(WalkOptions::default()).await;
    let ids: Vec<u64> = outcome.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(outcome.total, Some(5));
    assert_eq!(outcome.total_pages, Some(3));
    assert_eq!(outcome.pages_fetched, 3);
    assert!(outcome.last_error.is_none());
}

#[tokio::test]
async fn awaiting_the_list_fetches_only_page_one() {
    let server = MockServer::start().await;
    mount_page(&server, 1, vec![1, 2], 5, 3).await;

    let sdk = Sdk::builder(server.uri()).build().unwrap();
    let response = sdk.store().unwrap().products().list(Vec::new()).await.unwrap();

    assert_eq!(response.data.len(), 2);
    let pagination = response.pagination.unwrap();
    assert_eq!(pagination.total_pages, Some(3));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn empty_page_stops_a_lying_backend() {
    let server = MockServer::start().await;
    // Page 2 claims more pages exist but returns nothing.
    mount_page(&server, 1, vec![1, 2], 99, 42).await;
    mount_page(&server, 2, Vec::new(), 99, 42).await;

    let sdk = Sdk::builder(server.uri()).build().unwrap();
    let outcome = sdk
        .store()
        .unwrap()
        .products()
        .list(Vec::new())
        .walk(WalkOptions::default())
        .await;

    let ids: Vec<u64> = outcome.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(outcome.pages_fetched, 2);
}

#[tokio::test]
async fn cancellation_between_pages_keeps_collected_items() {
    let server = MockServer::start().await;
    mount_page(&server, 1, vec![1, 2], 6, 3).await;
    mount_page(&server, 2, vec![3, 4], 6, 3).await;
    mount_page(&server, 3, vec![5, 6], 6, 3).await;

    let sdk = Sdk::builder(server.uri()).build().unwrap();
    let cancel = CancellationToken::new();

    // Cancel while the walk sleeps between page 1 and page 2.
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let outcome = sdk
        .store()
        .unwrap()
        .products()
        .list(Vec::new())
        .walk(WalkOptions {
            delay: Duration::from_millis(200),
            cancel: Some(cancel),
            ..WalkOptions::default()
        })
        .await;

    let ids: Vec<u64> = outcome.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(outcome.pages_fetched, 1);
    assert!(outcome.cancelled);
    assert!(outcome.last_error.is_none());
}

#[tokio::test]
async fn per_page_query_params_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("per_page", "2"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1, "name": "Product 1" }]))
                .insert_header("X-WP-Total", "1")
                .insert_header("X-WP-TotalPages", "1"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sdk = Sdk::builder(server.uri()).build().unwrap();
    let params = vec![("per_page".to_owned(), "2".to_owned())];
    let outcome = sdk
        .store()
        .unwrap()
        .products()
        .list(params)
        .walk(WalkOptions::default())
        .await;
    assert_eq!(outcome.items.len(), 1);
}

#[tokio::test]
async fn error_page_is_recorded_in_the_outcome() {
    let server = MockServer::start().await;
    mount_page(&server, 1, vec![1, 2], 6, 3).await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sdk = Sdk::builder(server.uri()).build().unwrap();
    let outcome = sdk
        .store()
        .unwrap()
        .products()
        .list(Vec::new())
        .walk(WalkOptions::default())
        .await;

    assert_eq!(outcome.items.len(), 2);
    let error = outcome.last_error.unwrap();
    assert_eq!(error.status(), 500);
}
