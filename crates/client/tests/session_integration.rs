//! Session flows against a mock server: single-flight refresh, failure
//! propagation, login/logout invariants.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use woosdk_client::http::RequestOptions;
use woosdk_client::{Sdk, SdkBuilder};
use woosdk_common::events::SdkEvent;
use woosdk_common::storage::{MemoryStorage, TokenStorage};

const ACCOUNT_PATH: &str = "/wp-json/wc/store/v1/account";
const REFRESH_PATH: &str = "/wp-json/woosdk/v1/auth/refresh";

struct SessionFixture {
    sdk: Sdk,
    access: Arc<MemoryStorage>,
    refresh: Arc<MemoryStorage>,
}

fn authenticated_sdk(server: &MockServer) -> SessionFixture {
    let access = Arc::new(MemoryStorage::with_value("stale"));
    let refresh = Arc::new(MemoryStorage::with_value("refresh-1"));
    let sdk = SdkBuilder::new(server.uri())
        .access_storage(Arc::clone(&access) as Arc<dyn TokenStorage>)
        .refresh_storage(Arc::clone(&refresh) as Arc<dyn TokenStorage>)
        .build()
        .unwrap();
    SessionFixture { sdk, access, refresh }
}

async fn mount_refresh_success(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "refresh_token": "refresh-2"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_401s_trigger_exactly_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "jwt_expired",
            "message": "Token expired.",
            "data": { "status": 401 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;
    mount_refresh_success(&server, 1).await;

    let fixture = authenticated_sdk(&server);
    let refreshed = Arc::new(AtomicUsize::new(0));
    let _sub = {
        let refreshed = Arc::clone(&refreshed);
        fixture.sdk.events().on("auth:refreshed", move |_| {
            refreshed.fetch_add(1, Ordering::SeqCst);
        })
    };

    let client = fixture.sdk.client().unwrap();
    let call = || {
        let client = Arc::clone(&client);
        async move {
            client
                .request::<Value>(Method::GET, ACCOUNT_PATH, None, RequestOptions::default())
                .await
        }
    };

    let (a, b, c) = tokio::join!(call(), call(), call());
    assert_eq!(a.unwrap().data["ok"], true);
    assert_eq!(b.unwrap().data["ok"], true);
    assert_eq!(c.unwrap().data["ok"], true);

    // One exchange served every waiter, and the session moved to the new pair.
    assert_eq!(refreshed.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.access.get().await.unwrap(), Some("fresh".to_owned()));
    assert_eq!(fixture.refresh.get().await.unwrap(), Some("refresh-2".to_owned()));
    assert!(!fixture.sdk.refresh_coordinator().is_refreshing());
}

#[tokio::test]
async fn failed_refresh_surfaces_the_original_rejection_and_touches_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "jwt_expired",
            "message": "Token expired.",
            "data": { "status": 401 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "invalid_grant",
            "message": "Refresh token revoked.",
            "data": { "status": 401 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = authenticated_sdk(&server);
    let auth_changes = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let _sub = {
        let auth_changes = Arc::clone(&auth_changes);
        fixture.sdk.events().on("auth:changed", move |event| {
            if let SdkEvent::AuthChanged { authenticated } = event {
                auth_changes.lock().push(*authenticated);
            }
        })
    };

    let client = fixture.sdk.client().unwrap();
    let error = client
        .request::<Value>(Method::GET, ACCOUNT_PATH, None, RequestOptions::default())
        .await
        .unwrap_err();

    // The caller sees the original 401, not the refresh failure.
    assert_eq!(error.status(), 401);
    assert_eq!(error.code(), "jwt_expired");

    // Failed refreshes never mutate the stored pair.
    assert_eq!(fixture.access.get().await.unwrap(), Some("stale".to_owned()));
    assert_eq!(fixture.refresh.get().await.unwrap(), Some("refresh-1".to_owned()));

    // The authentication-required state was announced.
    assert_eq!(*auth_changes.lock(), vec![false]);
}

#[tokio::test]
async fn refresh_is_not_attempted_without_a_refresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "jwt_expired",
            "message": "Token expired.",
            "data": { "status": 401 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sdk = SdkBuilder::new(server.uri())
        .access_storage(Arc::new(MemoryStorage::with_value("stale")))
        .build()
        .unwrap();
    let error = sdk
        .client()
        .unwrap()
        .request::<Value>(Method::GET, ACCOUNT_PATH, None, RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(error.status(), 401);
}

#[tokio::test]
async fn sequential_refreshes_run_their_own_exchanges() {
    let server = MockServer::start().await;
    mount_refresh_success(&server, 2).await;

    let fixture = authenticated_sdk(&server);
    let client = fixture.sdk.client().unwrap();

    client.refresh_session().await.unwrap();
    client.refresh_session().await.unwrap();
}

#[tokio::test]
async fn login_persists_both_tokens_together() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/woosdk/v1/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "login-access",
            "refresh_token": "login-refresh",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let fixture = authenticated_sdk(&server);
    let auth = fixture.sdk.auth().unwrap();

    let response = auth.login("shopper", "hunter2").await.unwrap();
    assert_eq!(response.data.access_token, "login-access");
    assert!(auth.is_authenticated().await);
    assert_eq!(fixture.access.get().await.unwrap(), Some("login-access".to_owned()));
    assert_eq!(fixture.refresh.get().await.unwrap(), Some("login-refresh".to_owned()));
}

#[tokio::test]
async fn logout_clears_the_session_even_when_revocation_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/woosdk/v1/auth/revoke"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fixture = authenticated_sdk(&server);
    let auth = fixture.sdk.auth().unwrap();

    let result = auth.logout().await;
    assert!(result.is_err());
    assert!(!auth.is_authenticated().await);
    assert_eq!(fixture.access.get().await.unwrap(), None);
    assert_eq!(fixture.refresh.get().await.unwrap(), None);
}
