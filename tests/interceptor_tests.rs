//! Authenticated request client tests
//! Bearer attachment, forced logout on 401/403 and stage lifecycle
//!
//! Run with: cargo test --test interceptor_tests

mod common;

use common::test_app;
use donorlink::auth::middleware::extract_bearer;
use donorlink::auth::AUTH_STAGE;
use donorlink::error::Error;
use donorlink::routes::LOGIN_ROUTE;
use donorlink::routes::NavigateOptions;
use donorlink::storage::{LocalStorage, ACCESS_TOKEN_KEY};
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_bearer_attached_when_signed_in() {
    let t = test_app().await;
    t.sign_in("donor@example.org").await;

    Mock::given(method("GET"))
        .and(path("/admin-stats"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalUsers": 3})))
        .expect(1)
        .mount(&t.server)
        .await;

    let client = t.app.secure_client();
    let stats = client.admin_stats().await.unwrap();
    assert_eq!(stats.total_users, 3);

    let requests = t.server.received_requests().await.unwrap();
    let token = requests[0]
        .headers
        .get(AUTHORIZATION.as_str())
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .expect("bearer header");
    let claims = t.idp.verify_token(&token).unwrap();
    assert_eq!(claims.email.as_deref(), Some("donor@example.org"));
}

#[tokio::test]
async fn test_no_bearer_without_user() {
    let t = test_app().await;
    t.ready().await;

    Mock::given(method("GET"))
        .and(path("/funding"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [], "total": 0, "page": 1, "perPage": 10
        })))
        .expect(1)
        .mount(&t.server)
        .await;

    let client = t.app.secure_client();
    client.list_funding(1).await.unwrap();

    let requests = t.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get(AUTHORIZATION.as_str()).is_none());
}

#[tokio::test]
async fn test_plain_client_sends_no_credential() {
    let t = test_app().await;
    t.sign_in("donor@example.org").await;

    Mock::given(method("GET"))
        .and(path("/admin-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&t.server)
        .await;

    t.app.api().admin_stats().await.unwrap();
    let requests = t.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get(AUTHORIZATION.as_str()).is_none());
}

#[tokio::test]
async fn test_forbidden_forces_single_logout_and_redirect() {
    let t = test_app().await;
    t.sign_in("donor@example.org").await;
    t.app
        .navigator()
        .navigate("/dashboard/my-donation-requests", NavigateOptions::default());
    let navigations = t.app.navigator().navigation_count();
    assert!(t.storage.get(ACCESS_TOKEN_KEY).unwrap().is_some());

    Mock::given(method("GET"))
        .and(path("/admin-stats"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "forbidden access"})))
        .expect(1)
        .mount(&t.server)
        .await;

    // Two mounts share the same stage
    let first = t.app.secure_client();
    let _second = t.app.secure_client();
    assert_eq!(first.interceptor_count(), 1);
    assert_eq!(first.pipeline().mounts(AUTH_STAGE), 2);

    let result = first.admin_stats().await;
    assert!(matches!(result, Err(Error::Unauthorized(status)) if status.as_u16() == 403));

    assert!(t.app.session().session().current_user.is_none());
    assert_eq!(t.storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(t.app.navigator().navigation_count(), navigations + 1);

    let location = t.app.navigator().location();
    assert_eq!(location.path, LOGIN_ROUTE);
    assert_eq!(location.from.as_deref(), Some("/dashboard/my-donation-requests"));
}

#[tokio::test]
async fn test_unauthorized_without_session_still_redirects() {
    let t = test_app().await;
    t.ready().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&t.server)
        .await;

    let client = t.app.secure_client();
    let result = client.list_users(&Default::default()).await;
    assert!(result.as_ref().is_err_and(Error::is_unauthorized));
    assert_eq!(t.app.navigator().location().path, LOGIN_ROUTE);
}

#[tokio::test]
async fn test_other_errors_leave_session_alone() {
    let t = test_app().await;
    t.sign_in("donor@example.org").await;

    Mock::given(method("GET"))
        .and(path("/admin-stats"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "database down"})))
        .mount(&t.server)
        .await;

    let client = t.app.secure_client();
    match client.admin_stats().await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "database down");
        }
        other => panic!("expected API error, got {:?}", other.map(|_| ())),
    }
    assert!(t.app.session().session().is_signed_in());
    assert_eq!(t.app.navigator().navigation_count(), 0);
}

#[tokio::test]
async fn test_unmount_restores_stage_count() {
    let t = test_app().await;
    t.ready().await;
    assert_eq!(t.app.api().interceptor_count(), 0);

    {
        let client = t.app.secure_client();
        assert_eq!(client.interceptor_count(), 1);
    }

    assert_eq!(t.app.api().interceptor_count(), 0);
}

#[tokio::test]
async fn test_unmount_mid_request() {
    let t = test_app().await;
    t.sign_in("donor@example.org").await;

    Mock::given(method("GET"))
        .and(path("/admin-stats"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&t.server)
        .await;

    let client = t.app.secure_client();
    let api = client.api().clone();
    let request = tokio::spawn(async move { api.get_json::<Value>("admin-stats").await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(client);
    assert_eq!(t.app.api().interceptor_count(), 0);

    // The response arrives after unmount: the status is still reported, the
    // session is untouched
    let result = request.await.unwrap();
    assert!(matches!(result, Err(Error::Unauthorized(_))));
    assert!(t.app.session().session().is_signed_in());
    assert_eq!(t.app.navigator().location().path, "/");

    let requests = t.server.received_requests().await.unwrap();
    let header = requests[0].headers.get(AUTHORIZATION.as_str()).expect("sent while mounted");
    let value = reqwest::header::HeaderValue::from_bytes(header.as_bytes()).unwrap();
    assert!(extract_bearer(&value).is_some());
}
