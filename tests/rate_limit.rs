//! Admission control over the full router.

use axum::http::{header, Method, StatusCode};
use ris_foods_api::config::{AppConfig, Endpoint};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_sixth_request_is_rejected_without_persistence() {
    let (router, store) = common::default_router(AppConfig::default());
    let body = common::valid_general_enquiry();

    for _ in 0..5 {
        let response = router
            .clone()
            .oneshot(common::post_json("/api/general-enquiry", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(common::post_json("/api/general-enquiry", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        common::ALLOWED_ORIGIN
    );
    assert_eq!(
        common::json_body(response).await["error"],
        "Too many requests. Please try again later."
    );
    assert_eq!(store.count(), 5);
}

#[tokio::test]
async fn test_rejected_even_when_body_is_invalid() {
    let (router, store) = common::default_router(AppConfig::default());

    for _ in 0..5 {
        router
            .clone()
            .oneshot(common::post_raw("/api/distributor-enquiry", "{}"))
            .await
            .unwrap();
    }
    let response = router
        .oneshot(common::post_raw("/api/distributor-enquiry", "not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(store.count(), 0);
}

#[tokio::test]
async fn test_preflight_does_not_consume_quota() {
    let (router, _) = common::default_router(AppConfig::default());

    for _ in 0..10 {
        let mut request = common::request(
            Method::OPTIONS,
            "/api/general-enquiry",
            Some(common::ALLOWED_ORIGIN),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", "1.2.3.4".parse().unwrap());
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = router
        .oneshot(common::post_json(
            "/api/general-enquiry",
            &common::valid_general_enquiry(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_identities_and_endpoints_are_isolated() {
    let mut config = AppConfig::default();
    config.rate_limit.max_requests = 1;
    let (router, store) = common::default_router(config);

    let first = router
        .clone()
        .oneshot(common::post_json("/api/general-enquiry", &common::valid_general_enquiry()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Same client, other protected endpoint: separate counters.
    let other_endpoint = router
        .clone()
        .oneshot(common::post_json(
            "/api/distributor-enquiry",
            &common::valid_distributor_enquiry(),
        ))
        .await
        .unwrap();
    assert_eq!(other_endpoint.status(), StatusCode::OK);

    let mut request = common::post_json("/api/general-enquiry", &common::valid_general_enquiry());
    request
        .headers_mut()
        .insert("x-forwarded-for", "5.6.7.8, 10.0.0.1".parse().unwrap());
    let other_client = router.clone().oneshot(request).await.unwrap();
    assert_eq!(other_client.status(), StatusCode::OK);

    let repeat = router
        .oneshot(common::post_json("/api/general-enquiry", &common::valid_general_enquiry()))
        .await
        .unwrap();
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(store.count(), 3);
}

#[tokio::test]
async fn test_unprotected_endpoints_are_not_limited() {
    let mut config = AppConfig::default();
    config.rate_limit.max_requests = 1;
    let (router, store) = common::default_router(config);

    for _ in 0..3 {
        let response = router
            .clone()
            .oneshot(common::post_json("/api/customer-feedback", &common::valid_feedback()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(store.count(), 3);
}

#[tokio::test]
async fn test_chat_can_be_protected_by_config() {
    let mut config = AppConfig::default();
    config.rate_limit.max_requests = 1;
    config.rate_limit.endpoints = vec![Endpoint::Chat];
    let (router, _) = common::default_router(config);
    let body = serde_json::json!({ "prompt": "How do I make appam?" });

    let first = router
        .clone()
        .oneshot(common::post_json("/api/chat", &body))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .oneshot(common::post_json("/api/chat", &body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    let (router, store) = common::default_router(config);

    for _ in 0..8 {
        let response = router
            .clone()
            .oneshot(common::post_json("/api/general-enquiry", &common::valid_general_enquiry()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(store.count(), 8);
}
