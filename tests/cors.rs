//! Origin gate behaviour over the full router.

use axum::http::{header, Method, StatusCode};
use ris_foods_api::config::AppConfig;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_preflight_returns_no_content() {
    let (router, store) = common::default_router(AppConfig::default());

    let response = router
        .oneshot(common::request(
            Method::OPTIONS,
            "/api/general-enquiry",
            Some(common::ALLOWED_ORIGIN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], common::ALLOWED_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    assert_eq!(store.count(), 0);
}

#[tokio::test]
async fn test_preview_origin_is_echoed() {
    let (router, _) = common::default_router(AppConfig::default());
    let origin = "https://ris-foods-preview-42.vercel.app";

    let response = router
        .oneshot(common::request(Method::OPTIONS, "/api/chat", Some(origin)))
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], origin);
    assert_eq!(response.headers()[header::VARY], "Origin");
}

#[tokio::test]
async fn test_unknown_origin_gets_no_credentials() {
    let (router, store) = common::default_router(AppConfig::default());

    let mut request = common::post_json("/api/general-enquiry", &common::valid_general_enquiry());
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example".parse().unwrap());

    let response = router.oneshot(request).await.unwrap();

    // The request is served; the browser refuses to expose the response.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    assert_eq!(response.headers()[header::VARY], "Origin");
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn test_extra_origin_from_config() {
    let mut config = AppConfig::default();
    config.cors.extra_origins.push("https://shop.example".to_string());
    let (router, _) = common::default_router(config);

    let response = router
        .oneshot(common::request(
            Method::OPTIONS,
            "/api/customer-feedback",
            Some("https://shop.example"),
        ))
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://shop.example"
    );
}

#[tokio::test]
async fn test_wrong_method_gets_cors_headers_and_405() {
    let (router, _) = common::default_router(AppConfig::default());

    let response = router
        .oneshot(common::request(
            Method::GET,
            "/api/customer-feedback",
            Some(common::ALLOWED_ORIGIN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        common::ALLOWED_ORIGIN
    );
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "Method not allowed");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (router, _) = common::default_router(AppConfig::default());

    let response = router
        .oneshot(common::request(Method::POST, "/api/orders", Some(common::ALLOWED_ORIGIN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(common::json_body(response).await["error"], "Not found");
}
