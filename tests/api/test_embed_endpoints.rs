// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Endpoint behaviour of /get_txt_vec and /get_img_vec
//!
//! These tests verify that:
//! - Well-formed requests return 200 with a string embedding
//! - Absent required fields return 400 with the missing-key message
//! - Backend failures and malformed bodies return 500
//! - The embedding string follows the backend's format

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use super::support::{app_with, body_json, post_json, StubBackend};

#[tokio::test]
async fn test_txt_vec_success() {
    let backend = Arc::new(StubBackend::new(vec![0.5, -0.25, 0.0123456789012]));
    let app = app_with(backend.clone());

    let response = app
        .oneshot(post_json("/get_txt_vec", r#"{"data": "a cat on a sofa"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["embedding"].is_string());
    assert_eq!(
        json["embedding"],
        "[0.5000000000 -0.2500000000 0.0123456789]"
    );
    assert_eq!(
        backend.calls(),
        vec![("a cat on a sofa".to_string(), None)]
    );
}

#[tokio::test]
async fn test_img_vec_success() {
    let backend = Arc::new(StubBackend::new(vec![1.0, 2.0]));
    let app = app_with(backend.clone());

    let response = app
        .oneshot(post_json(
            "/get_img_vec",
            r#"{"url": "uploads/cat.png", "api_key": "ignored-locally"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["embedding"], "[1.0000000000 2.0000000000]");
    // The key is still forwarded; the local backend just ignores it
    assert_eq!(
        backend.calls(),
        vec![(
            "uploads/cat.png".to_string(),
            Some("ignored-locally".to_string())
        )]
    );
}

#[tokio::test]
async fn test_repr_format_backend() {
    let backend = Arc::new(StubBackend::new(vec![0.5, 1.0, -2e-5]).requiring_key());
    let app = app_with(backend);

    let response = app
        .oneshot(post_json(
            "/get_txt_vec",
            r#"{"data": "hello", "api_key": "sk-1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["embedding"], "[0.5 1.0 -2e-05]");
}

#[tokio::test]
async fn test_missing_data_returns_400() {
    let backend = Arc::new(StubBackend::new(vec![0.1]));
    let app = app_with(backend.clone());

    let response = app
        .oneshot(post_json("/get_txt_vec", r#"{"text": "wrong field"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!({"error": "Missing key in JSON parameters: 'data'"})
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_missing_url_returns_400() {
    let app = app_with(Arc::new(StubBackend::new(vec![0.1])));

    let response = app
        .oneshot(post_json("/get_img_vec", r#"{"data": "not an image"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing key in JSON parameters: 'url'");
}

#[tokio::test]
async fn test_missing_api_key_when_required() {
    let backend = Arc::new(StubBackend::new(vec![0.1]).requiring_key());

    let response = app_with(backend.clone())
        .oneshot(post_json("/get_img_vec", r#"{"url": "https://x/cat.png"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing key in JSON parameters: 'api_key'");

    // The content field is checked first
    let response = app_with(backend.clone())
        .oneshot(post_json("/get_txt_vec", r#"{}"#))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing key in JSON parameters: 'data'");

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_backend_failure_returns_500() {
    let backend = Arc::new(StubBackend::new(vec![]).failing("model exploded"));

    for (uri, body) in [
        ("/get_txt_vec", r#"{"data": "x"}"#),
        ("/get_img_vec", r#"{"url": "x.png"}"#),
    ] {
        let response = app_with(backend.clone())
            .oneshot(post_json(uri, body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "An unexpected error occurred: model exploded");
    }
}

#[tokio::test]
async fn test_malformed_body_returns_500() {
    let app = app_with(Arc::new(StubBackend::new(vec![0.1])));

    let response = app
        .clone()
        .oneshot(post_json("/get_txt_vec", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("An unexpected error occurred: invalid JSON body"));

    let response = app
        .oneshot(post_json("/get_txt_vec", r#"{"data": ["a", "b"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_large_body_is_accepted() {
    let backend = Arc::new(StubBackend::new(vec![0.5]));
    let app = app_with(backend.clone());

    let text = "a".repeat(3 * 1024 * 1024);
    let body = serde_json::json!({ "data": text }).to_string();

    let response = app
        .oneshot(post_json("/get_txt_vec", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["embedding"], "[0.5000000000]");
    assert_eq!(backend.calls()[0].0.len(), 3 * 1024 * 1024);
}

#[tokio::test]
async fn test_body_without_content_type_is_accepted() {
    let app = app_with(Arc::new(StubBackend::new(vec![0.25])));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/get_txt_vec")
        .body(Body::from(r#"{"data": "plain"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_method_not_allowed() {
    let app = app_with(Arc::new(StubBackend::new(vec![0.1])));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/get_txt_vec")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_backend() {
    let app = app_with(Arc::new(StubBackend::new(vec![0.1])));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "stub");
}
