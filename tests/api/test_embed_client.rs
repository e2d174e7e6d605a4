// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedClient against a live server bound to an ephemeral port

use embed_vec_server::client::EmbedClient;
use std::sync::Arc;

use super::support::{app_with, StubBackend};

async fn spawn_server(backend: StubBackend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_with(Arc::new(backend));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_text_vector_round_trip() {
    let base = spawn_server(StubBackend::new(vec![0.5, -0.25, 0.125])).await;
    let client = EmbedClient::new(&base).unwrap();

    let embedding = client.text_vector("hello", None).await.unwrap();
    assert_eq!(embedding.raw, "[0.5000000000 -0.2500000000 0.1250000000]");
    assert_eq!(embedding.values, vec![0.5, -0.25, 0.125]);
}

#[tokio::test]
async fn test_image_vector_with_key() {
    let base = spawn_server(StubBackend::new(vec![1.0]).requiring_key()).await;
    let client = EmbedClient::new(&base).unwrap();

    let embedding = client
        .image_vector("https://example.com/cat.png", Some("sk"))
        .await
        .unwrap();
    assert_eq!(embedding.raw, "[1.0]");
    assert_eq!(embedding.values, vec![1.0]);
}

#[tokio::test]
async fn test_server_error_message_surfaced() {
    let base = spawn_server(StubBackend::new(vec![1.0]).requiring_key()).await;
    let client = EmbedClient::new(&base).unwrap();

    let err = client.text_vector("hello", None).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("HTTP 400"), "{}", message);
    assert!(message.contains("Missing key in JSON parameters: 'api_key'"));
}

#[tokio::test]
async fn test_backend_failure_surfaced() {
    let base = spawn_server(StubBackend::new(vec![]).failing("boom")).await;
    let client = EmbedClient::new(&base).unwrap();

    let err = client.image_vector("x.png", None).await.unwrap_err();
    assert!(err.to_string().contains("An unexpected error occurred: boom"));
}
