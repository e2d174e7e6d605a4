// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Remote image download used by the local backend

use base64::{engine::general_purpose::STANDARD, Engine as _};
use embed_vec_server::embeddings::image_source::{decode_image_bytes, ImageSource};
use embed_vec_server::embeddings::ImageError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// 1x1 red PNG image (base64)
const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

#[tokio::test]
async fn test_fetch_and_decode_remote_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cat.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(STANDARD.decode(TINY_PNG_BASE64).unwrap()),
        )
        .mount(&server)
        .await;

    let source = ImageSource::parse(&format!("{}/cat.png", server.uri()));
    assert!(matches!(source, ImageSource::Remote(_)));

    let bytes = source.load_bytes(&reqwest::Client::new()).await.unwrap();
    let (img, info) = decode_image_bytes(&bytes).unwrap();
    assert_eq!((info.width, info.height), (1, 1));
    assert_eq!(img.width(), 1);
}

#[tokio::test]
async fn test_fetch_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = ImageSource::parse(&format!("{}/missing.png", server.uri()));
    let err = source
        .load_bytes(&reqwest::Client::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ImageError::FetchFailed { .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_fetched_non_image_fails_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not an image</html>"))
        .mount(&server)
        .await;

    let source = ImageSource::parse(&format!("{}/page", server.uri()));
    let bytes = source.load_bytes(&reqwest::Client::new()).await.unwrap();
    assert!(matches!(
        decode_image_bytes(&bytes).unwrap_err(),
        ImageError::UnsupportedFormat
    ));
}

#[tokio::test]
async fn test_oversized_download_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89u8; 4096]))
        .mount(&server)
        .await;

    let source = ImageSource::parse(&format!("{}/huge.png", server.uri()));
    let client = reqwest::Client::new();

    let err = source
        .load_bytes_with_limit(&client, 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, ImageError::TooLarge(4096, 1024)));

    let bytes = source.load_bytes_with_limit(&client, 4096).await.unwrap();
    assert_eq!(bytes.len(), 4096);
}
