// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers for the API tests

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use embed_vec_server::api::{create_app, AppState};
use embed_vec_server::embeddings::{EmbeddingBackend, VectorFormat};
use std::sync::{Arc, Mutex};

/// Backend returning fixed vectors and recording what it was called with
pub struct StubBackend {
    pub vector: Vec<f64>,
    pub format: VectorFormat,
    pub needs_key: bool,
    pub fail_with: Option<String>,
    pub calls: Mutex<Vec<(String, Option<String>)>>,
}

impl StubBackend {
    pub fn new(vector: Vec<f64>) -> Self {
        Self {
            vector,
            format: VectorFormat::Fixed10,
            needs_key: false,
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn requiring_key(mut self) -> Self {
        self.needs_key = true;
        self.format = VectorFormat::Repr;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, input: &str, api_key: Option<&str>) -> anyhow::Result<Vec<f64>> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_string(), api_key.map(str::to_string)));
        match &self.fail_with {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(self.vector.clone()),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn vector_format(&self) -> VectorFormat {
        self.format
    }

    fn requires_api_key(&self) -> bool {
        self.needs_key
    }

    async fn embed_text(&self, text: &str, api_key: Option<&str>) -> anyhow::Result<Vec<f64>> {
        self.respond(text, api_key)
    }

    async fn embed_image(&self, url: &str, api_key: Option<&str>) -> anyhow::Result<Vec<f64>> {
        self.respond(url, api_key)
    }
}

pub fn app_with(backend: Arc<dyn EmbeddingBackend>) -> Router {
    create_app(AppState::new(backend))
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}
