// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for the embedding endpoints
//!
//! Posts to a running server and turns the returned embedding string back
//! into floats, the way search backends consume it.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::api::{EmbedResponse, ErrorResponse, ImgVecRequest, TextVecRequest};
use crate::embeddings::parse_vector_string;

/// A decoded embedding together with the server's raw rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEmbedding {
    pub raw: String,
    pub values: Vec<f32>,
}

pub struct EmbedClient {
    client: Client,
    base_url: String,
}

impl EmbedClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Calls `/get_txt_vec`
    pub async fn text_vector(&self, data: &str, api_key: Option<&str>) -> Result<ClientEmbedding> {
        let request = TextVecRequest {
            data: data.to_string(),
            api_key: api_key.map(str::to_string),
        };
        self.post("/get_txt_vec", &request).await
    }

    /// Calls `/get_img_vec`
    pub async fn image_vector(&self, url: &str, api_key: Option<&str>) -> Result<ClientEmbedding> {
        let request = ImgVecRequest {
            url: url.to_string(),
            api_key: api_key.map(str::to_string),
        };
        self.post("/get_img_vec", &request).await
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<ClientEmbedding> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            anyhow::bail!("{} returned HTTP {}: {}", path, status.as_u16(), message);
        }

        let parsed: EmbedResponse =
            serde_json::from_str(&text).context("Malformed embedding response")?;
        let values = parse_vector_string(&parsed.embedding)?;

        Ok(ClientEmbedding {
            raw: parsed.embedding,
            values,
        })
    }
}
