// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! DashScope multimodal embedding client

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://dashscope.aliyuncs.com";
pub const DEFAULT_MODEL: &str = "multimodal-embedding-v1";
const EMBEDDING_PATH: &str =
    "/api/v1/services/embeddings/multimodal-embedding/multimodal-embedding";

// --- DashScope serde structs ---

#[derive(serde::Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(serde::Serialize)]
struct EmbeddingInput<'a> {
    contents: Vec<Content<'a>>,
}

/// One item of multimodal input
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Content<'a> {
    Text(&'a str),
    /// A URL or a `data:image/...;base64,` URI
    Image(&'a str),
}

#[derive(serde::Deserialize)]
struct EmbeddingResponse {
    output: Option<EmbeddingOutput>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(serde::Deserialize)]
struct EmbeddingOutput {
    #[serde(default)]
    embeddings: Vec<EmbeddingItem>,
}

#[derive(serde::Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f64>,
}

/// Failures talking to the remote API
#[derive(Debug, Error)]
pub enum RemoteApiError {
    #[error("request failed")]
    Transport(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("malformed API response")]
    Decode(#[from] serde_json::Error),

    #[error("API response contained no embeddings")]
    NoEmbeddings,
}

/// Client for the DashScope multimodal embedding API
pub struct DashScopeClient {
    client: Client,
    endpoint: String,
    model_name: String,
}

impl DashScopeClient {
    pub fn new(endpoint: &str, model_name: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "DashScope client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Embeds one content item; a single attempt, no retry
    pub async fn embed(&self, content: Content<'_>, api_key: &str) -> Result<Vec<f64>, RemoteApiError> {
        let request = EmbeddingRequest {
            model: &self.model_name,
            input: EmbeddingInput {
                contents: vec![content],
            },
        };

        let response = self
            .client
            .post(format!("{}{}", self.endpoint, EMBEDDING_PATH))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("DashScope responded with HTTP {}", status);

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        let body: EmbeddingResponse = serde_json::from_str(&text)?;
        body.output
            .and_then(|output| output.embeddings.into_iter().next())
            .map(|item| item.embedding)
            .ok_or(RemoteApiError::NoEmbeddings)
    }
}

/// Builds the error for a non-2xx reply, whose body may not be JSON
fn status_error(status: u16, text: &str) -> RemoteApiError {
    match serde_json::from_str::<EmbeddingResponse>(text) {
        Ok(body) => RemoteApiError::Status {
            status,
            code: body.code.unwrap_or_else(|| "Unknown".to_string()),
            message: body.message.unwrap_or_default(),
        },
        Err(_) => RemoteApiError::Status {
            status,
            code: "Unknown".to_string(),
            message: text.trim().to_string(),
        },
    }
}
