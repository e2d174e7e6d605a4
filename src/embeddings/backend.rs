// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding backends
//!
//! The HTTP layer only sees [`EmbeddingBackend`]. Two implementations exist:
//! [`LocalBackend`] runs ONNX models in-process, [`RemoteBackend`] forwards to
//! the DashScope multimodal embedding API with the caller's key.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::format::VectorFormat;
use super::image_source::{decode_image_bytes, file_to_data_uri, ImageSource};
use super::remote::{Content, DashScopeClient};
use super::text_model::OnnxTextModel;
use super::vision_model::OnnxVisionModel;

/// Something that turns text or an image reference into a vector
#[async_trait::async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Short identifier reported by `/health`
    fn name(&self) -> &'static str;

    /// How vectors from this backend are rendered
    fn vector_format(&self) -> VectorFormat;

    /// Whether requests must carry an `api_key`
    fn requires_api_key(&self) -> bool;

    async fn embed_text(&self, text: &str, api_key: Option<&str>) -> Result<Vec<f64>>;

    /// `url` is an `http...` URL or a server-local path
    async fn embed_image(&self, url: &str, api_key: Option<&str>) -> Result<Vec<f64>>;
}

fn widen(v: Vec<f32>) -> Vec<f64> {
    v.into_iter().map(f64::from).collect()
}

/// In-process ONNX text and vision models
pub struct LocalBackend {
    text_model: OnnxTextModel,
    vision_model: OnnxVisionModel,
    http: reqwest::Client,
}

impl LocalBackend {
    pub async fn load(
        text_model_dir: &Path,
        vision_model_dir: &Path,
        max_length: usize,
        intra_threads: usize,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let text_model = OnnxTextModel::new(text_model_dir, max_length, intra_threads)
            .await
            .context("Failed to load text model")?;
        let vision_model = OnnxVisionModel::new(vision_model_dir, intra_threads)
            .await
            .context("Failed to load vision model")?;
        let http = reqwest::Client::builder().timeout(fetch_timeout).build()?;

        info!(
            "Local backend ready: text {} dimensions, image {} dimensions",
            text_model.dimension(),
            vision_model.dimension()
        );

        Ok(Self {
            text_model,
            vision_model,
            http,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn vector_format(&self) -> VectorFormat {
        VectorFormat::Fixed10
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn embed_text(&self, text: &str, _api_key: Option<&str>) -> Result<Vec<f64>> {
        let embedding = self.text_model.embed(text).await?;
        Ok(widen(embedding))
    }

    async fn embed_image(&self, url: &str, _api_key: Option<&str>) -> Result<Vec<f64>> {
        let bytes = ImageSource::parse(url).load_bytes(&self.http).await?;
        let (image, info) = decode_image_bytes(&bytes)?;
        debug!(
            "Decoded {:?} image {}x{} ({} bytes)",
            info.format, info.width, info.height, info.size_bytes
        );
        let embedding = self.vision_model.embed(image).await?;
        Ok(widen(embedding))
    }
}

/// DashScope-backed embeddings
pub struct RemoteBackend {
    client: DashScopeClient,
    /// Used when a request carries no `api_key`
    default_api_key: Option<String>,
}

impl RemoteBackend {
    pub fn new(client: DashScopeClient, default_api_key: Option<String>) -> Self {
        Self {
            client,
            default_api_key: default_api_key.filter(|k| !k.is_empty()),
        }
    }

    fn resolve_key<'a>(&'a self, api_key: Option<&'a str>) -> Result<&'a str> {
        api_key
            .or(self.default_api_key.as_deref())
            .context("No API key supplied for the remote embedding API")
    }
}

#[async_trait::async_trait]
impl EmbeddingBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn vector_format(&self) -> VectorFormat {
        VectorFormat::Repr
    }

    fn requires_api_key(&self) -> bool {
        self.default_api_key.is_none()
    }

    async fn embed_text(&self, text: &str, api_key: Option<&str>) -> Result<Vec<f64>> {
        let key = self.resolve_key(api_key)?;
        debug!("Requesting {} text embedding", self.client.model_name());
        Ok(self.client.embed(Content::Text(text), key).await?)
    }

    async fn embed_image(&self, url: &str, api_key: Option<&str>) -> Result<Vec<f64>> {
        let key = self.resolve_key(api_key)?;
        debug!("Requesting {} image embedding", self.client.model_name());
        match ImageSource::parse(url) {
            ImageSource::Remote(url) => Ok(self.client.embed(Content::Image(&url), key).await?),
            ImageSource::Local(path) => {
                let data_uri = file_to_data_uri(&path).await?;
                Ok(self.client.embed(Content::Image(&data_uri), key).await?)
            }
        }
    }
}
