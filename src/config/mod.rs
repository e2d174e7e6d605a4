// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration
//!
//! Every option can be given on the command line or through the environment
//! (a `.env` file is loaded first by the binaries).

use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::embeddings::remote::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::embeddings::{DashScopeClient, EmbeddingBackend, LocalBackend, RemoteBackend};

/// Which embedding implementation serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// ONNX text and vision models loaded in-process
    Local,
    /// DashScope multimodal embedding API
    Remote,
}

/// Embedding vector server
#[derive(Parser, Debug, Clone)]
#[command(name = "embed-vec-server")]
#[command(version)]
#[command(about = "Serves /get_txt_vec and /get_img_vec over HTTP", long_about = None)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "EMBED_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "EMBED_PORT", default_value_t = 8010)]
    pub port: u16,

    /// Embedding backend
    #[arg(long, env = "EMBED_BACKEND", value_enum, default_value_t = BackendKind::Local)]
    pub backend: BackendKind,

    #[command(flatten)]
    pub local: LocalArgs,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

/// Options of the local backend
#[derive(Args, Debug, Clone)]
pub struct LocalArgs {
    /// Directory holding the text model.onnx and tokenizer.json
    #[arg(long, env = "TEXT_MODEL_DIR", default_value = "./models/nomic-embed-text-v1.5")]
    pub text_model_dir: PathBuf,

    /// Directory holding the vision model.onnx
    #[arg(long, env = "VISION_MODEL_DIR", default_value = "./models/nomic-embed-vision-v1.5")]
    pub vision_model_dir: PathBuf,

    /// Maximum tokens per text; longer input is truncated
    #[arg(long, env = "TEXT_MAX_LENGTH", default_value_t = 8192)]
    pub max_length: usize,

    /// ONNX Runtime intra-op threads per session
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

/// Options of the remote backend
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// DashScope base URL
    #[arg(long, env = "DASHSCOPE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub remote_endpoint: String,

    /// DashScope embedding model
    #[arg(long, env = "DASHSCOPE_MODEL", default_value = DEFAULT_MODEL)]
    pub remote_model: String,

    /// Key used when a request carries no api_key
    #[arg(long, env = "DASHSCOPE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Timeout for outbound HTTP calls (remote API and image downloads)
    #[arg(long, env = "REMOTE_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl ServerArgs {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    /// Loads models or configures the API client for the selected backend
    pub async fn build_backend(&self) -> Result<Arc<dyn EmbeddingBackend>> {
        match self.backend {
            BackendKind::Local => {
                info!(
                    "Loading local models: text={}, vision={}",
                    self.local.text_model_dir.display(),
                    self.local.vision_model_dir.display()
                );
                let backend = LocalBackend::load(
                    &self.local.text_model_dir,
                    &self.local.vision_model_dir,
                    self.local.max_length,
                    self.local.intra_threads,
                    self.timeout(),
                )
                .await?;
                Ok(Arc::new(backend))
            }
            BackendKind::Remote => {
                let client = DashScopeClient::new(
                    &self.remote.remote_endpoint,
                    &self.remote.remote_model,
                    self.timeout(),
                )?;
                if self.remote.api_key.is_none() {
                    info!("No server API key configured; requests must carry api_key");
                }
                Ok(Arc::new(RemoteBackend::new(
                    client,
                    self.remote.api_key.clone(),
                )))
            }
        }
    }
}
