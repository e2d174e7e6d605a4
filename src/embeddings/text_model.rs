// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Text Embedding Model
//!
//! Wraps ONNX Runtime for sentence-transformer style text encoders
//! (nomic-embed-text-v1.5 exported to ONNX).
//!
//! Features:
//! - ONNX model loading from a model directory
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - Tokenization with truncation to the model's maximum sequence length
//! - Attention-masked mean pooling followed by L2 normalization
//! - Output dimension discovered from the model itself

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView2, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// File names expected inside a text model directory
pub const TEXT_MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// ONNX-based text embedding model
///
/// # Thread Safety
/// All fields are wrapped in Arc for cheap cloning; the session is guarded by
/// a mutex because ONNX Runtime needs exclusive access to run it.
#[derive(Clone)]
pub struct OnnxTextModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    max_length: usize,
    /// Whether the graph declares a `token_type_ids` input
    uses_token_type_ids: bool,
}

impl std::fmt::Debug for OnnxTextModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .finish_non_exhaustive()
    }
}

impl OnnxTextModel {
    /// Loads `model.onnx` and `tokenizer.json` from `model_dir`
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The validation inference does not produce `[batch, seq_len, hidden]`
    pub async fn new<P: AsRef<Path>>(
        model_dir: P,
        max_length: usize,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let model_path = model_dir.join(TEXT_MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "text-model".to_string());

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("Initializing ONNX text model {} ", model_name);

        let cuda_result = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&model_path);

        let session = match cuda_result {
            Ok(s) => {
                info!("CUDA execution provider initialized for {}", model_name);
                s
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {}", e);
                warn!("Falling back to CPU execution provider");
                Session::builder()
                    .context("Failed to create session builder")?
                    .with_execution_providers([CPUExecutionProvider::default().build()])
                    .context("Failed to set CPU execution provider")?
                    .with_optimization_level(GraphOptimizationLevel::Level3)
                    .context("Failed to set optimization level")?
                    .with_intra_threads(intra_threads)
                    .context("Failed to set intra threads")?
                    .commit_from_file(&model_path)
                    .context(format!(
                        "Failed to load ONNX model from {}",
                        model_path.display()
                    ))?
            }
        };

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
            max_length,
            uses_token_type_ids,
        };

        // Probe the hidden size with a real inference
        let probe = model
            .embed_blocking("validation test")
            .context("Validation inference failed")?;
        if probe.is_empty() {
            anyhow::bail!("Model {} produced an empty embedding", model.model_name);
        }
        model.dimension = probe.len();

        info!(
            "ONNX text model {} loaded ({} dimensions, max {} tokens)",
            model.model_name, model.dimension, model.max_length
        );

        Ok(model)
    }

    /// Generates a normalized embedding for one text
    ///
    /// Inference runs on the blocking thread pool.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.embed_blocking(&text))
            .await
            .map_err(|e| anyhow::anyhow!("Text embedding task failed: {}", e))?
    }

    /// Synchronous embedding: tokenize, run, mean-pool, normalize
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();
        debug!("Tokenized text into {} tokens", seq_len);

        let attention_mask_for_pooling = attention_mask.clone();

        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask)
            .context("Failed to create attention_mask array")?;

        let mut session_guard = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Text model session lock poisoned"))?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids_array = Array2::from_shape_vec((1, seq_len), vec![0i64; seq_len])
                .context("Failed to create token_type_ids array")?;
            session_guard.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids_array)?,
                "attention_mask" => Value::from_array(attention_mask_array)?,
                "token_type_ids" => Value::from_array(token_type_ids_array)?
            ])?
        } else {
            session_guard.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids_array)?,
                "attention_mask" => Value::from_array(attention_mask_array)?
            ])?
        };

        // Use index [0] since exported models name their outputs differently
        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = output_array.shape().to_vec();
        if shape.len() != 3 {
            anyhow::bail!(
                "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, hidden])",
                shape
            );
        }

        let token_embeddings = output_array
            .index_axis(Axis(0), 0)
            .into_dimensionality::<ndarray::Ix2>()
            .context("Failed to view token embeddings")?;

        let mut pooled = mean_pool(token_embeddings, &attention_mask_for_pooling);
        l2_normalize(&mut pooled);

        if self.dimension != 0 && pooled.len() != self.dimension {
            anyhow::bail!(
                "Unexpected embedding dimension: {} (expected {})",
                pooled.len(),
                self.dimension
            );
        }

        Ok(pooled)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Averages token embeddings `[seq_len, hidden]`, weighting each row by its
/// attention mask entry so padding is ignored
pub fn mean_pool(token_embeddings: ArrayView2<'_, f32>, attention_mask: &[i64]) -> Vec<f32> {
    let (seq_len, hidden_dim) = token_embeddings.dim();

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for i in 0..seq_len.min(attention_mask.len()) {
        let mask_value = attention_mask[i] as f32;
        sum_mask += mask_value;
        for j in 0..hidden_dim {
            pooled[j] += token_embeddings[[i, j]] * mask_value;
        }
    }

    for val in &mut pooled {
        *val /= sum_mask.max(1e-9);
    }

    pooled
}

/// Scales `v` to unit length; a zero vector is left untouched
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-12);
    for value in v.iter_mut() {
        *value /= norm;
    }
}
