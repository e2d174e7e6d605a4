// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX vision encoder producing image embeddings
//!
//! The encoder's `last_hidden_state` is `[1, seq_len, hidden]`; the image
//! embedding is the first (CLS) token, L2-normalized so it lives in the same
//! space as the text model's output.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{Array4, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::{preprocess_for_vision, VISION_INPUT_SIZE};
use super::text_model::l2_normalize;

pub const VISION_MODEL_FILE: &str = "model.onnx";

/// Vision encoder model (CPU execution)
#[derive(Clone)]
pub struct OnnxVisionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxVisionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxVisionModel")
            .field("model_name", &self.model_name)
            .field("input_name", &self.input_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxVisionModel {
    /// Load the vision encoder from `model_dir/model.onnx`
    pub async fn new<P: AsRef<Path>>(model_dir: P, intra_threads: usize) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let model_path = model_dir.join(VISION_MODEL_FILE);
        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "vision-model".to_string());

        if !model_path.exists() {
            anyhow::bail!("Vision model not found: {}", model_path.display());
        }

        info!("Loading vision encoder from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&model_path)
            .context(format!(
                "Failed to load vision model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!("Vision encoder input: {}", input_name);

        let mut model = Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            model_name,
            dimension: 0,
        };

        let size = VISION_INPUT_SIZE as usize;
        let probe = model
            .encode(&Array4::zeros((1, 3, size, size)))
            .context("Validation inference failed")?;
        model.dimension = probe.len();

        info!(
            "Vision encoder {} loaded (CPU-only, {} dimensions)",
            model.model_name, model.dimension
        );

        Ok(model)
    }

    /// Embeds a decoded image on the blocking thread pool
    pub async fn embed(&self, image: DynamicImage) -> Result<Vec<f32>> {
        let model = self.clone();
        tokio::task::spawn_blocking(move || {
            let input = preprocess_for_vision(&image)?;
            model.encode(&input)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Image embedding task failed: {}", e))?
    }

    /// Runs the encoder on a preprocessed `[1, 3, H, W]` tensor
    pub fn encode(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Vision model session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Vision encoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let output_shape = output_tensor.shape().to_vec();
        debug!("Vision encoder output shape: {:?}", output_shape);

        let mut embedding: Vec<f32> = match output_shape.len() {
            // [batch, seq_len, hidden]: take the CLS token
            3 => output_tensor
                .index_axis(Axis(0), 0)
                .index_axis(Axis(0), 0)
                .iter()
                .copied()
                .collect(),
            // [batch, hidden]: already pooled
            2 => output_tensor.index_axis(Axis(0), 0).iter().copied().collect(),
            _ => anyhow::bail!("Unexpected vision encoder output shape: {:?}", output_shape),
        };

        l2_normalize(&mut embedding);

        if self.dimension != 0 && embedding.len() != self.dimension {
            anyhow::bail!(
                "Unexpected embedding dimension: {} (expected {})",
                embedding.len(),
                self.dimension
            );
        }

        Ok(embedding)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
