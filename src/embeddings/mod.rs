// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding generation
//!
//! Local ONNX text/vision models, the DashScope remote client, image loading
//! and the string rendering of result vectors.

pub mod backend;
pub mod format;
pub mod image_source;
pub mod preprocessing;
pub mod remote;
pub mod text_model;
pub mod vision_model;

pub use backend::{EmbeddingBackend, LocalBackend, RemoteBackend};
pub use format::{parse_vector_string, VectorFormat};
pub use image_source::{ImageError, ImageSource};
pub use remote::{Content, DashScopeClient, RemoteApiError};
pub use text_model::OnnxTextModel;
pub use vision_model::OnnxVisionModel;
