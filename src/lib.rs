// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod embeddings;
pub mod version;

pub use api::{create_app, start_server, ApiError, AppState};
pub use client::{ClientEmbedding, EmbedClient};
pub use config::{BackendKind, ServerArgs};
pub use embeddings::{
    parse_vector_string, EmbeddingBackend, LocalBackend, RemoteBackend, VectorFormat,
};
