// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::embeddings::VectorFormat;
use serde::{Deserialize, Serialize};

/// Successful response of both embedding endpoints
///
/// ```json
/// {"embedding": "[0.0123456789 -0.0456789012 ...]"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// The vector rendered by the backend's [`VectorFormat`]
    pub embedding: String,
}

impl EmbedResponse {
    pub fn render(values: &[f64], format: VectorFormat) -> Self {
        Self {
            embedding: format.render(values),
        }
    }
}
