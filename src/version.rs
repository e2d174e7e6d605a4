// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the embedding server

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Endpoints served by this version
pub const ENDPOINTS: &[&str] = &["/get_txt_vec", "/get_img_vec", "/health"];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Embedding Vector Server {}", VERSION_NUMBER)
}
