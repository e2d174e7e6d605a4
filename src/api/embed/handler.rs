// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Handlers for the two embedding endpoints
//!
//! Both follow the same steps: parse the body, check the key requirement of
//! the active backend, embed, render the vector. Any failure after parsing is
//! reported as an unexpected error.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use std::time::Instant;
use tracing::{debug, error};

use crate::api::embed::{EmbedResponse, ImgVecRequest, TextVecRequest};
use crate::api::http_server::AppState;
use crate::api::ApiError;

/// A body that cannot be read is an unexpected error, reported as JSON
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        ApiError::Unexpected(format!("failed to read request body: {}", rejection.body_text()))
    })
}

/// Returns the key to forward, or the missing-key error when the backend
/// needs one and the request has none
fn check_api_key(state: &AppState, api_key: Option<String>) -> Result<Option<String>, ApiError> {
    if api_key.is_none() && state.backend.requires_api_key() {
        return Err(ApiError::MissingKey("api_key".to_string()));
    }
    Ok(api_key)
}

/// POST /get_txt_vec
pub async fn txt_vec_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let request = TextVecRequest::from_json(&read_body(body)?)?;
    let api_key = check_api_key(&state, request.api_key)?;

    let start = Instant::now();
    let values = state
        .backend
        .embed_text(&request.data, api_key.as_deref())
        .await
        .map_err(|e| {
            error!("Text embedding failed: {:#}", e);
            ApiError::from(e)
        })?;

    debug!(
        dimension = values.len(),
        chars = request.data.chars().count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Text embedded"
    );

    Ok(Json(EmbedResponse::render(
        &values,
        state.backend.vector_format(),
    )))
}

/// POST /get_img_vec
pub async fn img_vec_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let request = ImgVecRequest::from_json(&read_body(body)?)?;
    let api_key = check_api_key(&state, request.api_key)?;

    let start = Instant::now();
    let values = state
        .backend
        .embed_image(&request.url, api_key.as_deref())
        .await
        .map_err(|e| {
            error!("Image embedding failed for {}: {:#}", request.url, e);
            ApiError::from(e)
        })?;

    debug!(
        dimension = values.len(),
        url = %request.url,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Image embedded"
    );

    Ok(Json(EmbedResponse::render(
        &values,
        state.backend.vector_format(),
    )))
}
