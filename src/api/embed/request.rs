// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request bodies for `/get_txt_vec` and `/get_img_vec`
//!
//! An absent field is a missing key (400). Every other malformation, such as
//! a body that is not a JSON object or a value of the wrong type, is an
//! unexpected error (500).

use crate::api::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /get_txt_vec`
///
/// ```json
/// {"data": "a photo of a cat", "api_key": "sk-..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextVecRequest {
    /// Text to embed
    pub data: String,

    /// Pass-through key for the remote backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Body of `POST /get_img_vec`
///
/// ```json
/// {"url": "https://example.com/cat.png", "api_key": "sk-..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImgVecRequest {
    /// `http(s)` URL or server-local path
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl TextVecRequest {
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let params = parse_object(body)?;
        Ok(Self {
            data: required_str(&params, "data")?,
            api_key: optional_str(&params, "api_key")?,
        })
    }
}

impl ImgVecRequest {
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let params = parse_object(body)?;
        Ok(Self {
            url: required_str(&params, "url")?,
            api_key: optional_str(&params, "api_key")?,
        })
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Unexpected(format!("invalid JSON body: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Unexpected(format!(
            "JSON body must be an object, got {}",
            json_type(&other)
        ))),
    }
}

fn required_str(params: &Map<String, Value>, key: &str) -> Result<String, ApiError> {
    match params.get(key) {
        None => Err(ApiError::MissingKey(key.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ApiError::Unexpected(format!(
            "'{}' must be a string, got {}",
            key,
            json_type(other)
        ))),
    }
}

/// `null` counts as absent
fn optional_str(params: &Map<String, Value>, key: &str) -> Result<Option<String>, ApiError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ApiError::Unexpected(format!(
            "'{}' must be a string, got {}",
            key,
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
