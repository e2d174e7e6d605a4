// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading for the image embedding endpoint
//!
//! The `url` field of a request is either an `http(s)` URL, fetched with a
//! single GET, or a path on the server's filesystem.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Maximum image size (32MB)
pub const MAX_IMAGE_SIZE: usize = 32 * 1024 * 1024;

/// Errors raised while locating, reading or decoding an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Failed to fetch image from {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Failed to read image file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image information extracted during decoding
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Where an image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Anything starting with `http`
    Remote(String),
    /// Server-local file path
    Local(PathBuf),
}

impl ImageSource {
    pub fn parse(url: &str) -> Self {
        if url.starts_with("http") {
            ImageSource::Remote(url.to_string())
        } else {
            ImageSource::Local(PathBuf::from(url))
        }
    }

    /// Reads the raw image bytes, fetching remote URLs with `client`
    pub async fn load_bytes(&self, client: &reqwest::Client) -> Result<Vec<u8>, ImageError> {
        self.load_bytes_with_limit(client, MAX_IMAGE_SIZE).await
    }

    /// Like [`ImageSource::load_bytes`], giving up as soon as more than
    /// `max_bytes` would be held in memory
    pub async fn load_bytes_with_limit(
        &self,
        client: &reqwest::Client,
        max_bytes: usize,
    ) -> Result<Vec<u8>, ImageError> {
        match self {
            ImageSource::Remote(url) => fetch_limited(client, url, max_bytes).await,
            ImageSource::Local(path) => read_local_file(path, max_bytes).await,
        }
    }
}

async fn fetch_limited(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, ImageError> {
    debug!("Fetching image from {}", url);
    let fetch_failed = |message: String| ImageError::FetchFailed {
        url: url.to_string(),
        message,
    };

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fetch_failed(format!("HTTP {}", response.status())));
    }

    if let Some(length) = response.content_length() {
        if length > max_bytes as u64 {
            return Err(ImageError::TooLarge(length as usize, max_bytes));
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| fetch_failed(e.to_string()))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(ImageError::TooLarge(bytes.len() + chunk.len(), max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Reads a server-local image, checking its size before loading it
pub async fn read_local_file(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ImageError> {
    debug!("Reading image from {}", path.display());
    let read_failed = |source: std::io::Error| ImageError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(read_failed)?.len();
    if size > max_bytes as u64 {
        return Err(ImageError::TooLarge(size as usize, max_bytes));
    }
    tokio::fs::read(path).await.map_err(read_failed)
}

/// Decode raw image bytes
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Extension of `path` without the dot, or `""` when there is none
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Builds a `data:image/<ext>;base64,...` URI from a local file
///
/// The media subtype is the file extension as written, so `photo.JPG`
/// becomes `data:image/JPG;...`.
pub async fn file_to_data_uri(path: &Path) -> Result<String, ImageError> {
    let bytes = read_local_file(path, MAX_IMAGE_SIZE).await?;
    Ok(bytes_to_data_uri(&bytes, &file_extension(path)))
}

pub fn bytes_to_data_uri(bytes: &[u8], extension: &str) -> String {
    format!("data:image/{};base64,{}", extension, STANDARD.encode(bytes))
}
