// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the vision encoder
//!
//! Mirrors the CLIP image processor the nomic vision model ships with.

use anyhow::Result;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

/// Side of the square the encoder consumes
pub const VISION_INPUT_SIZE: u32 = 224;

/// CLIP normalization mean values
pub const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std values
pub const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Upper bound on the pixel count of the intermediate resized image
pub const MAX_RESIZED_PIXELS: u64 = 4096 * 4096;

/// Preprocess an image for the vision encoder
///
/// Steps:
/// 1. Convert to 8-bit RGB
/// 2. Resize so the shortest edge equals `VISION_INPUT_SIZE` (bicubic)
/// 3. Center crop to `VISION_INPUT_SIZE` x `VISION_INPUT_SIZE`
/// 4. Normalize: (pixel/255 - mean) / std
/// 5. Lay out as NCHW `[1, 3, H, W]`
pub fn preprocess_for_vision(image: &DynamicImage) -> Result<Array4<f32>> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let rgb = resize_shortest_edge_and_crop(&rgb, VISION_INPUT_SIZE)?.into_rgb8();

    let size = VISION_INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Ok(tensor)
}

/// Output size after scaling the shortest edge to `target`
///
/// The long edge is truncated, as the Python image processors do.
pub fn shortest_edge_size(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width <= height {
        let new_h = (target as u64 * height as u64 / width.max(1) as u64) as u32;
        (target, new_h.max(target))
    } else {
        let new_w = (target as u64 * width as u64 / height.max(1) as u64) as u32;
        (new_w.max(target), target)
    }
}

/// Resize by shortest edge, then take the centered `target` square
///
/// Fails when the resized image would exceed [`MAX_RESIZED_PIXELS`], which
/// only happens for extreme aspect ratios.
pub fn resize_shortest_edge_and_crop(image: &DynamicImage, target: u32) -> Result<DynamicImage> {
    let (orig_w, orig_h) = image.dimensions();
    let (new_w, new_h) = shortest_edge_size(orig_w, orig_h, target);
    if new_w as u64 * new_h as u64 > MAX_RESIZED_PIXELS {
        anyhow::bail!(
            "Image aspect ratio too extreme: {}x{} would resize to {}x{}",
            orig_w,
            orig_h,
            new_w,
            new_h
        );
    }

    let resized = image.resize_exact(new_w, new_h, FilterType::CatmullRom);

    let crop_x = (new_w - target) / 2;
    let crop_y = (new_h - target) / 2;

    Ok(resized.crop_imm(crop_x, crop_y, target, target))
}
