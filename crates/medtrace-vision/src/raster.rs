// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster helpers: decoding, grayscale conversion, bicubic sampling and
// rotation, cropping, scaling, and PNG encoding. Operates on in-memory images
// using the `image` crate.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use medtrace_core::error::{MedtraceError, Result};
use tracing::{debug, info, instrument};

// -- Decoding / encoding ------------------------------------------------------

/// Load an image from a file path.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let img = image::open(path.as_ref()).map_err(|err| {
        MedtraceError::ImageDecode(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    Ok(img)
}

/// Decode raw encoded bytes (JPEG, PNG, etc.).
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data)
        .map_err(|err| MedtraceError::ImageDecode(format!("failed to decode image: {}", err)))?;
    debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
    Ok(img)
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| MedtraceError::ImageError(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Write an image to a file. The format is inferred from the file extension.
pub fn save(image: &DynamicImage, path: impl AsRef<Path>) -> Result<()> {
    image.save(path.as_ref()).map_err(|err| {
        MedtraceError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

// -- Colour -------------------------------------------------------------------

/// Convert to 8-bit luma with ITU-R BT.601 weights (0.299, 0.587, 0.114).
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([luma.min(255) as u8])
    })
}

// -- Sampling / geometry ------------------------------------------------------

/// Cubic convolution weight (Keys kernel, a = -0.75).
fn cubic_weight(t: f32) -> f32 {
    const A: f32 = -0.75;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// Bicubic sample at a sub-pixel position; coordinates outside the image
/// replicate the nearest edge pixel.
pub fn sample_bicubic(image: &GrayImage, x: f32, y: f32) -> u8 {
    let (w, h) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let max_x = w as i64 - 1;
    let max_y = h as i64 - 1;

    let mut acc = 0.0f32;
    for j in -1..=2i64 {
        let wy = cubic_weight(fy - j as f32);
        let sy = (y0 as i64 + j).clamp(0, max_y) as u32;
        for i in -1..=2i64 {
            let wx = cubic_weight(fx - i as f32);
            let sx = (x0 as i64 + i).clamp(0, max_x) as u32;
            acc += wx * wy * image.get_pixel(sx, sy).0[0] as f32;
        }
    }
    acc.round().clamp(0.0, 255.0) as u8
}

/// Rotate about the image centre by `degrees` (positive = counter-clockwise
/// as displayed), keeping the original canvas size. Bicubic interpolation;
/// pixels that map outside the source replicate the border instead of
/// introducing a fill colour.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn rotate_replicate(image: &GrayImage, degrees: f32) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || degrees.abs() < 1e-3 {
        return image.clone();
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (w / 2) as f32;
    let cy = (h / 2) as f32;

    debug!(degrees, "Rotating with border replication");
    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        // Inverse mapping: undo a counter-clockwise turn in y-down coordinates.
        let sx = cx + dx * cos - dy * sin;
        let sy = cy + dx * sin + dy * cos;
        Luma([sample_bicubic(image, sx, sy)])
    })
}

/// Crop a rectangular region. Values are clamped to image bounds.
pub fn crop(image: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> GrayImage {
    let (img_w, img_h) = image.dimensions();
    let safe_x = x.min(img_w);
    let safe_y = y.min(img_h);
    let safe_w = width.min(img_w - safe_x);
    let safe_h = height.min(img_h - safe_y);
    imageops::crop_imm(image, safe_x, safe_y, safe_w, safe_h).to_image()
}

/// Scale by `factor` with cubic (Catmull-Rom) filtering.
pub fn scale_cubic(image: &GrayImage, factor: f32) -> GrayImage {
    let new_w = ((image.width() as f32 * factor).round() as u32).max(1);
    let new_h = ((image.height() as f32 * factor).round() as u32).max(1);
    imageops::resize(image, new_w, new_h, FilterType::CatmullRom)
}
