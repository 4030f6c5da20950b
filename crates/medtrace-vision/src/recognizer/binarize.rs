// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive Gaussian binarisation for the full-frame OCR pass.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Gaussian sigma for a square block of side `block_size`, matching the usual
/// derivation `0.3·((k − 1)·0.5 − 1) + 0.8`.
pub fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Adaptive threshold against the Gaussian-weighted local mean.
///
/// A pixel becomes white (255) when its value exceeds the local mean minus
/// `offset`, black (0) otherwise. Uneven lighting across the foil therefore
/// does not wipe out whole regions the way a single global cut-off would.
pub fn adaptive_gaussian_threshold(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let sigma = block_sigma(block_size).max(0.1);
    let mean = gaussian_blur_f32(gray, sigma);

    GrayImage::from_fn(w, h, |x, y| {
        let value = gray.get_pixel(x, y).0[0] as i32;
        let local = mean.get_pixel(x, y).0[0] as i32;
        Luma([if value > local - offset { 255 } else { 0 }])
    })
}
