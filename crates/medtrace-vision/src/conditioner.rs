// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image conditioning: turns a raw foil-strip photo into a clean grayscale
// raster. Specular glare is flattened with CLAHE, sensor noise smoothed with
// imageproc's edge-preserving bilateral filter, and isolated bright specks
// removed with a small grayscale opening.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::bilateral_filter;
use imageproc::morphology::{Mask, grayscale_open};
use medtrace_core::config::ConditionerConfig;
use medtrace_core::error::{MedtraceError, Result};
use tracing::{debug, info, instrument};

use crate::raster;

/// Single-channel grayscale raster produced by [`ImageConditioner`].
///
/// Owned by one pipeline run and shared read-only by the OCR and tamper
/// branches.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionedImage(GrayImage);

impl ConditionedImage {
    /// Wrap an already-conditioned grayscale raster.
    pub fn from_gray(gray: GrayImage) -> Self {
        Self(gray)
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageLuma8(self.0.clone())
    }
}

impl AsRef<GrayImage> for ConditionedImage {
    fn as_ref(&self) -> &GrayImage {
        &self.0
    }
}

/// Grayscale → CLAHE → bilateral filter → opening.
#[derive(Debug, Clone, Default)]
pub struct ImageConditioner {
    config: ConditionerConfig,
}

impl ImageConditioner {
    pub fn new(config: ConditionerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConditionerConfig {
        &self.config
    }

    // -- Conditioning ---------------------------------------------------------

    /// Condition a decoded photo.
    ///
    /// # Errors
    ///
    /// Returns [`MedtraceError::EmptyImage`] when either dimension is zero.
    #[instrument(skip_all, fields(width = raw.width(), height = raw.height()))]
    pub fn condition(&self, raw: &DynamicImage) -> Result<ConditionedImage> {
        if raw.width() == 0 || raw.height() == 0 {
            return Err(MedtraceError::EmptyImage {
                width: raw.width(),
                height: raw.height(),
            });
        }
        let c = &self.config;
        info!("Conditioning foil image");

        let gray = raster::to_gray(raw);
        let equalized = clahe(&gray, c.clahe_grid, c.clahe_clip_limit);
        debug!(grid = c.clahe_grid, clip_limit = c.clahe_clip_limit, "CLAHE applied");

        let smoothed = bilateral_filter(
            &equalized,
            c.bilateral_diameter,
            c.bilateral_sigma_color,
            c.bilateral_sigma_space,
        );
        debug!(diameter = c.bilateral_diameter, "Bilateral filter applied");

        let opened = open_specks(&smoothed, c.opening_size);
        debug!(size = c.opening_size, "Morphological opening applied");

        Ok(ConditionedImage(opened))
    }

    /// Decode encoded bytes and condition them.
    pub fn condition_bytes(&self, data: &[u8]) -> Result<ConditionedImage> {
        let raw = raster::decode(data)?;
        self.condition(&raw)
    }
}

// -- CLAHE --------------------------------------------------------------------

/// Contrast-limited adaptive histogram equalisation.
///
/// The image is split into a `grid`×`grid` tile grid. Each tile gets its own
/// equalisation lookup table built from a histogram whose bins are clipped at
/// `clip_limit` times the mean bin height, with the clipped excess spread back
/// across all bins. Every output pixel blends the lookup tables of the four
/// nearest tile centres bilinearly, so tile seams do not show.
pub fn clahe(gray: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 || grid == 0 {
        return gray.clone();
    }
    let tile_w = w.div_ceil(grid);
    let tile_h = h.div_ceil(grid);
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y).0[0] as usize] += 1;
                }
            }
            luts.push(tile_lut(&mut hist, (x1 - x0) * (y1 - y0), clip_limit));
        }
    }

    let lut = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];
    let neighbours = |pos: u32, tile: u32, tiles: u32| {
        let f = pos as f32 / tile as f32 - 0.5;
        let lo = f.floor();
        let frac = f - lo;
        let lo = lo as i64;
        let clamp = |t: i64| t.clamp(0, tiles as i64 - 1) as u32;
        (clamp(lo), clamp(lo + 1), frac)
    };

    GrayImage::from_fn(w, h, |x, y| {
        let (tx1, tx2, xa) = neighbours(x, tile_w, tiles_x);
        let (ty1, ty2, ya) = neighbours(y, tile_h, tiles_y);
        let v = gray.get_pixel(x, y).0[0] as usize;

        let top = lut(tx1, ty1)[v] as f32 * (1.0 - xa) + lut(tx2, ty1)[v] as f32 * xa;
        let bottom = lut(tx1, ty2)[v] as f32 * (1.0 - xa) + lut(tx2, ty2)[v] as f32 * xa;
        let blended = top * (1.0 - ya) + bottom * ya;
        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Clip, redistribute, and integrate one tile histogram into a lookup table.
fn tile_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }

    let batch = clipped / 256;
    let residual = (clipped - batch * 256) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for index in (0..256).step_by(step).take(residual) {
            hist[index] += 1;
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0u32;
    for (value, bin) in hist.iter().enumerate() {
        sum += bin;
        lut[value] = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// -- Opening ------------------------------------------------------------------

/// Grayscale opening with a `size`×`size` square, which erases bright specks
/// smaller than the square. `size` is odd; sizes past 511 are capped.
pub fn open_specks(gray: &GrayImage, size: u32) -> GrayImage {
    let radius = u8::try_from(size / 2).unwrap_or(u8::MAX);
    grayscale_open(gray, &Mask::square(radius))
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn std_dev(img: &GrayImage) -> f64 {
        let n = img.pixels().len() as f64;
        let mean = img.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
        (img.pixels().map(|p| (p.0[0] as f64 - mean).powi(2)).sum::<f64>() / n).sqrt()
    }

    #[test]
    fn empty_image_is_rejected() {
        let raw = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let err = ImageConditioner::default().condition(&raw).unwrap_err();
        assert!(matches!(err, MedtraceError::EmptyImage { width: 0, height: 0 }));
    }

    #[test]
    fn conditioned_image_keeps_dimensions() {
        let raw = DynamicImage::ImageRgb8(RgbImage::from_fn(37, 23, |x, y| {
            Rgb([(x * 6) as u8, (y * 9) as u8, 120])
        }));
        let out = ImageConditioner::default().condition(&raw).unwrap();
        assert_eq!((out.width(), out.height()), (37, 23));
    }

    #[test]
    fn conditioning_is_deterministic() {
        let raw = DynamicImage::ImageRgb8(RgbImage::from_fn(48, 32, |x, y| {
            Rgb([((x * 7 + y * 3) % 256) as u8, 90, ((x * y) % 256) as u8])
        }));
        let conditioner = ImageConditioner::default();
        assert_eq!(
            conditioner.condition(&raw).unwrap(),
            conditioner.condition(&raw).unwrap()
        );
    }

    #[test]
    fn clahe_keeps_flat_image_flat() {
        let img = GrayImage::from_pixel(64, 64, Luma([100u8]));
        let out = clahe(&img, 8, 2.0);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn clahe_stretches_low_contrast() {
        let img = GrayImage::from_fn(64, 64, |x, y| Luma([(110 + (x + y) % 20) as u8]));
        let out = clahe(&img, 8, 2.0);
        assert!(std_dev(&out) > std_dev(&img));
    }

    #[test]
    fn clahe_handles_images_smaller_than_grid() {
        let img = GrayImage::from_fn(5, 3, |x, _| Luma([(x * 40) as u8]));
        assert_eq!(clahe(&img, 8, 2.0).dimensions(), (5, 3));
    }

    #[test]
    fn bilateral_stage_preserves_step_edge() {
        let img = GrayImage::from_fn(30, 10, |x, _| Luma([if x < 15 { 20u8 } else { 220u8 }]));
        let c = ConditionerConfig::default();
        let out = bilateral_filter(
            &img,
            c.bilateral_diameter,
            c.bilateral_sigma_color,
            c.bilateral_sigma_space,
        );
        assert!(out.get_pixel(14, 5).0[0] < 30);
        assert!(out.get_pixel(15, 5).0[0] > 210);
        assert_eq!(out.get_pixel(2, 5).0[0], 20);
    }

    #[test]
    fn black_frame_conditions_without_panicking() {
        let raw = DynamicImage::ImageLuma8(GrayImage::new(64, 64));
        let out = ImageConditioner::default().condition(&raw).unwrap();
        let first = out.as_gray().get_pixel(0, 0).0[0];
        assert!(out.as_gray().pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn opening_removes_isolated_speck() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([40u8]));
        img.put_pixel(4, 4, Luma([250u8]));
        let opened = open_specks(&img, 3);
        assert!(opened.pixels().all(|p| p.0[0] == 40));
    }

    #[test]
    fn opening_keeps_areas_wider_than_the_square() {
        let mut img = GrayImage::from_pixel(12, 12, Luma([10u8]));
        for y in 2..9 {
            for x in 2..9 {
                img.put_pixel(x, y, Luma([200u8]));
            }
        }
        let opened = open_specks(&img, 3);
        assert_eq!(opened.get_pixel(5, 5).0[0], 200);
        assert_eq!(opened.get_pixel(2, 2).0[0], 200);
        assert_eq!(opened.get_pixel(0, 0).0[0], 10);
    }

    #[test]
    fn larger_opening_erases_wider_specks() {
        let mut img = GrayImage::from_pixel(15, 15, Luma([30u8]));
        for y in 6..9 {
            for x in 6..9 {
                img.put_pixel(x, y, Luma([240u8]));
            }
        }
        assert_eq!(open_specks(&img, 3).get_pixel(7, 7).0[0], 240);
        assert_eq!(open_specks(&img, 5).get_pixel(7, 7).0[0], 30);
    }

    #[test]
    fn condition_bytes_rejects_garbage() {
        let err = ImageConditioner::default()
            .condition_bytes(b"not a photo")
            .unwrap_err();
        assert!(matches!(err, MedtraceError::ImageDecode(_)));
    }
}
