// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tamper Analyzer: scores how disturbed the foil surface looks.
//
// Two cues are blended: edge density from a Canny edge map (cuts, creases,
// re-sealed seams) and the spread of uniform local binary patterns (surface
// texture that no longer matches factory-pressed foil). The block of the edge
// map with the most edge energy is reported as the suspicious region.

use image::GrayImage;
use imageproc::edges::canny;
use medtrace_core::config::TamperConfig;
use medtrace_core::types::{Region, TamperAssessment};
use tracing::{debug, info, instrument};

/// Assessment plus the intermediate values behind it.
#[derive(Debug, Clone)]
pub struct TamperAnalysis {
    pub assessment: TamperAssessment,
    /// Canny edge map (0 or 255 per pixel).
    pub edges: GrayImage,
    /// Mean edge-map intensity before gain and clamping.
    pub edge_score: f64,
    /// Population variance of the LBP codes.
    pub texture_variance: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TamperAnalyzer {
    config: TamperConfig,
}

impl TamperAnalyzer {
    pub fn new(config: TamperConfig) -> Self {
        Self { config }
    }

    /// Score a conditioned frame. Pure: the same raster always yields the same
    /// assessment.
    pub fn analyze(&self, gray: &GrayImage) -> TamperAssessment {
        self.analyze_detailed(gray).assessment
    }

    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn analyze_detailed(&self, gray: &GrayImage) -> TamperAnalysis {
        let c = &self.config;
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return TamperAnalysis {
                assessment: TamperAssessment {
                    score: 0.0,
                    edge_norm: 0.0,
                    texture_norm: 0.0,
                    suspicious_region: None,
                },
                edges: gray.clone(),
                edge_score: 0.0,
                texture_variance: 0.0,
            };
        }

        let edges = canny(gray, c.canny_low, c.canny_high);
        let edge_score = mean_intensity(&edges);
        let edge_norm = (c.edge_gain * edge_score).min(1.0);
        debug!(edge_score, edge_norm, "Edge density measured");

        let codes = uniform_lbp(gray, c.lbp_points, c.lbp_radius);
        let texture_variance = variance(&codes);
        let texture_norm = ((1.0 + texture_variance).ln() / c.texture_divisor).min(1.0);
        debug!(texture_variance, texture_norm, "Texture variance measured");

        let blend = c.edge_weight * edge_norm + c.texture_weight * texture_norm;
        let score = (blend * 100.0).clamp(0.0, 100.0);
        let suspicious_region = densest_block(&edges, c.block_size);
        info!(score, region = ?suspicious_region, "Tamper analysis complete");

        TamperAnalysis {
            assessment: TamperAssessment {
                score,
                edge_norm,
                texture_norm,
                suspicious_region,
            },
            edges,
            edge_score,
            texture_variance,
        }
    }
}

fn mean_intensity(img: &GrayImage) -> f64 {
    let total: u64 = img.as_raw().iter().map(|&v| v as u64).sum();
    total as f64 / img.as_raw().len() as f64
}

// -- Local binary patterns ----------------------------------------------------

/// Uniform, rotation-invariant LBP code for every pixel, row-major.
///
/// `points` neighbours are sampled on a circle of `radius` with bilinear
/// interpolation; samples outside the image read as 0. A neighbour sets its bit
/// when it is at least the centre value. Codes with at most two bit changes
/// along the neighbour sequence are the count of set bits (0..=P); all others
/// collapse to P + 1.
pub fn uniform_lbp(gray: &GrayImage, points: u32, radius: f32) -> Vec<u32> {
    let (w, h) = gray.dimensions();
    let offsets: Vec<(f64, f64)> = (0..points)
        .map(|p| {
            let theta = 2.0 * std::f64::consts::PI * p as f64 / points as f64;
            let r = radius as f64;
            (round5(-r * theta.sin()), round5(r * theta.cos()))
        })
        .collect();

    let mut codes = Vec::with_capacity((w * h) as usize);
    let mut bits = vec![false; points as usize];
    for y in 0..h {
        for x in 0..w {
            let center = gray.get_pixel(x, y).0[0] as f64;
            for (bit, &(dr, dc)) in bits.iter_mut().zip(&offsets) {
                *bit = bilinear_or_zero(gray, y as f64 + dr, x as f64 + dc) - center >= 0.0;
            }
            let changes = bits.windows(2).filter(|pair| pair[0] != pair[1]).count();
            codes.push(if changes <= 2 {
                bits.iter().filter(|&&b| b).count() as u32
            } else {
                points + 1
            });
        }
    }
    codes
}

fn round5(v: f64) -> f64 {
    (v * 1e5).round() / 1e5
}

fn bilinear_or_zero(gray: &GrayImage, r: f64, c: f64) -> f64 {
    let pixel = |row: f64, col: f64| {
        if row < 0.0 || col < 0.0 || row >= gray.height() as f64 || col >= gray.width() as f64 {
            0.0
        } else {
            gray.get_pixel(col as u32, row as u32).0[0] as f64
        }
    };
    let (min_r, max_r) = (r.floor(), r.ceil());
    let (min_c, max_c) = (c.floor(), c.ceil());
    let dr = r - min_r;
    let dc = c - min_c;
    let top = (1.0 - dc) * pixel(min_r, min_c) + dc * pixel(min_r, max_c);
    let bottom = (1.0 - dc) * pixel(max_r, min_c) + dc * pixel(max_r, max_c);
    (1.0 - dr) * top + dr * bottom
}

/// Population variance.
pub fn variance(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
}

// -- Region search ------------------------------------------------------------

/// The `block`×`block` tile of the edge map with the most edge energy.
///
/// Tiles are laid on a non-overlapping grid from the top-left corner and only
/// tiles lying wholly inside the image are considered, in row-major order. A
/// later tile must beat the current best strictly, so ties keep the earlier
/// one and tiles without any edge never qualify.
pub fn densest_block(edges: &GrayImage, block: u32) -> Option<Region> {
    let (w, h) = edges.dimensions();
    if block == 0 {
        return None;
    }
    let mut best: Option<Region> = None;
    let mut best_energy = 0u64;

    let mut y = 0;
    while y + block <= h {
        let mut x = 0;
        while x + block <= w {
            let mut energy = 0u64;
            for by in y..y + block {
                for bx in x..x + block {
                    energy += edges.get_pixel(bx, by).0[0] as u64;
                }
            }
            if energy > best_energy {
                best_energy = energy;
                best = Some(Region { x, y, size: block });
            }
            x += block;
        }
        y += block;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(w: u32, h: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            Luma([if (x / cell + y / cell) % 2 == 0 { 20 } else { 235 }])
        })
    }

    fn paint_block(img: &mut GrayImage, x0: u32, y0: u32, size: u32, count: u32) {
        let mut painted = 0;
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                if painted < count {
                    img.put_pixel(x, y, Luma([255]));
                    painted += 1;
                }
            }
        }
    }

    #[test]
    fn black_frame_scores_zero() {
        let assessment = TamperAnalyzer::default().analyze(&GrayImage::new(120, 120));
        assert_eq!(assessment.score, 0.0);
        assert_eq!(assessment.suspicious_region, None);
    }

    #[test]
    fn empty_frame_scores_zero() {
        let assessment = TamperAnalyzer::default().analyze(&GrayImage::new(0, 0));
        assert_eq!(assessment.score, 0.0);
    }

    #[test]
    fn busy_surface_saturates_edge_cue() {
        let analysis = TamperAnalyzer::default().analyze_detailed(&checkerboard(180, 120, 6));
        assert_eq!(analysis.assessment.edge_norm, 1.0);
        assert!(analysis.assessment.score >= 60.0);
        assert!(analysis.assessment.score <= 100.0);
        assert!(analysis.assessment.suspicious_region.is_some());
    }

    #[test]
    fn score_stays_in_bounds() {
        let img =
            GrayImage::from_fn(97, 61, |x, y| Luma([((x * 31 + y * 17 + x * y) % 256) as u8]));
        let a = TamperAnalyzer::default().analyze(&img);
        assert!((0.0..=100.0).contains(&a.score));
        assert!((0.0..=1.0).contains(&a.edge_norm));
        assert!((0.0..=1.0).contains(&a.texture_norm));
    }

    #[test]
    fn analysis_is_deterministic() {
        let img = checkerboard(130, 70, 9);
        let analyzer = TamperAnalyzer::default();
        assert_eq!(analyzer.analyze(&img), analyzer.analyze(&img));
    }

    #[test]
    fn equal_blocks_keep_first_in_row_major_order() {
        let mut edges = GrayImage::new(180, 120);
        paint_block(&mut edges, 120, 0, 60, 10);
        paint_block(&mut edges, 0, 60, 60, 10);
        assert_eq!(densest_block(&edges, 60), Some(Region { x: 120, y: 0, size: 60 }));
    }

    #[test]
    fn later_block_must_be_strictly_denser() {
        let mut edges = GrayImage::new(180, 120);
        paint_block(&mut edges, 0, 0, 60, 10);
        paint_block(&mut edges, 60, 60, 60, 11);
        assert_eq!(densest_block(&edges, 60), Some(Region { x: 60, y: 60, size: 60 }));
    }

    #[test]
    fn partial_blocks_are_ignored() {
        let mut edges = GrayImage::new(130, 60);
        paint_block(&mut edges, 120, 0, 10, 100);
        assert_eq!(densest_block(&edges, 60), None);
    }

    #[test]
    fn frame_smaller_than_block_has_no_region() {
        let edges = GrayImage::from_pixel(59, 200, Luma([255]));
        assert_eq!(densest_block(&edges, 60), None);
    }

    #[test]
    fn exact_fit_block_is_considered() {
        let edges = GrayImage::from_pixel(60, 60, Luma([255]));
        assert_eq!(densest_block(&edges, 60), Some(Region { x: 0, y: 0, size: 60 }));
    }

    #[test]
    fn lbp_dark_centre_is_all_ones() {
        let mut img = GrayImage::from_pixel(3, 3, Luma([100]));
        img.put_pixel(1, 1, Luma([50]));
        assert_eq!(uniform_lbp(&img, 8, 1.0)[4], 8);
    }

    #[test]
    fn lbp_bright_centre_is_all_zeros() {
        let mut img = GrayImage::from_pixel(3, 3, Luma([100]));
        img.put_pixel(1, 1, Luma([150]));
        assert_eq!(uniform_lbp(&img, 8, 1.0)[4], 0);
    }

    #[test]
    fn lbp_non_uniform_pattern_collapses() {
        let mut img = GrayImage::new(3, 3);
        img.put_pixel(1, 1, Luma([100]));
        img.put_pixel(0, 1, Luma([200]));
        img.put_pixel(2, 1, Luma([200]));
        assert_eq!(uniform_lbp(&img, 8, 1.0)[4], 9);
    }

    #[test]
    fn variance_is_population_variance() {
        assert_eq!(variance(&[2, 4, 4, 4, 5, 5, 7, 9]), 4.0);
        assert_eq!(variance(&[]), 0.0);
    }
}
