// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic renderings: edge heatmap, suspicious-region outline, and OCR
// line boxes drawn over the frame.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use medtrace_core::types::{RecognizedLine, Region};

const REGION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LINE_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const REGION_THICKNESS: u32 = 3;

/// JET colour map: 0 → dark blue, 128 → green, 255 → dark red.
pub fn jet(value: u8) -> Rgb<u8> {
    let v = value as f32 / 255.0;
    let channel = |centre: f32| {
        ((1.5 - (4.0 * v - centre).abs()).clamp(0.0, 1.0) * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Colour an edge map (or any intensity raster) with the JET map.
pub fn heatmap(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| jet(gray.get_pixel(x, y).0[0]))
}

fn to_rgb(gray: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(gray.clone()).to_rgb8()
}

/// The frame with the suspicious block outlined in red. Without a region the
/// frame is returned unmarked.
pub fn outline_region(gray: &GrayImage, region: Option<Region>) -> RgbImage {
    let mut canvas = to_rgb(gray);
    let Some(region) = region else {
        return canvas;
    };
    for t in 0..REGION_THICKNESS {
        let side = region.size.saturating_sub(2 * t);
        if side == 0 {
            break;
        }
        let rect = Rect::at((region.x + t) as i32, (region.y + t) as i32).of_size(side, side);
        draw_hollow_rect_mut(&mut canvas, rect, REGION_COLOR);
    }
    canvas
}

/// The frame with every recognised line's quadrilateral drawn in green.
pub fn outline_lines<'a>(
    gray: &GrayImage,
    lines: impl IntoIterator<Item = &'a RecognizedLine>,
) -> RgbImage {
    let mut canvas = to_rgb(gray);
    for line in lines {
        let corners = line.quad.corners();
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            draw_line_segment_mut(&mut canvas, (a.x, a.y), (b.x, b.y), LINE_COLOR);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use medtrace_core::types::Quad;

    #[test]
    fn jet_endpoints() {
        assert_eq!(jet(0), Rgb([0, 0, 128]));
        assert_eq!(jet(255), Rgb([128, 0, 0]));
        let mid = jet(128);
        assert!(mid.0[1] > 250);
    }

    #[test]
    fn heatmap_keeps_dimensions() {
        let img = GrayImage::new(13, 7);
        assert_eq!(heatmap(&img).dimensions(), (13, 7));
    }

    #[test]
    fn region_outline_is_red() {
        let img = GrayImage::from_pixel(100, 100, Luma([50]));
        let out = outline_region(&img, Some(Region { x: 20, y: 20, size: 60 }));
        assert_eq!(*out.get_pixel(20, 20), REGION_COLOR);
        assert_eq!(*out.get_pixel(22, 50), REGION_COLOR);
        assert_eq!(*out.get_pixel(50, 50), Rgb([50, 50, 50]));
    }

    #[test]
    fn missing_region_leaves_frame_unmarked() {
        let img = GrayImage::from_pixel(10, 10, Luma([9]));
        let out = outline_region(&img, None);
        assert!(out.pixels().all(|p| *p == Rgb([9, 9, 9])));
    }

    #[test]
    fn line_boxes_are_drawn() {
        let img = GrayImage::new(40, 40);
        let line = RecognizedLine::new(Quad::from_rect(5.0, 5.0, 20.0, 10.0), "LOT 22", 1.0);
        let out = outline_lines(&img, [&line]);
        assert_eq!(*out.get_pixel(15, 5), LINE_COLOR);
        assert_eq!(*out.get_pixel(15, 10), Rgb([0, 0, 0]));
    }
}
