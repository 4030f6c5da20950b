// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew estimation from the minimum-area rectangle around the foreground, and
// the matching corrective rotation.

use image::GrayImage;
use tracing::debug;

use crate::raster;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pt {
    x: f32,
    y: f32,
}

/// Rotation (degrees, positive = counter-clockwise) that levels the content.
///
/// Every pixel with intensity above zero counts as foreground. The minimum-area
/// rectangle around the foreground is found, its edge angle is measured
/// counter-clockwise and folded into `[-90, 0)`, and the correction is
/// `-(90 + a)` below -45° or `-a` otherwise. Fewer than three foreground
/// points, or points that all lie on one line, give 0.
pub fn estimate_skew(gray: &GrayImage) -> f32 {
    let points = foreground_extremes(gray);
    if points.len() < 3 {
        return 0.0;
    }
    let hull = convex_hull(&points);
    if hull.len() < 3 {
        return 0.0;
    }

    let edge = min_area_edge_angle(&hull);
    let folded = edge.rem_euclid(90.0) - 90.0;
    let correction = if folded < -45.0 { -(90.0 + folded) } else { -folded };
    debug!(edge, folded, correction, "Skew estimated");
    correction
}

/// Estimate the skew and rotate to undo it. Returns the levelled image and the
/// applied angle.
pub fn deskew(gray: &GrayImage) -> (GrayImage, f32) {
    let angle = estimate_skew(gray);
    (raster::rotate_replicate(gray, angle), angle)
}

/// Leftmost and rightmost foreground pixel of every row. The convex hull of
/// these equals the hull of the whole foreground.
fn foreground_extremes(gray: &GrayImage) -> Vec<Pt> {
    let (w, h) = gray.dimensions();
    let mut points = Vec::new();
    for y in 0..h {
        let mut first = None;
        let mut last = None;
        for x in 0..w {
            if gray.get_pixel(x, y).0[0] > 0 {
                first.get_or_insert(x);
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Pt { x: first as f32, y: y as f32 });
            if last != first {
                points.push(Pt { x: last as f32, y: y as f32 });
            }
        }
    }
    points
}

/// Andrew's monotone chain. Collinear points are dropped.
fn convex_hull(points: &[Pt]) -> Vec<Pt> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));
    pts.dedup();

    let mut lower: Vec<Pt> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Pt> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn cross(o: Pt, a: Pt, b: Pt) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Rotating calipers: the minimum-area rectangle has one side flush with a
/// hull edge. Returns that edge's direction in degrees, counter-clockwise as
/// displayed (image y grows downwards). Ties keep the first edge.
fn min_area_edge_angle(hull: &[Pt]) -> f32 {
    let mut best_area = f32::INFINITY;
    let mut best_angle = 0.0f32;

    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len = dx.hypot(dy);
        if len == 0.0 {
            continue;
        }
        let (ux, uy) = (dx / len, dy / len);

        let (mut min_u, mut max_u) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f32::INFINITY, f32::NEG_INFINITY);
        for p in hull {
            let u = p.x * ux + p.y * uy;
            let v = -p.x * uy + p.y * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area {
            best_area = area;
            best_angle = (-uy).atan2(ux).to_degrees();
        }
    }
    best_angle
}
