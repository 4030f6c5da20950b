// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for MedTrace foil-strip inspection.

use serde::{Deserialize, Serialize};

/// Sentinel for a batch number or expiry date that could not be read.
pub const NOT_FOUND: &str = "NOT FOUND";

/// Sentinel for a drug name that could not be identified.
pub const UNKNOWN_DRUG: &str = "UNKNOWN";

/// A point in image coordinates (pixels, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding quadrilateral of a recognised text line, corners in scan order
/// (top-left, top-right, bottom-right, bottom-left for upright text).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Axis-aligned rectangle as a quadrilateral.
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self([
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    /// Scale every corner by `factor` and then shift it by `(dx, dy)`.
    ///
    /// Used to map boxes found in a zoomed crop back onto the full frame.
    pub fn scaled_then_offset(&self, factor: f32, dx: f32, dy: f32) -> Self {
        Self(self.0.map(|p| Point::new(p.x * factor + dx, p.y * factor + dy)))
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.0
    }
}

/// Which recognition pass produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionPass {
    /// The whole deskewed, binarised frame.
    FullFrame,
    /// The zoomed bottom-right micro-print crop.
    RegionOfInterest,
}

/// One line of text returned by an OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    /// Bounding quadrilateral in full-frame image coordinates.
    pub quad: Quad,
    /// Recognised text, as the engine reported it.
    pub text: String,
    /// Engine confidence in [0, 1].
    pub confidence: f32,
}

impl RecognizedLine {
    pub fn new(quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Structured fields extracted from the recognised text.
///
/// Every field always carries exactly one value: either what was parsed or the
/// field's sentinel ([`UNKNOWN_DRUG`] / [`NOT_FOUND`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    pub drug_name: String,
    pub batch_number: String,
    pub expiry_date: String,
}

impl Default for ParsedFields {
    fn default() -> Self {
        Self {
            drug_name: UNKNOWN_DRUG.to_owned(),
            batch_number: NOT_FOUND.to_owned(),
            expiry_date: NOT_FOUND.to_owned(),
        }
    }
}

impl ParsedFields {
    pub fn has_drug_name(&self) -> bool {
        self.drug_name != UNKNOWN_DRUG
    }

    pub fn has_batch_number(&self) -> bool {
        self.batch_number != NOT_FOUND
    }

    pub fn has_expiry_date(&self) -> bool {
        self.expiry_date != NOT_FOUND
    }
}

/// A square block of the image flagged by the tamper analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} block at ({}, {})", self.size, self.size, self.x, self.y)
    }
}

/// Result of the forensic tamper analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperAssessment {
    /// Combined score in [0, 100].
    pub score: f64,
    /// Normalised edge-density sub-score in [0, 1].
    pub edge_norm: f64,
    /// Normalised texture-variance sub-score in [0, 1].
    pub texture_norm: f64,
    /// Highest edge-energy block, if any block qualified.
    pub suspicious_region: Option<Region>,
}

/// Final binary classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Normal,
    Suspicious,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Suspicious => "SUSPICIOUS",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict document handed to consumers (display overlay, report file).
///
/// Serialises as a flat key-value object:
/// `drug_name, batch_number, expiry_date, tamper_score, confidence, evidence,
/// verdict` plus `suspicious_region` when one was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub drug_name: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub tamper_score: f64,
    /// Percentage with two decimals, e.g. `"37.52%"`.
    pub confidence: String,
    pub evidence: String,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspicious_region: Option<Region>,
}

impl VerdictRecord {
    /// The parsed-field part of the record.
    pub fn fields(&self) -> ParsedFields {
        ParsedFields {
            drug_name: self.drug_name.clone(),
            batch_number: self.batch_number.clone(),
            expiry_date: self.expiry_date.clone(),
        }
    }
}
