// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inspection configuration. Every tuning constant and lookup table the pipeline
// uses lives here so it can be injected at startup and replaced in tests.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MedtraceError, Result};

/// Generic molecule names recognised by the fuzzy drug matcher.
pub const DEFAULT_KNOWN_DRUGS: &[&str] = &[
    "PARACETAMOL",
    "CAFFEINE",
    "DICLOFENAC",
    "IBUPROFEN",
    "AZITHROMYCIN",
    "AMOXICILLIN",
    "CETIRIZINE",
    "METFORMIN",
];

/// Three-letter month abbreviations and their two-digit numbers.
pub const DEFAULT_MONTHS: &[(&str, &str)] = &[
    ("JAN", "01"),
    ("FEB", "02"),
    ("MAR", "03"),
    ("APR", "04"),
    ("MAY", "05"),
    ("JUN", "06"),
    ("JUL", "07"),
    ("AUG", "08"),
    ("SEP", "09"),
    ("OCT", "10"),
    ("NOV", "11"),
    ("DEC", "12"),
];

/// Dosage-form tokens that mark the probable product-name line.
pub const DEFAULT_DOSAGE_KEYWORDS: &[&str] = &["TABLET", "TABLETS", "CAPSULE", "IP"];

/// Evidence text attached to every verdict.
pub const DEFAULT_EVIDENCE: &str = "High edge-density region detected on foil surface";

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    pub conditioner: ConditionerConfig,
    pub recognizer: RecognizerConfig,
    pub parser: ParserConfig,
    pub tamper: TamperConfig,
    pub verdict: VerdictConfig,
}

impl InspectionConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&raw)?;
        debug!(
            known_drugs = config.parser.known_drugs.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a stage meaningless or panic.
    pub fn validate(&self) -> Result<()> {
        let c = &self.conditioner;
        if c.clahe_grid == 0 {
            return Err(MedtraceError::Config("clahe_grid must be at least 1".into()));
        }
        if c.clahe_clip_limit <= 0.0 {
            return Err(MedtraceError::Config("clahe_clip_limit must be positive".into()));
        }
        if c.opening_size == 0 || c.opening_size % 2 == 0 {
            return Err(MedtraceError::Config(format!(
                "opening_size must be odd and non-zero, got {}",
                c.opening_size
            )));
        }

        let r = &self.recognizer;
        if r.adaptive_block_size < 3 || r.adaptive_block_size % 2 == 0 {
            return Err(MedtraceError::Config(format!(
                "adaptive_block_size must be odd and at least 3, got {}",
                r.adaptive_block_size
            )));
        }
        for (name, value) in [("roi_width", r.roi_width), ("roi_height", r.roi_height)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(MedtraceError::Config(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if r.roi_scale <= 0.0 {
            return Err(MedtraceError::Config("roi_scale must be positive".into()));
        }

        if self.tamper.block_size == 0 {
            return Err(MedtraceError::Config("tamper block_size must be non-zero".into()));
        }
        if self.tamper.canny_low > self.tamper.canny_high {
            return Err(MedtraceError::Config(
                "canny_low must not exceed canny_high".into(),
            ));
        }
        Ok(())
    }
}

/// Image Conditioner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionerConfig {
    /// CLAHE tiles per axis.
    pub clahe_grid: u32,
    /// CLAHE clip limit, as a multiple of the mean histogram bin height.
    pub clahe_clip_limit: f32,
    /// Bilateral filter window diameter in pixels.
    pub bilateral_diameter: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    /// Side of the square structuring element for the opening.
    pub opening_size: u32,
}

impl Default for ConditionerConfig {
    fn default() -> Self {
        Self {
            clahe_grid: 8,
            clahe_clip_limit: 2.0,
            bilateral_diameter: 9,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_space: 75.0,
            opening_size: 3,
        }
    }
}

/// Text Recognizer Adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub deskew: bool,
    /// Side of the Gaussian neighbourhood for adaptive thresholding (odd).
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local mean.
    pub adaptive_offset: i32,
    /// Run the zoomed micro-print pass.
    pub roi_pass: bool,
    /// Fraction of the width covered by the bottom-right crop.
    pub roi_width: f32,
    /// Fraction of the height covered by the bottom-right crop.
    pub roi_height: f32,
    /// Upscale factor applied to the crop.
    pub roi_scale: f32,
    /// Global threshold applied to the upscaled crop.
    pub roi_threshold: u8,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            deskew: true,
            adaptive_block_size: 31,
            adaptive_offset: 5,
            roi_pass: true,
            roi_width: 0.5,
            roi_height: 0.4,
            roi_scale: 2.5,
            roi_threshold: 150,
        }
    }
}

/// Field Parser settings and lookup tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub known_drugs: Vec<String>,
    /// Month abbreviation → two-digit month number.
    pub months: BTreeMap<String, String>,
    /// A fuzzy match must score strictly above this (0–100).
    pub fuzzy_threshold: f64,
    /// Fallback line length bounds, both exclusive.
    pub fallback_min_len: usize,
    pub fallback_max_len: usize,
    pub dosage_keywords: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            known_drugs: DEFAULT_KNOWN_DRUGS.iter().map(|s| s.to_string()).collect(),
            months: DEFAULT_MONTHS
                .iter()
                .map(|(name, number)| (name.to_string(), number.to_string()))
                .collect(),
            fuzzy_threshold: 70.0,
            fallback_min_len: 10,
            fallback_max_len: 60,
            dosage_keywords: DEFAULT_DOSAGE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Tamper Analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TamperConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Multiplier applied to the mean edge intensity before clamping to 1.
    pub edge_gain: f64,
    pub lbp_points: u32,
    pub lbp_radius: f32,
    /// Divisor applied to `ln(1 + variance)` before clamping to 1.
    pub texture_divisor: f64,
    pub edge_weight: f64,
    pub texture_weight: f64,
    /// Side of the square blocks scanned for the suspicious region.
    pub block_size: u32,
}

impl Default for TamperConfig {
    fn default() -> Self {
        Self {
            canny_low: 100.0,
            canny_high: 200.0,
            edge_gain: 5.0,
            lbp_points: 8,
            lbp_radius: 1.0,
            texture_divisor: 10.0,
            edge_weight: 0.6,
            texture_weight: 0.4,
            block_size: 60,
        }
    }
}

/// Verdict Composer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Scores strictly above this are SUSPICIOUS.
    pub suspicious_threshold: f64,
    pub evidence: String,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            suspicious_threshold: 25.0,
            evidence: DEFAULT_EVIDENCE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        InspectionConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            InspectionConfig::from_json(r#"{ "parser": { "known_drugs": ["ASPIRIN"] } }"#).unwrap();
        assert_eq!(config.parser.known_drugs, vec!["ASPIRIN".to_string()]);
        assert_eq!(config.parser.months.get("APR").map(String::as_str), Some("04"));
        assert_eq!(config.tamper.block_size, 60);
        assert_eq!(config.verdict.suspicious_threshold, 25.0);
    }

    #[test]
    fn even_block_size_rejected() {
        let err = InspectionConfig::from_json(r#"{ "recognizer": { "adaptive_block_size": 30 } }"#)
            .unwrap_err();
        assert!(matches!(err, MedtraceError::Config(_)));
    }

    #[test]
    fn roi_fraction_out_of_range_rejected() {
        let err = InspectionConfig::from_json(r#"{ "recognizer": { "roi_height": 1.5 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("roi_height"));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = InspectionConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MedtraceError::Serialization(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "verdict": {{ "suspicious_threshold": 40.0 }} }}"#).unwrap();
        let config = InspectionConfig::load(file.path()).unwrap();
        assert_eq!(config.verdict.suspicious_threshold, 40.0);
        assert_eq!(config.verdict.evidence, DEFAULT_EVIDENCE);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = InspectionConfig::load("/nonexistent/medtrace.json").unwrap_err();
        assert!(matches!(err, MedtraceError::Io(_)));
    }
}
