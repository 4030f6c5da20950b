// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The persisted inspection report: the verdict record plus enough provenance
// (run id, timestamp, input fingerprint, engine, recognised lines) to audit it
// later.

use std::path::Path;

use chrono::{DateTime, Utc};
use medtrace_core::advisory::Advisory;
use medtrace_core::error::Result;
use medtrace_core::types::{RecognizedLine, VerdictRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::pipeline::Inspection;

/// Bumped whenever a field is renamed or removed.
pub const SCHEMA_VERSION: u32 = 1;

/// Where the inspected pixels came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// SHA-256 of the encoded bytes; absent for in-memory rasters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn in_memory(width: u32, height: u32) -> Self {
        Self {
            path: None,
            sha256: None,
            width,
            height,
        }
    }
}

/// Recognised lines, kept apart per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub full_frame: Vec<RecognizedLine>,
    pub region_of_interest: Vec<RecognizedLine>,
}

/// Tamper sub-scores behind `tamper_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperDetail {
    pub edge_norm: f64,
    pub texture_norm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub schema_version: u32,
    pub run_id: Uuid,
    pub inspected_at: DateTime<Utc>,
    pub source: SourceImage,
    /// `drug_name`, `batch_number`, `expiry_date`, `tamper_score`,
    /// `confidence`, `evidence`, `verdict`, and `suspicious_region` at the top
    /// level of the document.
    #[serde(flatten)]
    pub verdict: VerdictRecord,
    pub engine: String,
    /// Rotation applied before OCR, degrees counter-clockwise.
    pub skew_angle: f32,
    pub text: RecognizedText,
    pub tamper: TamperDetail,
    pub advisories: Vec<Advisory>,
}

impl InspectionReport {
    pub fn from_inspection(inspection: &Inspection) -> Self {
        let assessment = &inspection.tamper.assessment;
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: Uuid::new_v4(),
            inspected_at: Utc::now(),
            source: inspection.source.clone(),
            verdict: inspection.record.clone(),
            engine: inspection.engine.clone(),
            skew_angle: inspection.recognition.skew_angle,
            text: RecognizedText {
                full_frame: inspection.recognition.full_frame.clone(),
                region_of_interest: inspection.recognition.region_of_interest.clone(),
            },
            tamper: TamperDetail {
                edge_norm: assessment.edge_norm,
                texture_norm: assessment.texture_norm,
            },
            advisories: inspection.advisories.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json_pretty()?)?;
        debug!(run_id = %self.run_id, "Report written");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}
