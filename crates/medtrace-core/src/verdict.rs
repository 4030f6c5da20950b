// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verdict composition: merges parsed fields and the tamper assessment into the
// single record handed to consumers.

use tracing::{info, instrument};

use crate::config::VerdictConfig;
use crate::types::{ParsedFields, TamperAssessment, Verdict, VerdictRecord};

/// Joins the two pipeline branches into a [`VerdictRecord`].
///
/// The composer never inspects the plausibility of the parsed fields; a missing
/// batch or expiry is reported to the operator separately (see
/// [`crate::advisory`]) and never moves the score or the verdict.
#[derive(Debug, Clone, Default)]
pub struct VerdictComposer {
    config: VerdictConfig,
}

impl VerdictComposer {
    pub fn new(config: VerdictConfig) -> Self {
        Self { config }
    }

    /// Classify a tamper score against the fixed threshold (strictly greater).
    pub fn classify(&self, tamper_score: f64) -> Verdict {
        if tamper_score > self.config.suspicious_threshold {
            Verdict::Suspicious
        } else {
            Verdict::Normal
        }
    }

    #[instrument(skip_all, fields(score = assessment.score))]
    pub fn compose(&self, fields: ParsedFields, assessment: TamperAssessment) -> VerdictRecord {
        let verdict = self.classify(assessment.score);
        let record = VerdictRecord {
            drug_name: fields.drug_name,
            batch_number: fields.batch_number,
            expiry_date: fields.expiry_date,
            tamper_score: assessment.score,
            confidence: format_confidence(assessment.score),
            evidence: self.config.evidence.clone(),
            verdict,
            suspicious_region: assessment.suspicious_region,
        };
        info!(
            verdict = %record.verdict,
            drug = %record.drug_name,
            batch = %record.batch_number,
            expiry = %record.expiry_date,
            "Verdict composed"
        );
        record
    }
}

/// `min(100, score)` as a percentage with two decimals.
pub fn format_confidence(score: f64) -> String {
    format!("{:.2}%", score.clamp(0.0, 100.0))
}
