// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// medtrace-parse — Structured field extraction from noisy foil-strip OCR text.
//
// Turns the recognised lines of both OCR passes into exactly one drug name,
// batch number, and expiry date, each falling back to its sentinel when
// nothing on the strip matches.

pub mod batch;
pub mod drug;
pub mod expiry;
pub mod fuzzy;
pub mod normalize;
pub mod rules;

use medtrace_core::config::ParserConfig;
use medtrace_core::error::Result;
use medtrace_core::types::{NOT_FOUND, ParsedFields, UNKNOWN_DRUG};
use tracing::{info, instrument};

pub use batch::BatchExtractor;
pub use drug::{DrugMatcher, DrugSource};
pub use expiry::ExpiryExtractor;
pub use normalize::normalize;

/// The Field Parser.
///
/// Only the text of each recognised line is used; boxes and confidences are
/// ignored. Lines are normalised once and then offered to the three field
/// extractors independently, so a miss on one field never blocks the others.
#[derive(Debug, Clone)]
pub struct FieldParser {
    expiry: ExpiryExtractor,
    batch: BatchExtractor,
    drug: DrugMatcher,
}

impl FieldParser {
    /// Build a parser from the injected vocabulary, month table, and limits.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            expiry: ExpiryExtractor::new(&config.months)?,
            batch: BatchExtractor::new()?,
            drug: DrugMatcher::new(config),
        })
    }

    /// Parser with the built-in drug list and English month names.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ParserConfig::default())
    }

    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> ParsedFields {
        let normalized: Vec<String> = lines.iter().map(|line| normalize(line.as_ref())).collect();

        let drug_name = self
            .drug
            .identify(&normalized)
            .map(|(name, _)| name)
            .unwrap_or_else(|| UNKNOWN_DRUG.to_owned());
        let batch_number = self
            .batch
            .extract(&normalized)
            .unwrap_or_else(|| NOT_FOUND.to_owned());
        let expiry_date = self
            .expiry
            .extract(&normalized)
            .unwrap_or_else(|| NOT_FOUND.to_owned());

        info!(%drug_name, %batch_number, %expiry_date, "Fields parsed");
        ParsedFields {
            drug_name,
            batch_number,
            expiry_date,
        }
    }
}
