// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drug name identification: fuzzy match against the known vocabulary, falling
// back to the line that carries a dosage-form keyword.

use medtrace_core::config::ParserConfig;
use tracing::debug;

use crate::fuzzy::partial_ratio;
use crate::normalize::normalize;

/// Best vocabulary hit seen across all lines.
#[derive(Debug, Clone, PartialEq)]
pub struct DrugCandidate {
    pub name: String,
    pub score: f64,
    /// Index of the line the score came from.
    pub line: usize,
}

/// Which tier produced the drug name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrugSource {
    Vocabulary,
    DosageFormLine,
}

#[derive(Debug, Clone)]
pub struct DrugMatcher {
    vocabulary: Vec<String>,
    threshold: f64,
    min_len: usize,
    max_len: usize,
    keywords: Vec<String>,
}

impl DrugMatcher {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            vocabulary: config
                .known_drugs
                .iter()
                .map(|drug| normalize(drug))
                .filter(|drug| !drug.is_empty())
                .collect(),
            threshold: config.fuzzy_threshold,
            min_len: config.fallback_min_len,
            max_len: config.fallback_max_len,
            keywords: config.dosage_keywords.iter().map(|k| normalize(k)).collect(),
        }
    }

    /// The drug name and the tier that produced it, or `None`.
    pub fn identify<S: AsRef<str>>(&self, lines: &[S]) -> Option<(String, DrugSource)> {
        if let Some(best) = self.best_vocabulary_match(lines) {
            if best.score > self.threshold {
                debug!(
                    drug = %best.name,
                    score = best.score,
                    line = best.line,
                    "Drug matched vocabulary"
                );
                return Some((best.name, DrugSource::Vocabulary));
            }
            debug!(
                drug = %best.name,
                score = best.score,
                threshold = self.threshold,
                "Best vocabulary match below threshold"
            );
        }

        let line = self.dosage_form_line(lines)?;
        debug!(%line, "Drug taken from dosage-form line");
        Some((line.to_owned(), DrugSource::DosageFormLine))
    }

    /// Highest-scoring (drug, line) pair over every line × vocabulary entry.
    ///
    /// Only a strictly higher score replaces the current best, so ties keep
    /// the earliest line and, within a line, the earliest vocabulary entry.
    pub fn best_vocabulary_match<S: AsRef<str>>(&self, lines: &[S]) -> Option<DrugCandidate> {
        let mut best: Option<DrugCandidate> = None;
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            for drug in &self.vocabulary {
                let score = partial_ratio(line, drug);
                if score > best.as_ref().map_or(0.0, |b| b.score) {
                    best = Some(DrugCandidate {
                        name: drug.clone(),
                        score,
                        line: index,
                    });
                }
            }
        }
        best
    }

    /// First line of plausible length that mentions a dosage form.
    pub fn dosage_form_line<'a, S: AsRef<str>>(&self, lines: &'a [S]) -> Option<&'a str> {
        lines.iter().map(AsRef::as_ref).find(|line| {
            let len = line.chars().count();
            len > self.min_len
                && len < self.max_len
                && self.keywords.iter().any(|k| line.contains(k.as_str()))
        })
    }
}
