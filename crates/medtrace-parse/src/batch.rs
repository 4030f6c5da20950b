// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch / lot number extraction.

use medtrace_core::error::{MedtraceError, Result};
use regex::Regex;
use tracing::debug;

use crate::rules::RuleChain;

/// Batch patterns in priority order: labelled forms first, then a bare code.
///
/// The bare code covers letter-led codes (`MH0437`, `AB12345C`) and digit-led
/// ones (`22K91`).
const BATCH_RULES: &[(&str, &str)] = &[
    ("b-no", r"B\.?NO[: ]*[A-Z0-9]+"),
    ("batch", r"BATCH[: ]*[A-Z0-9]+"),
    ("bn", r"BN[: ]*[A-Z0-9]+"),
    ("lot", r"LOT[: ]*[A-Z0-9]+"),
    (
        "bare-code",
        r"\b(?:[A-Z]{1,3}\d{3,6}[A-Z]?|\d{2}[A-Z]{1,2}\d{2,4})\b",
    ),
];

const BATCH_LABEL: &str = r"(B\.?NO|BATCH|BN|LOT)[: ]*";

/// Finds the batch number on normalised lines.
#[derive(Debug, Clone)]
pub struct BatchExtractor {
    chain: RuleChain,
    label: Regex,
}

impl BatchExtractor {
    pub fn new() -> Result<Self> {
        let label = Regex::new(BATCH_LABEL)
            .map_err(|err| MedtraceError::Config(format!("invalid batch label pattern: {err}")))?;
        Ok(Self {
            chain: RuleChain::compile(BATCH_RULES)?,
            label,
        })
    }

    /// First batch code on the first line that has one, label removed.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        let hit = self.chain.first_match(lines)?;
        let value = self.label.replace_all(hit.text, "").trim().to_owned();
        debug!(rule = hit.rule, line = hit.line, raw = hit.text, %value, "Batch matched");
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(lines: &[&str]) -> Option<String> {
        BatchExtractor::new().unwrap().extract(lines)
    }

    #[test]
    fn labelled_forms_strip_the_label() {
        assert_eq!(extract(&["B.NO MH0437"]).as_deref(), Some("MH0437"));
        assert_eq!(extract(&["BNO:GT2210"]).as_deref(), Some("GT2210"));
        assert_eq!(extract(&["BATCH 45821X"]).as_deref(), Some("45821X"));
        assert_eq!(extract(&["BN 22K91"]).as_deref(), Some("22K91"));
        assert_eq!(extract(&["LOT: 4582A"]).as_deref(), Some("4582A"));
    }

    #[test]
    fn bare_codes_are_found() {
        assert_eq!(extract(&["22K91"]).as_deref(), Some("22K91"));
        assert_eq!(extract(&["MFG MH0437 MUMBAI"]).as_deref(), Some("MH0437"));
    }

    #[test]
    fn strength_and_dates_are_not_batches() {
        assert!(extract(&["PARACETAMOL 500MG TABLETS", "EXP 08/27"]).is_none());
    }

    #[test]
    fn label_outranks_bare_code_on_same_line() {
        assert_eq!(extract(&["AB1234 LOT 77Q12"]).as_deref(), Some("77Q12"));
    }

    #[test]
    fn earlier_line_wins() {
        assert_eq!(extract(&["X12345", "B.NO MH0437"]).as_deref(), Some("X12345"));
    }
}
