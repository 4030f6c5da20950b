// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Expiry date extraction.

use std::collections::BTreeMap;

use medtrace_core::error::{MedtraceError, Result};
use regex::Regex;
use tracing::debug;

use crate::rules::RuleChain;

/// Expiry patterns in priority order. The second is shadowed by the first
/// whenever both could match; it is kept so the chain reads like the print
/// conventions it was written from.
const EXPIRY_RULES: &[(&str, &str)] = &[
    ("exp-date", r"EXP[: ]*\d{2}[/-]\d{2,4}"),     // EXP 08/27, EXP:08-2027
    ("exp-short-date", r"EXP[: ]*\d{2}[/-]\d{2}"), // EXP 07-26
    ("bare-date", r"\b\d{2}[/-]\d{2,4}\b"),        // 08/27
    ("exp-month-name", r"EXP[: ]*[A-Z]{3}[: ]*\d{2,4}"), // EXP APR 24
];

const MONTH_TOKEN: &str = r"([A-Z]{3})[: ]*(\d{2,4})";

/// Finds the expiry date on normalised lines.
#[derive(Debug, Clone)]
pub struct ExpiryExtractor {
    chain: RuleChain,
    month_token: Regex,
    months: BTreeMap<String, String>,
}

impl ExpiryExtractor {
    pub fn new(months: &BTreeMap<String, String>) -> Result<Self> {
        let month_token = Regex::new(MONTH_TOKEN)
            .map_err(|err| MedtraceError::Config(format!("invalid month pattern: {err}")))?;
        Ok(Self {
            chain: RuleChain::compile(EXPIRY_RULES)?,
            month_token,
            months: months
                .iter()
                .map(|(name, number)| (name.to_ascii_uppercase(), number.clone()))
                .collect(),
        })
    }

    /// First expiry on the first line that has one, or `None`.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        let hit = self.chain.first_match(lines)?;
        let value = self.render(hit.text);
        debug!(rule = hit.rule, line = hit.line, raw = hit.text, %value, "Expiry matched");
        Some(value)
    }

    /// Turn a matched span into the reported value: a month name becomes
    /// `MM/<year digits>`; otherwise the `EXP` label is dropped.
    fn render(&self, matched: &str) -> String {
        let translated = self.month_token.captures_iter(matched).find_map(|caps| {
            let number = self.months.get(&caps[1])?;
            Some(format!("{}/{}", number, &caps[2]))
        });
        match translated {
            Some(value) => value,
            None => matched
                .replace("EXP", "")
                .trim_matches(|c| c == ' ' || c == ':')
                .to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medtrace_core::config::ParserConfig;

    fn extractor() -> ExpiryExtractor {
        ExpiryExtractor::new(&ParserConfig::default().months).unwrap()
    }

    #[test]
    fn month_name_is_translated() {
        assert_eq!(extractor().extract(&["EXP APR 24"]).as_deref(), Some("04/24"));
        assert_eq!(extractor().extract(&["EXP: DEC 2026"]).as_deref(), Some("12/2026"));
    }

    #[test]
    fn numeric_date_drops_label() {
        assert_eq!(extractor().extract(&["EXP 08/27"]).as_deref(), Some("08/27"));
        assert_eq!(extractor().extract(&["EXP:07-2026"]).as_deref(), Some("07-2026"));
    }

    #[test]
    fn bare_date_is_accepted() {
        assert_eq!(
            extractor().extract(&["MFG BY ACME", "11/2025 RS 24.50"]).as_deref(),
            Some("11/2025")
        );
    }

    #[test]
    fn first_line_wins_over_better_later_line() {
        let lines = ["MFD 01/24", "EXP 12/26"];
        assert_eq!(extractor().extract(&lines).as_deref(), Some("01/24"));
    }

    #[test]
    fn label_beats_bare_date_on_same_line() {
        let lines = ["MFD 01/24 EXP 12/26"];
        assert_eq!(extractor().extract(&lines).as_deref(), Some("12/26"));
    }

    #[test]
    fn unknown_month_token_is_not_translated() {
        // "EXP 08" looks like a month token but EXP is not a month.
        assert_eq!(extractor().extract(&["EXP 08-27"]).as_deref(), Some("08-27"));
    }

    #[test]
    fn injected_month_table_is_used() {
        let mut months = BTreeMap::new();
        months.insert("ABR".to_string(), "04".to_string());
        let extractor = ExpiryExtractor::new(&months).unwrap();
        assert_eq!(extractor.extract(&["EXP ABR 25"]).as_deref(), Some("04/25"));
        assert_eq!(extractor.extract(&["EXP APR 25"]).as_deref(), Some("APR 25"));
    }

    #[test]
    fn no_date_is_none() {
        assert!(extractor().extract(&["PARACETAMOL TABLETS IP", "500 MG"]).is_none());
    }
}
