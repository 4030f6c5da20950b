// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered pattern rules with first-match-wins evaluation.

use medtrace_core::error::{MedtraceError, Result};
use regex::Regex;

/// A named regular expression in a priority chain.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pattern: Regex,
}

/// Where a rule chain matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    /// Name of the rule that fired.
    pub rule: &'static str,
    /// Index of the line it fired on.
    pub line: usize,
    /// The matched text (a slice of that line).
    pub text: &'a str,
}

/// Rules evaluated in priority order.
///
/// Lines are the outer loop and rules the inner one: the first line on which
/// any rule matches wins, and on that line the highest-priority rule wins.
/// Later lines are never consulted for a "better" match.
#[derive(Debug, Clone)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Compile `(name, pattern)` pairs, keeping their order as priority.
    pub fn compile(specs: &[(&'static str, &str)]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|&(name, pattern)| {
                Regex::new(pattern)
                    .map(|pattern| Rule { name, pattern })
                    .map_err(|err| {
                        MedtraceError::Config(format!("invalid pattern for rule {name}: {err}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the chain to a single line.
    pub fn match_line<'a>(&self, line: &'a str) -> Option<(&'static str, &'a str)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.find(line).map(|m| (rule.name, m.as_str())))
    }

    /// Scan `lines` in order and return the first match.
    pub fn first_match<'a, S: AsRef<str>>(&self, lines: &'a [S]) -> Option<RuleMatch<'a>> {
        lines.iter().enumerate().find_map(|(line, text)| {
            self.match_line(text.as_ref())
                .map(|(rule, text)| RuleMatch { rule, line, text })
        })
    }
}
