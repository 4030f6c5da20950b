// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Approximate string similarity on a 0–100 scale.
//
// `ratio` is the normalised indel similarity `2·LCS / (|a| + |b|)`. The partial
// variant slides the shorter string over every alignment of the longer one,
// including the windows hanging off either end, and keeps the best ratio. That
// tolerates both OCR character substitutions (`0` for `O`) and the dosage and
// strength text that surrounds a molecule name on the strip.

/// Normalised indel similarity of two strings, 0–100.
///
/// Two empty strings are identical (100).
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against any window of the longer one.
///
/// Returns 0 when either string is empty.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (needle, haystack) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if needle.is_empty() {
        return 0.0;
    }

    let m = needle.len();
    let n = haystack.len();
    let mut best = 0.0f64;

    // Windows hanging off the left edge: haystack[..end] for end < m.
    for end in 1..m.min(n + 1) {
        best = best.max(ratio_chars(&needle, &haystack[..end]));
    }
    // Full-length windows, then windows hanging off the right edge.
    for start in 0..n {
        let end = (start + m).min(n);
        best = best.max(ratio_chars(&needle, &haystack[start..end]));
        if best >= 100.0 {
            break;
        }
    }

    best
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Length of the longest common subsequence, two-row dynamic programme.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
