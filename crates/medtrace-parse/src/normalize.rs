// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line normalisation applied before any pattern or fuzzy matching.

/// Uppercase `text`, drop every character outside `[A-Z0-9:/\-. ]`, and trim.
///
/// Foil OCR output is full of glare artefacts (`|`, `'`, `~`, stray accents);
/// none of them can be part of a drug name, batch code, or date.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .to_uppercase()
        .chars()
        .filter(|c| matches!(c, 'A'..='Z' | '0'..='9' | ':' | '/' | '-' | '.' | ' '))
        .collect();
    kept.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_and_strips_noise() {
        assert_eq!(normalize("  exp: 08/27|  "), "EXP: 08/27");
        assert_eq!(normalize("B.No~ mh0437'"), "B.NO MH0437");
    }

    #[test]
    fn keeps_date_separators() {
        assert_eq!(normalize("mfd 01-2024 / exp 12.2026"), "MFD 01-2024 / EXP 12.2026");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(normalize("ÄSPIRIN"), "SPIRIN");
        assert_eq!(normalize("***"), "");
    }
}
