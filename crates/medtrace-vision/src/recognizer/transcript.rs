// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replays recorded text lines in place of a live OCR engine.

use std::path::Path;

use image::GrayImage;
use medtrace_core::error::Result;
use medtrace_core::types::{Quad, RecognitionPass, RecognizedLine};
use tracing::{debug, instrument};

use super::TextRecognizer;

/// A recognizer that returns a fixed set of lines.
///
/// Useful when the strip was already read by an external OCR tool, and for
/// exercising the pipeline without model files. The lines are reported for the
/// full-frame pass only; the micro-print pass yields nothing. Each line is
/// given an evenly spaced horizontal band of the frame as its box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptRecognizer {
    lines: Vec<String>,
}

impl TranscriptRecognizer {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// One line per non-blank line of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        )
    }

    /// Read a UTF-8 transcript file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let transcript = Self::from_text(&text);
        debug!(lines = transcript.lines.len(), "Transcript loaded");
        Ok(transcript)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TextRecognizer for TranscriptRecognizer {
    fn name(&self) -> &str {
        "transcript"
    }

    fn recognize(&self, image: &GrayImage, pass: RecognitionPass) -> Result<Vec<RecognizedLine>> {
        if pass != RecognitionPass::FullFrame || self.lines.is_empty() {
            return Ok(Vec::new());
        }
        let width = image.width() as f32;
        let band = image.height() as f32 / self.lines.len() as f32;
        Ok(self
            .lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let quad = Quad::from_rect(0.0, i as f32 * band, width, band);
                RecognizedLine::new(quad, text.as_str(), 1.0)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn replays_lines_for_full_frame_only() {
        let rec = TranscriptRecognizer::new(["PARACETAMOL", "EXP 08/27"]);
        let img = GrayImage::new(100, 40);

        let full = rec.recognize(&img, RecognitionPass::FullFrame).unwrap();
        assert_eq!(full.len(), 2);
        assert_eq!(full[1].text, "EXP 08/27");
        assert_eq!(full[1].quad.corners()[0].y, 20.0);
        assert_eq!(full[0].confidence, 1.0);

        let roi = rec.recognize(&img, RecognitionPass::RegionOfInterest).unwrap();
        assert!(roi.is_empty());
    }

    #[test]
    fn from_text_skips_blank_lines() {
        let rec = TranscriptRecognizer::from_text("  B.NO MH0437 \n\n\nLOT 22\n");
        assert_eq!(rec.lines(), &["B.NO MH0437".to_string(), "LOT 22".to_string()]);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "IBUPROFEN 400MG").unwrap();
        writeln!(file, "EXP APR 27").unwrap();
        let rec = TranscriptRecognizer::load(file.path()).unwrap();
        assert_eq!(rec.lines().len(), 2);
    }

    #[test]
    fn empty_transcript_yields_nothing() {
        let rec = TranscriptRecognizer::default();
        let lines = rec
            .recognize(&GrayImage::new(10, 10), RecognitionPass::FullFrame)
            .unwrap();
        assert!(lines.is_empty());
    }
}
