// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition backed by the `ocrs` crate, a pure-Rust OCR engine whose
// neural network models are executed via `rten`.
//
// # Feature Gate
//
// Only compiled with the `ocr` feature:
//
// ```toml
// medtrace-vision = { path = "crates/medtrace-vision", features = ["ocr"] }
// ```
//
// # Model Setup
//
// Two model files are required:
//
// - **Detection model** (`text-detection.rten`): locates words in the image.
// - **Recognition model** (`text-recognition.rten`): decodes characters per line.
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`), which is also the default lookup directory here.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use medtrace_core::error::{MedtraceError, Result};
use medtrace_core::types::{Point, Quad, RecognitionPass, RecognizedLine};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use super::TextRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrModelPaths {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModelPaths {
    /// Expects `text-detection.rten` and `text-recognition.rten` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(MedtraceError::OcrUnavailable(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Recognizer wrapping a loaded `ocrs` engine.
///
/// Model loading is the expensive step; build once and reuse for every image.
/// The engine reports no per-line score, so every line carries confidence 1.0.
///
/// **Important:** `ocrs` and `rten` should be compiled in release mode. Debug
/// builds are 10-100x slower.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    #[instrument(skip_all, fields(
        detection = %paths.detection_model_path.display(),
        recognition = %paths.recognition_model_path.display(),
    ))]
    pub fn new(paths: &OcrModelPaths) -> Result<Self> {
        paths.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&paths.detection_model_path).map_err(|err| {
            MedtraceError::OcrUnavailable(format!(
                "failed to load detection model from {}: {}",
                paths.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model = Model::load_file(&paths.recognition_model_path).map_err(|err| {
            MedtraceError::OcrUnavailable(format!(
                "failed to load recognition model from {}: {}",
                paths.recognition_model_path.display(),
                err
            ))
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            MedtraceError::OcrUnavailable(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&OcrModelPaths::default())
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(&OcrModelPaths::from_dir(dir))
    }
}

impl std::fmt::Debug for OcrsRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrsRecognizer").finish_non_exhaustive()
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    #[instrument(skip_all, fields(pass = ?pass, width = image.width(), height = image.height()))]
    fn recognize(&self, image: &GrayImage, pass: RecognitionPass) -> Result<Vec<RecognizedLine>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            MedtraceError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| MedtraceError::OcrError(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| MedtraceError::OcrError(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| MedtraceError::OcrError(format!("line recognition failed: {}", err)))?;

        let lines: Vec<RecognizedLine> = line_texts
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let corners = line.rotated_rect().corners().map(|c| Point::new(c.x, c.y));
                Some(RecognizedLine::new(Quad(corners), text, 1.0))
            })
            .collect();

        info!(lines = lines.len(), "OCR pass complete");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_from_dir() {
        let paths = OcrModelPaths::from_dir("/tmp/my-models");
        assert_eq!(
            paths.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            paths.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn default_paths_end_with_model_filenames() {
        let paths = OcrModelPaths::default();
        assert!(paths.detection_model_path.ends_with(DETECTION_MODEL_FILENAME));
        assert!(paths.recognition_model_path.ends_with(RECOGNITION_MODEL_FILENAME));
    }

    #[test]
    fn missing_models_are_reported_as_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = OcrsRecognizer::from_model_dir(dir.path()).unwrap_err();
        assert!(matches!(err, MedtraceError::OcrUnavailable(_)));
    }
}
