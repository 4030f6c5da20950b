// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// medtrace-vision — Image side of the MedTrace foil inspection pipeline.
//
// Provides foil conditioning (CLAHE, bilateral smoothing, opening), the text
// recognizer adapter (deskew, binarisation, full-frame and micro-print OCR
// passes), the tamper analyzer (edge density, LBP texture, densest block), and
// diagnostic overlays.

pub mod conditioner;
pub mod overlay;
pub mod raster;
pub mod recognizer;
pub mod tamper;

pub use conditioner::{ConditionedImage, ImageConditioner};
pub use recognizer::{Recognition, RecognizerAdapter, TextRecognizer, TranscriptRecognizer};
pub use tamper::{TamperAnalysis, TamperAnalyzer};

#[cfg(feature = "ocr")]
pub use recognizer::{OcrModelPaths, OcrsRecognizer};
