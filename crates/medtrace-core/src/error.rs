// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for MedTrace.

use thiserror::Error;

/// Top-level error type for all MedTrace operations.
///
/// Every variant is fatal for the inspection run that raised it. Soft failures
/// (no OCR text, no matching field, no suspicious block) are not errors; they
/// surface as sentinel values in the verdict instead.
#[derive(Debug, Error)]
pub enum MedtraceError {
    // -- Input errors --
    #[error("image decoding failed: {0}")]
    ImageDecode(String),

    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Recognition errors --
    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("OCR engine not available: {0}")]
    OcrUnavailable(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MedtraceError>;
