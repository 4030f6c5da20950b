// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language guidance for the person holding the strip (pharmacist,
// inspector, or customer).
//
// Two sources: a finished verdict whose fields came back as sentinels (the
// capture was too poor for micro-print OCR), and fatal errors that stopped the
// run. Neither ever changes the score or the verdict.

use serde::{Deserialize, Serialize};

use crate::error::MedtraceError;
use crate::types::VerdictRecord;

/// Severity of a message from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational: the verdict stands, but a field is missing.
    Notice,
    /// The operator should re-capture or change something and try again.
    ActionRequired,
    /// Nothing the operator can do with this input.
    Permanent,
}

/// A short operator-facing note attached to an inspection report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub message: String,
    pub severity: Severity,
}

impl Advisory {
    fn notice(message: &str) -> Self {
        Self {
            message: message.to_owned(),
            severity: Severity::Notice,
        }
    }
}

/// Advisories for a composed verdict.
///
/// A missing batch number or expiry date almost always means the dot-matrix
/// micro-print was too small for the capture resolution.
pub fn advise(record: &VerdictRecord) -> Vec<Advisory> {
    let fields = record.fields();
    let mut advisories = Vec::new();

    if !fields.has_batch_number() || !fields.has_expiry_date() {
        advisories.push(Advisory::notice("Micro-print region detected."));
        advisories.push(Advisory::notice("Resolution insufficient for reliable OCR."));
        advisories.push(Advisory::notice("Try high-resolution still image upload."));
    }

    if !fields.has_drug_name() {
        advisories.push(Advisory::notice(
            "Drug name not recognised. Capture the side of the strip that shows the product name.",
        ));
    }

    advisories
}

/// A human-readable error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the operator should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again with the same input could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `MedtraceError` into a `HumanError` an operator can act on.
pub fn humanize_error(err: &MedtraceError) -> HumanError {
    match err {
        MedtraceError::ImageDecode(_) => HumanError {
            message: "This photo couldn't be opened.".into(),
            suggestion:
                "The file may be damaged or in an odd format. Save it as JPEG or PNG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        MedtraceError::EmptyImage { .. } => HumanError {
            message: "The photo is empty.".into(),
            suggestion:
                "Capture the foil strip again, making sure it fills most of the frame.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MedtraceError::ImageError(_) => HumanError {
            message: "The photo couldn't be processed.".into(),
            suggestion: "Try capturing the strip again on a plain, evenly lit surface.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        MedtraceError::OcrError(_) => HumanError {
            message: "Text recognition didn't work on this photo.".into(),
            suggestion:
                "Retry in better light, with the camera steady and parallel to the foil.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        MedtraceError::OcrUnavailable(detail) => HumanError {
            message: "The text recognition models aren't installed.".into(),
            suggestion:
                format!("Download the OCR models, or pass a transcript of the strip. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MedtraceError::Config(detail) => HumanError {
            message: "The inspection settings are invalid.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MedtraceError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion:
                        "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "MedTrace doesn't have permission to use that file.".into(),
                    suggestion:
                        "Check the file permissions, or copy the photo elsewhere first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::ActionRequired,
                }
            }
        }

        MedtraceError::Serialization(_) => HumanError {
            message: "A settings or report file is not valid JSON.".into(),
            suggestion:
                "Check the file for typos, or delete it to fall back to the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
