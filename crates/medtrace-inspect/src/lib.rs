// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// medtrace-inspect — In-process MedTrace inspection pipeline.
//
// Wires the conditioner, the recognizer adapter, the field parser, the tamper
// analyzer, and the verdict composer into one `Inspector`, and turns a run into
// a versioned JSON report and optional debug artifacts.

pub mod artifacts;
pub mod pipeline;
pub mod report;

pub use artifacts::ArtifactWriter;
pub use pipeline::{Inspection, Inspector};
pub use report::{InspectionReport, SCHEMA_VERSION, SourceImage};
