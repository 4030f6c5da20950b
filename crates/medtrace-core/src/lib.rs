// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MedTrace — Core types, errors, configuration, and verdict composition shared
// across all crates.

pub mod advisory;
pub mod config;
pub mod error;
pub mod integrity;
pub mod types;
pub mod verdict;

pub use config::InspectionConfig;
pub use error::MedtraceError;
pub use types::*;
pub use verdict::VerdictComposer;
