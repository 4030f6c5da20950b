// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MedTrace — forensic foil-strip inspection.
//
// Entry point. Initialises logging, loads the configuration and the OCR engine,
// inspects one photo, and prints the JSON report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use medtrace_core::advisory::humanize_error;
use medtrace_core::config::InspectionConfig;
use medtrace_core::error::{MedtraceError, Result};
use medtrace_inspect::{ArtifactWriter, Inspector};
use medtrace_vision::{TextRecognizer, TranscriptRecognizer};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "medtrace",
    version,
    about = "Forensic inspection of pharmaceutical foil strips",
    long_about = "Reads the drug name, batch number, and expiry date off a photo of a \
                  blister foil strip, scores the foil surface for signs of tampering, \
                  and reports a NORMAL or SUSPICIOUS verdict as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect one foil-strip photo
    Inspect(InspectArgs),

    /// Print the default configuration as JSON
    Config,
}

#[derive(Debug, clap::Args)]
struct InspectArgs {
    /// Photo of the foil strip (any format the image decoder understands)
    image: PathBuf,

    /// JSON configuration file; missing keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long, conflicts_with = "transcript")]
    models: Option<PathBuf>,

    /// Use the lines of this text file instead of running OCR
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(short, long, default_value = "verdict.json")]
    output: PathBuf,

    /// Also write intermediate images and the recognised text here
    #[arg(long)]
    artifacts: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Inspect(args) => inspect(&args),
        Command::Config => print_default_config(),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "MedTrace failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let engine = build_engine(args)?;
    info!(engine = engine.name(), image = %args.image.display(), "MedTrace starting");

    let inspector = Inspector::new(&config, engine)?;
    let inspection = inspector.inspect_path(&args.image)?;
    let report = inspection.report();

    println!("{}", report.to_json_pretty()?);
    report.save(&args.output)?;
    info!(path = %args.output.display(), "Report saved");

    for advisory in &report.advisories {
        eprintln!("note: {}", advisory.message);
    }

    if let Some(dir) = &args.artifacts {
        let written = ArtifactWriter::new(dir)?.write(&inspection)?;
        info!(dir = %dir.display(), files = written.len(), "Debug artifacts saved");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<InspectionConfig> {
    match path {
        Some(path) => InspectionConfig::load(path),
        None => Ok(InspectionConfig::default()),
    }
}

fn build_engine(args: &InspectArgs) -> Result<Box<dyn TextRecognizer>> {
    if let Some(path) = &args.transcript {
        return Ok(Box::new(TranscriptRecognizer::load(path)?));
    }
    ocr_engine(args.models.as_deref())
}

#[cfg(feature = "ocr")]
fn ocr_engine(models: Option<&Path>) -> Result<Box<dyn TextRecognizer>> {
    use medtrace_vision::{OcrModelPaths, OcrsRecognizer};

    let paths = models.map(OcrModelPaths::from_dir).unwrap_or_default();
    Ok(Box::new(OcrsRecognizer::new(&paths)?))
}

#[cfg(not(feature = "ocr"))]
fn ocr_engine(_models: Option<&Path>) -> Result<Box<dyn TextRecognizer>> {
    Err(MedtraceError::OcrUnavailable(
        "built without the `ocr` feature; pass --transcript".into(),
    ))
}

fn print_default_config() -> Result<()> {
    let json =
        serde_json::to_string_pretty(&InspectionConfig::default()).map_err(MedtraceError::from)?;
    println!("{json}");
    Ok(())
}
