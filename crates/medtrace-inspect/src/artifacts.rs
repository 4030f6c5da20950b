// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Debug artifacts: the intermediate rasters and recognised text of one run,
// written as files for visual inspection.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use medtrace_core::error::Result;
use medtrace_vision::{overlay, raster};
use tracing::{info, instrument};

use crate::pipeline::Inspection;

pub const FOIL_CLEAN: &str = "foil_clean.png";
pub const DESKEWED: &str = "deskewed.png";
pub const PREPROCESSED: &str = "preprocessed.png";
pub const ROI: &str = "roi.png";
pub const OCR_OUTPUT: &str = "ocr_output.png";
pub const TAMPER_HEATMAP: &str = "tamper_heatmap.png";
pub const TAMPER_OUTPUT: &str = "tamper_output.png";
pub const OCR_TEXT: &str = "ocr_text.txt";

/// Writes artifacts into one directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every artifact of `inspection`. Returns the paths written, in
    /// pipeline order. `roi.png` is skipped when the micro-print pass did not
    /// run.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn write(&self, inspection: &Inspection) -> Result<Vec<PathBuf>> {
        let recognition = &inspection.recognition;
        let mut written = Vec::new();

        written.push(self.gray(FOIL_CLEAN, inspection.conditioned.as_gray())?);
        written.push(self.gray(DESKEWED, &recognition.deskewed)?);
        written.push(self.gray(PREPROCESSED, &recognition.binarized)?);
        if let Some(crop) = &recognition.roi {
            written.push(self.gray(ROI, &crop.image)?);
        }
        let ocr_overlay = overlay::outline_lines(&recognition.deskewed, recognition.lines());
        written.push(self.image(OCR_OUTPUT, DynamicImage::ImageRgb8(ocr_overlay))?);
        written.push(self.image(
            TAMPER_HEATMAP,
            DynamicImage::ImageRgb8(overlay::heatmap(&inspection.tamper.edges)),
        )?);
        written.push(self.image(
            TAMPER_OUTPUT,
            DynamicImage::ImageRgb8(overlay::outline_region(
                inspection.conditioned.as_gray(),
                inspection.tamper.assessment.suspicious_region,
            )),
        )?);

        let text_path = self.dir.join(OCR_TEXT);
        let mut text = recognition.texts().join("\n");
        text.push('\n');
        std::fs::write(&text_path, text)?;
        written.push(text_path);

        info!(files = written.len(), "Artifacts written");
        Ok(written)
    }

    fn gray(&self, name: &str, img: &GrayImage) -> Result<PathBuf> {
        self.image(name, DynamicImage::ImageLuma8(img.clone()))
    }

    fn image(&self, name: &str, img: DynamicImage) -> Result<PathBuf> {
        let path = self.dir.join(name);
        raster::save(&img, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use medtrace_core::config::InspectionConfig;
    use medtrace_vision::TranscriptRecognizer;

    use crate::pipeline::Inspector;

    fn inspect(config: &InspectionConfig) -> Inspection {
        let engine = TranscriptRecognizer::new(["CAFFEINE 200MG", "EXP 08/27"]);
        let inspector = Inspector::new(config, engine).unwrap();
        let raw = DynamicImage::ImageRgb8(RgbImage::from_fn(80, 60, |x, y| {
            Rgb([((x * 3 + y * 2) % 256) as u8, 120, 90])
        }));
        inspector.inspect(&raw).unwrap()
    }

    #[test]
    fn writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("debug")).unwrap();
        let written = writer.write(&inspect(&InspectionConfig::default())).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                FOIL_CLEAN,
                DESKEWED,
                PREPROCESSED,
                ROI,
                OCR_OUTPUT,
                TAMPER_HEATMAP,
                TAMPER_OUTPUT,
                OCR_TEXT,
            ]
        );
        assert!(written.iter().all(|p| p.exists()));

        let text = std::fs::read_to_string(writer.dir().join(OCR_TEXT)).unwrap();
        assert_eq!(text, "CAFFEINE 200MG\nEXP 08/27\n");
        let foil = image::open(writer.dir().join(FOIL_CLEAN)).unwrap();
        assert_eq!((foil.width(), foil.height()), (80, 60));
    }

    #[test]
    fn roi_artifact_skipped_without_roi_pass() {
        let mut config = InspectionConfig::default();
        config.recognizer.roi_pass = false;
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();
        let written = writer.write(&inspect(&config)).unwrap();
        assert_eq!(written.len(), 7);
        assert!(!dir.path().join(ROI).exists());
    }
}
