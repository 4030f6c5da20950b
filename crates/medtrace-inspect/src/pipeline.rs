// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The inspection pipeline: condition the photo once, then run the OCR branch
// and the tamper branch side by side on the shared conditioned frame, and join
// their results into a verdict.

use std::path::Path;

use image::DynamicImage;
use medtrace_core::advisory::{Advisory, advise};
use medtrace_core::config::InspectionConfig;
use medtrace_core::error::Result;
use medtrace_core::integrity::hash_bytes;
use medtrace_core::types::VerdictRecord;
use medtrace_core::verdict::VerdictComposer;
use medtrace_parse::FieldParser;
use medtrace_vision::{
    ConditionedImage, ImageConditioner, Recognition, RecognizerAdapter, TamperAnalysis,
    TamperAnalyzer, TextRecognizer, raster,
};
use tracing::{info, instrument};

use crate::report::{InspectionReport, SourceImage};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub source: SourceImage,
    pub engine: String,
    pub record: VerdictRecord,
    pub conditioned: ConditionedImage,
    pub recognition: Recognition,
    pub tamper: TamperAnalysis,
    pub advisories: Vec<Advisory>,
}

impl Inspection {
    /// The persistable report for this run, with a fresh run id and timestamp.
    pub fn report(&self) -> InspectionReport {
        InspectionReport::from_inspection(self)
    }
}

/// Conditioner, recognizer adapter, field parser, tamper analyzer, and verdict
/// composer wired together. Immutable once built, so a single inspector can
/// serve many photos.
#[derive(Debug)]
pub struct Inspector<R> {
    conditioner: ImageConditioner,
    adapter: RecognizerAdapter<R>,
    parser: FieldParser,
    analyzer: TamperAnalyzer,
    composer: VerdictComposer,
}

impl<R: TextRecognizer> Inspector<R> {
    /// Validate the configuration and build every stage.
    pub fn new(config: &InspectionConfig, engine: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            conditioner: ImageConditioner::new(config.conditioner.clone()),
            adapter: RecognizerAdapter::new(config.recognizer.clone(), engine),
            parser: FieldParser::new(&config.parser)?,
            analyzer: TamperAnalyzer::new(config.tamper.clone()),
            composer: VerdictComposer::new(config.verdict.clone()),
        })
    }

    /// Inspector with the default configuration.
    pub fn with_engine(engine: R) -> Result<Self> {
        Self::new(&InspectionConfig::default(), engine)
    }

    pub fn engine(&self) -> &R {
        self.adapter.engine()
    }

    /// Inspect a decoded photo.
    pub fn inspect(&self, raw: &DynamicImage) -> Result<Inspection> {
        self.run(raw, SourceImage::in_memory(raw.width(), raw.height()))
    }

    /// Decode and inspect encoded image bytes, fingerprinting them.
    pub fn inspect_bytes(&self, data: &[u8]) -> Result<Inspection> {
        let raw = raster::decode(data)?;
        let source = SourceImage {
            sha256: Some(hash_bytes(data)),
            ..SourceImage::in_memory(raw.width(), raw.height())
        };
        self.run(&raw, source)
    }

    /// Read, fingerprint, decode, and inspect an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn inspect_path(&self, path: impl AsRef<Path>) -> Result<Inspection> {
        let data = std::fs::read(path.as_ref())?;
        let mut inspection = self.inspect_bytes(&data)?;
        inspection.source.path = Some(path.as_ref().display().to_string());
        Ok(inspection)
    }

    #[instrument(skip_all, fields(width = source.width, height = source.height))]
    fn run(&self, raw: &DynamicImage, source: SourceImage) -> Result<Inspection> {
        let conditioned = self.conditioner.condition(raw)?;

        let (recognition, tamper) = rayon::join(
            || self.adapter.run(&conditioned),
            || self.analyzer.analyze_detailed(conditioned.as_gray()),
        );
        let recognition = recognition?;

        let fields = self.parser.parse(&recognition.texts());
        let record = self.composer.compose(fields, tamper.assessment.clone());
        let advisories = advise(&record);
        info!(
            verdict = %record.verdict,
            confidence = %record.confidence,
            advisories = advisories.len(),
            "Inspection complete"
        );

        Ok(Inspection {
            source,
            engine: self.adapter.engine().name().to_owned(),
            record,
            conditioned,
            recognition,
            tamper,
            advisories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma, Rgb, RgbImage};
    use medtrace_core::error::MedtraceError;
    use medtrace_core::types::{ParsedFields, Verdict};
    use medtrace_vision::TranscriptRecognizer;

    fn foil() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(160, 120, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 { Rgb([40, 40, 40]) } else { Rgb([220, 220, 220]) }
        }))
    }

    fn strip_text() -> TranscriptRecognizer {
        TranscriptRecognizer::new([
            "Paracetam0l 500mg Tablets I.P.",
            "B.No MH0437",
            "Exp Apr 27",
        ])
    }

    #[test]
    fn transcript_fields_reach_the_verdict() {
        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let inspection = inspector.inspect(&foil()).unwrap();
        let record = &inspection.record;
        assert_eq!(record.drug_name, "PARACETAMOL");
        assert_eq!(record.batch_number, "MH0437");
        assert_eq!(record.expiry_date, "04/27");
        assert!(inspection.advisories.is_empty());
        assert_eq!(inspection.engine, "transcript");
    }

    #[test]
    fn verdict_follows_score() {
        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let record = inspector.inspect(&foil()).unwrap().record;
        assert!((0.0..=100.0).contains(&record.tamper_score));
        let expected = if record.tamper_score > 25.0 {
            Verdict::Suspicious
        } else {
            Verdict::Normal
        };
        assert_eq!(record.verdict, expected);
        assert!(record.confidence.ends_with('%'));
    }

    #[test]
    fn silent_engine_yields_sentinels_and_advice() {
        let inspector = Inspector::with_engine(TranscriptRecognizer::default()).unwrap();
        let inspection = inspector.inspect(&foil()).unwrap();
        assert_eq!(inspection.record.fields(), ParsedFields::default());
        assert_eq!(inspection.advisories.len(), 4);
    }

    #[test]
    fn inspection_is_deterministic() {
        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let a = inspector.inspect(&foil()).unwrap();
        let b = inspector.inspect(&foil()).unwrap();
        assert_eq!(a.record, b.record);
    }

    #[test]
    fn empty_photo_is_fatal() {
        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            inspector.inspect(&empty),
            Err(MedtraceError::EmptyImage { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = InspectionConfig::default();
        config.recognizer.adaptive_block_size = 4;
        assert!(matches!(
            Inspector::new(&config, strip_text()),
            Err(MedtraceError::Config(_))
        ));
    }

    #[test]
    fn inspect_path_fingerprints_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        image::GrayImage::from_pixel(64, 48, Luma([128]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();

        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let inspection = inspector.inspect_path(&path).unwrap();
        assert_eq!(inspection.source.sha256.as_deref(), Some(hash_bytes(&bytes).as_str()));
        assert_eq!(inspection.source.path.as_deref(), Some(path.display().to_string().as_str()));
        assert_eq!((inspection.source.width, inspection.source.height), (64, 48));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let err = inspector.inspect_path("/nonexistent/strip.jpg").unwrap_err();
        assert!(matches!(err, MedtraceError::Io(_)));
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let inspector = Inspector::with_engine(strip_text()).unwrap();
        let err = inspector.inspect_bytes(b"\x89PNG garbage").unwrap_err();
        assert!(matches!(err, MedtraceError::ImageDecode(_)));
    }
}
