// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text Recognizer Adapter: deskews and binarises the conditioned frame, runs
// an OCR engine over the whole frame, then runs it again over a zoomed crop of
// the bottom-right corner where batch and expiry micro-print usually sits.

pub mod binarize;
pub mod deskew;
#[cfg(feature = "ocr")]
pub mod ocrs_engine;
pub mod transcript;

use image::GrayImage;
use imageproc::contrast::{ThresholdType, threshold};
use medtrace_core::config::RecognizerConfig;
use medtrace_core::error::Result;
use medtrace_core::types::{RecognitionPass, RecognizedLine};
use tracing::{debug, info, instrument};

use crate::conditioner::ConditionedImage;
use crate::raster;

#[cfg(feature = "ocr")]
pub use ocrs_engine::{OcrModelPaths, OcrsRecognizer};
pub use transcript::TranscriptRecognizer;

/// An OCR engine.
///
/// Implementations receive an already binarised raster and return the lines
/// they found, with boxes in that raster's coordinates. They are shared
/// read-only across threads.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name for logs and reports.
    fn name(&self) -> &str;

    fn recognize(&self, image: &GrayImage, pass: RecognitionPass) -> Result<Vec<RecognizedLine>>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &GrayImage, pass: RecognitionPass) -> Result<Vec<RecognizedLine>> {
        (**self).recognize(image, pass)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &GrayImage, pass: RecognitionPass) -> Result<Vec<RecognizedLine>> {
        (**self).recognize(image, pass)
    }
}

/// The zoomed micro-print crop handed to the engine on the second pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiCrop {
    /// Top-left corner of the crop in the deskewed frame.
    pub x: u32,
    pub y: u32,
    /// Upscale factor applied after cropping.
    pub scale: f32,
    /// Upscaled, thresholded crop.
    pub image: GrayImage,
}

impl RoiCrop {
    /// Map a line found in the crop back into frame coordinates.
    pub fn to_frame(&self, line: RecognizedLine) -> RecognizedLine {
        RecognizedLine {
            quad: line
                .quad
                .scaled_then_offset(1.0 / self.scale, self.x as f32, self.y as f32),
            ..line
        }
    }
}

/// Everything the adapter produced for one frame.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Rotation applied by deskewing, degrees counter-clockwise.
    pub skew_angle: f32,
    pub deskewed: GrayImage,
    /// Input to the full-frame pass.
    pub binarized: GrayImage,
    /// Input to the micro-print pass, if it ran.
    pub roi: Option<RoiCrop>,
    pub full_frame: Vec<RecognizedLine>,
    /// Micro-print lines, already in frame coordinates.
    pub region_of_interest: Vec<RecognizedLine>,
}

impl Recognition {
    /// Full-frame lines followed by micro-print lines.
    pub fn lines(&self) -> impl Iterator<Item = &RecognizedLine> {
        self.full_frame.iter().chain(self.region_of_interest.iter())
    }

    pub fn texts(&self) -> Vec<&str> {
        self.lines().map(|line| line.text.as_str()).collect()
    }

    pub fn into_lines(self) -> Vec<RecognizedLine> {
        let mut lines = self.full_frame;
        lines.extend(self.region_of_interest);
        lines
    }
}

/// Drives a [`TextRecognizer`] over a conditioned frame.
#[derive(Debug, Clone)]
pub struct RecognizerAdapter<R> {
    config: RecognizerConfig,
    engine: R,
}

impl<R: TextRecognizer> RecognizerAdapter<R> {
    pub fn new(config: RecognizerConfig, engine: R) -> Self {
        Self { config, engine }
    }

    pub fn engine(&self) -> &R {
        &self.engine
    }

    /// Recognised lines of both passes, full frame first. An empty result is
    /// not an error; an engine failure is.
    pub fn recognize(&self, image: &ConditionedImage) -> Result<Vec<RecognizedLine>> {
        Ok(self.run(image)?.into_lines())
    }

    /// Like [`recognize`](Self::recognize) but keeps the intermediate rasters.
    #[instrument(skip_all, fields(
        engine = self.engine.name(),
        width = image.width(),
        height = image.height(),
    ))]
    pub fn run(&self, image: &ConditionedImage) -> Result<Recognition> {
        let (deskewed, skew_angle) = if self.config.deskew {
            deskew::deskew(image.as_gray())
        } else {
            (image.as_gray().clone(), 0.0)
        };
        debug!(skew_angle, "Frame deskewed");

        let binarized = binarize::adaptive_gaussian_threshold(
            &deskewed,
            self.config.adaptive_block_size,
            self.config.adaptive_offset,
        );

        let full_frame = self.engine.recognize(&binarized, RecognitionPass::FullFrame)?;
        info!(lines = full_frame.len(), "Full-frame pass complete");

        let roi = if self.config.roi_pass { self.roi_crop(&deskewed) } else { None };
        let region_of_interest = match &roi {
            Some(crop) => {
                let lines = self
                    .engine
                    .recognize(&crop.image, RecognitionPass::RegionOfInterest)?;
                info!(lines = lines.len(), "Micro-print pass complete");
                lines.into_iter().map(|line| crop.to_frame(line)).collect()
            }
            None => Vec::new(),
        };

        Ok(Recognition {
            skew_angle,
            deskewed,
            binarized,
            roi,
            full_frame,
            region_of_interest,
        })
    }

    /// Bottom-right `roi_width`×`roi_height` fraction of the frame, upscaled
    /// and globally thresholded. `None` when the crop would be empty.
    pub fn roi_crop(&self, deskewed: &GrayImage) -> Option<RoiCrop> {
        let (w, h) = deskewed.dimensions();
        let x = (w as f32 * (1.0 - self.config.roi_width)) as u32;
        let y = (h as f32 * (1.0 - self.config.roi_height)) as u32;
        if x >= w || y >= h {
            return None;
        }

        let crop = raster::crop(deskewed, x, y, w - x, h - y);
        let scaled = raster::scale_cubic(&crop, self.config.roi_scale);
        debug!(x, y, width = scaled.width(), height = scaled.height(), "Micro-print crop");
        Some(RoiCrop {
            x,
            y,
            scale: self.config.roi_scale,
            image: threshold(&scaled, self.config.roi_threshold, ThresholdType::Binary),
        })
    }
}
