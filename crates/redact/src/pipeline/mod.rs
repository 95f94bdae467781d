pub mod builder;
pub mod worker;

use image::RgbaImage;
use redact_common::{Polygon, Rect};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    algorithms::{compute_scale, downscale},
    geometry::{inflate_rect, nms_merge_rects, poly_to_rect},
    traits::Detector,
    types::{DetectOptions, DetectedRegions, MergeOptions},
};

/// Advisory attached to results when the detector could not produce suggestions
pub const DETECTION_UNAVAILABLE: &str = "Automatic detection unavailable; draw regions manually";

/// Full-resolution post-processing applied to detector output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineSettings {
    pub detect: DetectOptions,
    /// Padding added around every region, in full-resolution pixels
    pub padding_px: f64,
    pub merge: MergeOptions,
    /// Clip regions to the image bounds after padding
    pub clip_to_image: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            detect: DetectOptions::default(),
            padding_px: 4.0,
            merge: MergeOptions::default(),
            clip_to_image: true,
        }
    }
}

/// Multiply every coordinate by `factor`
pub fn scale_polygons(polygons: Vec<Polygon>, factor: f64) -> Vec<Polygon> {
    if factor == 1.0 {
        return polygons;
    }
    polygons
        .into_iter()
        .map(|poly| poly.into_iter().map(|v| v * factor).collect())
        .collect()
}

/// Turn detector polygons from the scaled space into final full-resolution regions.
///
/// Order matters: upscale first, then pad and merge, so the padding and merge
/// distances mean the same thing whatever resolution the detector ran at.
pub fn finalize_polygons(
    polygons: Vec<Polygon>,
    scale: f64,
    image_width: u32,
    image_height: u32,
    settings: &PipelineSettings,
) -> Vec<Rect> {
    let upscale = if scale > 0.0 && scale.is_finite() { 1.0 / scale } else { 1.0 };
    let raw = polygons.len();

    let rects: Vec<Rect> = scale_polygons(polygons, upscale)
        .iter()
        .map(|poly| poly_to_rect(poly))
        .filter(|rect| !rect.is_degenerate())
        .map(|rect| inflate_rect(&rect, settings.padding_px))
        .map(|rect| {
            if settings.clip_to_image {
                rect.clip_to(image_width as f64, image_height as f64)
            } else {
                rect
            }
        })
        .filter(|rect| !rect.is_degenerate())
        .collect();

    let merged = nms_merge_rects(&rects, &settings.merge);
    debug!(raw, kept = rects.len(), merged = merged.len(), "finalized regions");
    merged
}

/// Synchronous detection pipeline: scale down, detect, scale up, pad, merge.
pub struct RegionPipeline {
    detector: Box<dyn Detector>,
    settings: PipelineSettings,
}

impl RegionPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(detector: Box<dyn Detector>, settings: PipelineSettings) -> Self {
        Self { detector, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Detect regions in `image`.
    ///
    /// Never fails: a detector error is logged and turned into an empty,
    /// advisory-carrying result so manual redaction stays available.
    pub fn process(&self, image: &RgbaImage) -> DetectedRegions {
        self.process_with(image, &self.settings.detect)
    }

    /// Like [`process`](Self::process), but with `options` replacing the
    /// configured detect options for this run only. The detector is unchanged.
    pub fn process_with(&self, image: &RgbaImage, options: &DetectOptions) -> DetectedRegions {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return DetectedRegions::degraded(width, height, "Image has no pixels");
        }

        let scale = compute_scale(width, height, options.target_long_edge);
        let working = downscale(image, scale);

        let polygons = match self.detector.detect(&working, options) {
            Ok(polygons) => polygons,
            Err(err) => {
                warn!(detector = self.detector.name(), error = %err, "detection failed");
                return DetectedRegions::degraded(width, height, DETECTION_UNAVAILABLE);
            }
        };

        let regions = finalize_polygons(polygons, scale, width, height, &self.settings);
        info!(
            detector = self.detector.name(),
            regions = regions.len(),
            scale,
            "detection complete"
        );

        DetectedRegions {
            regions,
            image_width: width,
            image_height: height,
            scale,
            advisory: None,
        }
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: detector '{}', target long edge {}, sensitivity {}, padding {}px, merge iou>={} / gap<={}px",
            self.detector.name(),
            self.settings.detect.target_long_edge,
            self.settings.detect.sensitivity,
            self.settings.padding_px,
            self.settings.merge.iou_thresh,
            self.settings.merge.distance_px,
        )
    }
}
