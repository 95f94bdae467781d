use crate::{
    algorithms::{EdgeDetector, EdgeDetectorConfig, ThresholdPolicy},
    pipeline::{PipelineSettings, RegionPipeline},
    traits::Detector,
    types::{MergeOptions, Sensitivity},
};

/// Builder for creating detection pipelines with a fluent API
pub struct PipelineBuilder {
    detector: Option<Box<dyn Detector>>,
    settings: PipelineSettings,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            detector: None,
            settings: PipelineSettings::default(),
        }
    }

    /// Set the detector backend (replaces any existing one)
    pub fn set_detector<D>(mut self, detector: D) -> Self
    where
        D: Detector + 'static,
    {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Use the edge detector with a custom configuration
    pub fn with_edge_config(self, config: EdgeDetectorConfig) -> Self {
        self.set_detector(EdgeDetector::new(config))
    }

    /// Replace every setting at once
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.settings.detect.sensitivity = sensitivity;
        self
    }

    /// Longest edge the image is reduced to before detection
    pub fn with_target_long_edge(mut self, target_long_edge: u32) -> Self {
        self.settings.detect.target_long_edge = target_long_edge;
        self
    }

    /// Padding around each region in full-resolution pixels
    pub fn with_padding(mut self, padding_px: f64) -> Self {
        self.settings.padding_px = padding_px;
        self
    }

    pub fn with_merge(mut self, iou_thresh: f64, distance_px: f64) -> Self {
        self.settings.merge = MergeOptions::new(iou_thresh, distance_px);
        self
    }

    /// Keep regions that extend past the image edge
    pub fn without_clipping(mut self) -> Self {
        self.settings.clip_to_image = false;
        self
    }

    /// Current settings, as `build` would apply them
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Build the pipeline, defaulting to the edge detector
    pub fn build(self) -> RegionPipeline {
        let detector = self
            .detector
            .unwrap_or_else(|| Box::new(EdgeDetector::default()));
        RegionPipeline::new(detector, self.settings)
    }

    /// Edge detector pipeline at the given sensitivity
    pub fn build_with_sensitivity(sensitivity: Sensitivity) -> RegionPipeline {
        Self::new().with_sensitivity(sensitivity).build()
    }

    /// Edge detector with fixed (non-adaptive) threshold levels
    pub fn build_fixed_threshold(sensitivity: Sensitivity) -> RegionPipeline {
        Self::new()
            .with_edge_config(EdgeDetectorConfig {
                threshold: ThresholdPolicy::Fixed,
                ..Default::default()
            })
            .with_sensitivity(sensitivity)
            .build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::detection::tests::text_like_image;

    #[test]
    fn test_builder_applies_settings() {
        let builder = PipelineBuilder::new()
            .with_sensitivity(Sensitivity::High)
            .with_target_long_edge(640)
            .with_padding(6.0)
            .with_merge(0.5, 2.0)
            .without_clipping();
        let settings = *builder.settings();
        let pipeline = builder.build();

        assert_eq!(pipeline.settings(), &settings);
        assert_eq!(settings.detect.sensitivity, Sensitivity::High);
        assert_eq!(settings.detect.target_long_edge, 640);
        assert_eq!(settings.padding_px, 6.0);
        assert_eq!(settings.merge, MergeOptions::new(0.5, 2.0));
        assert!(!settings.clip_to_image);
        assert!(pipeline.info().contains("'edge'"));
    }

    #[test]
    fn test_default_pipeline_finds_text_block() {
        let image = text_like_image(300, 120, &[(30, 50, 15)]);
        let result = PipelineBuilder::build_with_sensitivity(Sensitivity::Med).process(&image);
        assert_eq!(result.regions.len(), 1, "{:?}", result.regions);
        assert!(result.advisory.is_none());

        let region = result.regions[0];
        // Covers the glyph run (30..162 x 50..62) plus padding.
        assert!(region.x <= 30.0 && region.right() >= 162.0, "{:?}", region);
        assert!(region.y <= 50.0 && region.bottom() >= 62.0, "{:?}", region);
    }

    #[test]
    fn test_fixed_threshold_pipeline_on_blank_image() {
        let image = image::RgbaImage::from_pixel(64, 64, image::Rgba([250, 250, 250, 255]));
        let result = PipelineBuilder::build_fixed_threshold(Sensitivity::High).process(&image);
        assert!(result.is_empty());
        assert!(result.advisory.is_none());
    }
}
