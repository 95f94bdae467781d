use image::RgbaImage;
use redact_common::Polygon;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    algorithms::{
        components::{extract_components, ComponentFilter},
        edges::{edge_magnitude, MagnitudeNorm},
        morphology::close,
        preprocessing::{compute_scale, downscale, to_luma},
        threshold::{binarize, ThresholdPolicy},
    },
    error::Result,
    geometry::{nms_merge_rects, rect_to_polygon},
    traits::Detector,
    types::{DetectOptions, MergeOptions, Sensitivity},
};

/// Tuning for [`EdgeDetector`]. Sizes are in downscaled pixels.
///
/// These values are empirical; expect to retune them against real screenshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDetectorConfig {
    pub threshold: ThresholdPolicy,
    #[serde(skip)]
    pub magnitude: MagnitudeNorm,
    /// Structuring radius for the morphological close
    pub close_radius: u8,
    pub min_dim: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Minimum bounding-box area for `[low, med, high]` sensitivity
    pub min_area: [u32; 3],
    /// Minimum lit fraction of the bounding box for `[low, med, high]`
    pub min_fill_frac: [f64; 3],
    /// Merge applied to surviving blobs before they leave the detector
    pub merge: MergeOptions,
}

impl Default for EdgeDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::Otsu,
            magnitude: MagnitudeNorm::Euclidean,
            close_radius: 2,
            min_dim: 6,
            min_aspect: 0.15,
            max_aspect: 40.0,
            min_area: [80, 48, 24],
            min_fill_frac: [0.05, 0.03, 0.015],
            merge: MergeOptions::new(0.3, 4.0),
        }
    }
}

impl EdgeDetectorConfig {
    /// Component gates for one sensitivity tier
    pub fn filter_for(&self, sensitivity: Sensitivity) -> ComponentFilter {
        let tier = match sensitivity {
            Sensitivity::Low => 0,
            Sensitivity::Med => 1,
            Sensitivity::High => 2,
        };
        ComponentFilter {
            min_dim: self.min_dim,
            min_area: self.min_area[tier],
            min_aspect: self.min_aspect,
            max_aspect: self.max_aspect,
            min_fill_frac: self.min_fill_frac[tier],
        }
    }
}

/// Self-contained text-region detector built on edge density.
///
/// grayscale → Sobel magnitude → threshold → close → connected components
/// → size/aspect/fill filter → merge → back to input resolution.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    pub config: EdgeDetectorConfig,
}

impl EdgeDetector {
    pub fn new(config: EdgeDetectorConfig) -> Self {
        Self { config }
    }
}

impl Detector for EdgeDetector {
    fn detect(&self, image: &RgbaImage, options: &DetectOptions) -> Result<Vec<Polygon>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let scale = compute_scale(width, height, options.target_long_edge);
        let working = downscale(image, scale);
        let gray = to_luma(&working);

        let edges = edge_magnitude(&gray, self.config.magnitude);
        if edges.is_flat() {
            debug!(width, height, "no gradient, nothing to detect");
            return Ok(Vec::new());
        }

        let mask = binarize(&edges.magnitude, self.config.threshold, options.sensitivity);
        let closed = close(&mask, self.config.close_radius);

        let components = extract_components(&closed);
        let raw_count = components.len();
        let kept = self.config.filter_for(options.sensitivity).apply(components);

        let rects: Vec<_> = kept.iter().map(|c| c.to_rect()).collect();
        let merged = nms_merge_rects(&rects, &self.config.merge);

        debug!(
            raw = raw_count,
            kept = kept.len(),
            merged = merged.len(),
            scale,
            sensitivity = %options.sensitivity,
            "edge detection"
        );

        let inverse = 1.0 / scale;
        Ok(merged
            .iter()
            .map(|rect| rect_to_polygon(&rect.scale(inverse)))
            .collect())
    }

    fn name(&self) -> &'static str {
        "edge"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::poly_to_rect;
    use image::Rgba;
    use redact_common::Rect;

    /// White canvas with dark "words": rows of small glyph blocks
    pub(crate) fn text_like_image(width: u32, height: u32, lines: &[(u32, u32, u32)]) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        for &(x0, y0, chars) in lines {
            for c in 0..chars {
                let gx = x0 + c * 9;
                for y in y0..y0 + 12 {
                    for x in gx..gx + 6 {
                        if x < width && y < height && (x + y) % 4 != 0 {
                            image.put_pixel(x, y, Rgba([20, 20, 20, 255]));
                        }
                    }
                }
            }
        }
        image
    }

    #[test]
    fn test_blank_image_yields_no_polygons() {
        let image = RgbaImage::from_pixel(200, 120, Rgba([128, 128, 128, 255]));
        let polygons = EdgeDetector::default()
            .detect(&image, &DetectOptions::default())
            .expect("blank image is not an error");
        assert!(polygons.is_empty());
    }

    #[test]
    fn test_empty_image_yields_no_polygons() {
        let image = RgbaImage::new(0, 0);
        let polygons = EdgeDetector::default().detect(&image, &DetectOptions::default()).unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn test_detects_text_lines_as_separate_regions() {
        let image = text_like_image(320, 200, &[(20, 30, 12), (20, 130, 8)]);
        let polygons = EdgeDetector::default().detect(&image, &DetectOptions::default()).unwrap();
        assert_eq!(polygons.len(), 2, "{:?}", polygons);

        for polygon in &polygons {
            assert_eq!(polygon.len(), 8);
        }
        let mut rects: Vec<Rect> = polygons.iter().map(|p| poly_to_rect(p)).collect();
        rects.sort_by(|a, b| a.y.total_cmp(&b.y));
        assert!(rects[0].contains_rect(&Rect::new(24.0, 34.0, 90.0, 4.0)));
        assert!(rects[0].bottom() < 130.0);
        assert!(rects[1].y > 100.0);
    }

    #[test]
    fn test_output_in_input_resolution_when_downscaled() {
        let image = text_like_image(640, 200, &[(40, 60, 30)]);
        let options = DetectOptions {
            target_long_edge: 320,
            ..Default::default()
        };
        let polygons = EdgeDetector::default().detect(&image, &options).unwrap();
        assert!(!polygons.is_empty());
        let rect = poly_to_rect(&polygons[0]);
        // The glyph run spans x 40..307 in full resolution.
        assert!(rect.x < 60.0 && rect.right() > 280.0, "{:?}", rect);
    }

    #[test]
    fn test_filter_tiers_loosen_with_sensitivity() {
        let config = EdgeDetectorConfig::default();
        let low = config.filter_for(Sensitivity::Low);
        let high = config.filter_for(Sensitivity::High);
        assert!(high.min_area < low.min_area);
        assert!(high.min_fill_frac < low.min_fill_frac);
    }
}
