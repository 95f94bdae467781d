use image::RgbaImage;
use redact_common::{DetectionCandidate, ImageDimensions, Rect};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// How eagerly the edge detector reports faint text
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Med,
    High,
}

/// Destructive pixel transform applied to a region
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RedactionTool {
    #[default]
    Blackout,
    Blur,
    Pixelate,
}

/// Options handed to a detector alongside the bitmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectOptions {
    /// Longest edge, in pixels, the image is reduced to before detection
    pub target_long_edge: u32,
    pub sensitivity: Sensitivity,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            target_long_edge: 1280,
            sensitivity: Sensitivity::Med,
        }
    }
}

/// Thresholds for collapsing overlapping or adjacent rectangles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MergeOptions {
    /// Pairs with IoU at or above this value are merged (clamped to `[0, 1]`)
    pub iou_thresh: f64,
    /// Pairs whose boundary gap is at most this many pixels are merged
    pub distance_px: f64,
}

impl MergeOptions {
    pub fn new(iou_thresh: f64, distance_px: f64) -> Self {
        Self {
            iou_thresh,
            distance_px,
        }
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            iou_thresh: 0.1,
            distance_px: 8.0,
        }
    }
}

/// RGBA pixel buffer, `data.len() == width * height * 4`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleImageData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SimpleImageData {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// A buffer filled with one colour
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self { data, width, height }
    }

    /// Copy the pixels under `rect` out of `image`, clamped to its bounds
    pub fn snapshot(image: &RgbaImage, rect: &Rect) -> Self {
        let clipped = rect.clip_to(image.width() as f64, image.height() as f64);
        let x0 = clipped.x.floor() as u32;
        let y0 = clipped.y.floor() as u32;
        let x1 = (clipped.right().ceil() as u32).min(image.width());
        let y1 = (clipped.bottom().ceil() as u32).min(image.height());
        if x1 <= x0 || y1 <= y0 {
            return Self::new(Vec::new(), 0, 0);
        }
        let view = image::imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image();
        Self::from(view)
    }

    /// Whether `data` actually holds `width * height` RGBA pixels
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * 4
    }

    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height)
    }

    /// Rec.709 luma of the pixel at `(x, y)` in `0..=255`
    pub fn luma_at(&self, x: u32, y: u32) -> f64 {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        luma(self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}

impl From<RgbaImage> for SimpleImageData {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
        }
    }
}

/// Rec.709 luma, the same weights `image` uses for its grayscale conversion
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64
}

/// Final redaction rectangles for one image, in full-resolution pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedRegions {
    pub regions: Vec<Rect>,
    pub image_width: u32,
    pub image_height: u32,
    /// Factor the image was reduced by before detection (1.0 = full size)
    pub scale: f64,
    /// Non-blocking notice when detection degraded to no suggestions
    pub advisory: Option<String>,
}

impl DetectedRegions {
    /// An empty result carrying a notice for the caller
    pub fn degraded(image_width: u32, image_height: u32, advisory: impl Into<String>) -> Self {
        Self {
            regions: Vec::new(),
            image_width,
            image_height,
            scale: 1.0,
            advisory: Some(advisory.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Wrap each region as a detection candidate
    pub fn candidates(&self) -> Vec<DetectionCandidate> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, rect)| DetectionCandidate::region(i, *rect))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_sensitivity_parses_lowercase() {
        assert_eq!("high".parse::<Sensitivity>().unwrap(), Sensitivity::High);
        assert_eq!(Sensitivity::Med.to_string(), "med");
        let json = serde_json::to_string(&Sensitivity::Low).unwrap();
        assert_eq!(json, "\"low\"");
    }

    #[test]
    fn test_snapshot_clamps_to_bounds() {
        let image = RgbaImage::from_pixel(10, 8, Rgba([200, 10, 10, 255]));
        let snap = SimpleImageData::snapshot(&image, &Rect::new(6.0, 4.0, 20.0, 20.0));
        assert_eq!((snap.width, snap.height), (4, 4));
        assert!(snap.is_well_formed());

        let empty = SimpleImageData::snapshot(&image, &Rect::new(50.0, 50.0, 5.0, 5.0));
        assert_eq!((empty.width, empty.height), (0, 0));
    }

    #[test]
    fn test_luma_weights() {
        assert!((luma(255, 255, 255) - 255.0).abs() < 1e-9);
        assert_eq!(luma(0, 0, 0), 0.0);
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: DetectOptions = serde_json::from_str(r#"{"sensitivity":"high"}"#).unwrap();
        assert_eq!(options.target_long_edge, 1280);
        assert_eq!(options.sensitivity, Sensitivity::High);
    }
}
