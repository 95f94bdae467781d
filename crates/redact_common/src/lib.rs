//! # Redact Common - Shared Types and Utilities
//!
//! Value types shared by the redaction core and its front ends: rectangles,
//! flat polygons and detection candidates, plus a few file helpers.
//!
//! ## Example
//!
//! ```rust
//! use redact_common::{Rect, DetectionCandidate};
//!
//! let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
//! println!("Area: {:.1}px²", rect.area());
//!
//! let candidate = DetectionCandidate::region(0, rect);
//! assert_eq!(candidate.kind, "region");
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for shared helpers
pub type Result<T> = std::result::Result<T, CommonError>;

/// Standard error type for shared helpers
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat polygon `[x1, y1, x2, y2, ...]`.
///
/// Valid detections carry at least four points. Polygons are produced by a
/// detector and reduced to a [`Rect`] straight away.
pub type Polygon = Vec<f64>;

/// Axis-aligned rectangle in pixel units of one coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The `{0, 0, 0, 0}` rectangle returned by fail-soft geometry
    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Build a rectangle from two corners, in any order
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (min_x, max_x) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (min_y, max_y) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// All four fields are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Zero-area rectangles are valid values but never redacted
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if `other` lies entirely within this rectangle (edges inclusive)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Scale every coordinate by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Intersect with `[0, width] x [0, height]`; disjoint rectangles collapse to zero area
    pub fn clip_to(&self, width: f64, height: f64) -> Self {
        let x1 = self.x.clamp(0.0, width);
        let y1 = self.y.clamp(0.0, height);
        let x2 = self.right().clamp(0.0, width);
        let y2 = self.bottom().clamp(0.0, height);
        Self::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }
}

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A candidate redaction region in full-resolution coordinates.
///
/// `kind`, `text` and `confidence` are filled in by an external text
/// classifier; geometry code only looks at `bbox`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionCandidate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    pub confidence: f64,
    pub bbox: Rect,
}

impl DetectionCandidate {
    /// A geometry-only candidate, as produced by the region pipeline
    pub fn region(index: usize, bbox: Rect) -> Self {
        Self {
            id: format!("region-{}", index),
            kind: "region".to_string(),
            text: String::new(),
            confidence: 1.0,
            bbox,
        }
    }
}

/// Utility functions for file handling
pub mod utils {
    use super::*;

    const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"];

    /// Check if a file extension indicates a raster image
    pub fn is_image_file(filename: &str) -> bool {
        get_file_extension(filename)
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Get the lowercase file extension from a filename
    pub fn get_file_extension(filename: &str) -> Option<String> {
        std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Format file size in human-readable format
    pub fn format_file_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

        if bytes == 0 {
            return "0 B".to_string();
        }

        let base = 1024_f64;
        let exp = (bytes as f64).log(base).floor() as usize;
        let exp = exp.min(UNITS.len() - 1);

        let size = bytes as f64 / base.powi(exp as i32);
        format!("{:.1} {}", size, UNITS[exp])
    }

    /// Ensure the parent directory of an output file exists
    pub fn ensure_output_dir(path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
