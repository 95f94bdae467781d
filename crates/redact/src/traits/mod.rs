use image::RgbaImage;
use redact_common::Polygon;

use crate::{error::Result, types::DetectOptions};

/// Capability interface for anything that proposes text regions.
///
/// Polygons come back in the coordinate space of `image`. They are raw:
/// not merged, padded or filtered by the caller's merge settings. An `Err`
/// is never fatal to callers; they fall back to "no suggestions".
pub trait Detector: Send + Sync {
    /// Propose candidate regions for `image`
    fn detect(&self, image: &RgbaImage, options: &DetectOptions) -> Result<Vec<Polygon>>;

    /// Short backend name used in logs
    fn name(&self) -> &'static str;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&self, image: &RgbaImage, options: &DetectOptions) -> Result<Vec<Polygon>> {
        (**self).detect(image, options)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<D: Detector + ?Sized> Detector for std::sync::Arc<D> {
    fn detect(&self, image: &RgbaImage, options: &DetectOptions) -> Result<Vec<Polygon>> {
        (**self).detect(image, options)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
