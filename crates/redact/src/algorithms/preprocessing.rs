use image::{imageops::FilterType, DynamicImage, GrayImage, RgbaImage};
use redact_common::ImageDimensions;

/// Factor that brings the longest edge down to `target_long_edge`.
///
/// Never above 1.0: images are only ever reduced. Empty images and a zero
/// target leave the scale at 1.0.
pub fn compute_scale(width: u32, height: u32, target_long_edge: u32) -> f64 {
    let long_edge = ImageDimensions::new(width, height).long_edge();
    if long_edge == 0 || target_long_edge == 0 {
        return 1.0;
    }
    (target_long_edge as f64 / long_edge as f64).min(1.0)
}

/// Resample `image` by `scale` with a Lanczos filter; a scale of 1.0 or more copies it
pub fn downscale(image: &RgbaImage, scale: f64) -> RgbaImage {
    if scale >= 1.0 || !scale.is_finite() || scale <= 0.0 {
        return image.clone();
    }
    let width = ((image.width() as f64 * scale).round() as u32).max(1);
    let height = ((image.height() as f64 * scale).round() as u32).max(1);
    image::imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Rec.709 grayscale (`Y = 0.2126R + 0.7152G + 0.0722B`), alpha ignored
pub fn to_luma(image: &RgbaImage) -> GrayImage {
    DynamicImage::ImageRgba8(image.clone()).to_luma8()
}
