use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// How the Sobel components are combined into one magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagnitudeNorm {
    /// `hypot(gx, gy)`
    #[default]
    Euclidean,
    /// `|gx| + |gy|`, cheaper and slightly stronger on diagonals
    Manhattan,
}

/// Edge magnitude rescaled to `0..=255`
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub magnitude: GrayImage,
    /// Raw magnitude spread (`max - min`) before rescaling; zero on flat input
    pub raw_range: f32,
}

impl EdgeMap {
    /// True when the source image had no gradient anywhere
    pub fn is_flat(&self) -> bool {
        self.raw_range <= f32::EPSILON
    }
}

/// Sobel gradient magnitude of `gray`, normalised by its observed min/max.
///
/// The outermost pixel ring is forced to zero so clamped-border artefacts
/// never show up as edges.
pub fn edge_magnitude(gray: &GrayImage, norm: MagnitudeNorm) -> EdgeMap {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return EdgeMap {
            magnitude: GrayImage::new(width, height),
            raw_range: 0.0,
        };
    }

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let mut raw = vec![0f32; width as usize * height as usize];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let dx = gx.get_pixel(x, y)[0] as f32;
            let dy = gy.get_pixel(x, y)[0] as f32;
            raw[(y * width + x) as usize] = match norm {
                MagnitudeNorm::Euclidean => dx.hypot(dy),
                MagnitudeNorm::Manhattan => dx.abs() + dy.abs(),
            };
        }
    }

    let (min, max) = raw
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    let mut magnitude = GrayImage::new(width, height);
    if range > f32::EPSILON {
        for (i, pixel) in magnitude.pixels_mut().enumerate() {
            let scaled = (raw[i] - min) / range * 255.0;
            *pixel = Luma([scaled.round().clamp(0.0, 255.0) as u8]);
        }
    }

    EdgeMap {
        magnitude,
        raw_range: range.max(0.0),
    }
}
