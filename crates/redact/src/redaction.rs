use image::{imageops, Rgba, RgbaImage};
use redact_common::Rect;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    types::{luma, RedactionTool, SimpleImageData},
    verify::{assert_filled, assert_irreversible, BLACKOUT_MAX_MEAN},
};

/// Strength settings for the destructive tools
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RedactionParams {
    /// Gaussian sigma for [`RedactionTool::Blur`]
    pub blur_sigma: f32,
    /// Block edge in pixels for [`RedactionTool::Pixelate`]
    pub pixel_block: u32,
    /// Fill colour for [`RedactionTool::Blackout`]; alpha is always written opaque
    pub fill: [u8; 4],
}

impl Default for RedactionParams {
    fn default() -> Self {
        Self {
            blur_sigma: 8.0,
            pixel_block: 12,
            fill: [0, 0, 0, 255],
        }
    }
}

/// Integer pixel bounds `(x0, y0, x1, y1)` of `rect` inside the image
fn pixel_bounds(image: &RgbaImage, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
    if !rect.is_finite() || rect.is_degenerate() {
        return None;
    }
    let clipped = rect.clip_to(image.width() as f64, image.height() as f64);
    let x0 = clipped.x.floor() as u32;
    let y0 = clipped.y.floor() as u32;
    let x1 = (clipped.right().ceil() as u32).min(image.width());
    let y1 = (clipped.bottom().ceil() as u32).min(image.height());
    (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
}

fn blackout(image: &mut RgbaImage, (x0, y0, x1, y1): (u32, u32, u32, u32), fill: [u8; 4]) {
    let fill = Rgba([fill[0], fill[1], fill[2], 255]);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, fill);
        }
    }
}

fn blur(image: &mut RgbaImage, (x0, y0, x1, y1): (u32, u32, u32, u32), sigma: f32) {
    let region = imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image();
    let blurred = imageops::blur(&region, sigma.max(0.5));
    imageops::replace(image, &blurred, x0 as i64, y0 as i64);
}

fn pixelate(image: &mut RgbaImage, (x0, y0, x1, y1): (u32, u32, u32, u32), block: u32) {
    let block = block.max(2);
    let mut by = y0;
    while by < y1 {
        let bh = block.min(y1 - by);
        let mut bx = x0;
        while bx < x1 {
            let bw = block.min(x1 - bx);
            let mut sum = [0u64; 4];
            for y in by..by + bh {
                for x in bx..bx + bw {
                    let p = image.get_pixel(x, y);
                    for c in 0..4 {
                        sum[c] += p[c] as u64;
                    }
                }
            }
            let n = (bw * bh) as u64;
            let avg = Rgba([
                (sum[0] / n) as u8,
                (sum[1] / n) as u8,
                (sum[2] / n) as u8,
                255,
            ]);
            for y in by..by + bh {
                for x in bx..bx + bw {
                    image.put_pixel(x, y, avg);
                }
            }
            bx += block;
        }
        by += block;
    }
}

/// Post-redaction check; a non-black blackout is checked against its own colour
fn self_check(
    before: &SimpleImageData,
    after: &SimpleImageData,
    tool: RedactionTool,
    params: &RedactionParams,
) -> bool {
    let [r, g, b, _] = params.fill;
    match tool {
        RedactionTool::Blackout if luma(r, g, b) >= BLACKOUT_MAX_MEAN => {
            assert_filled(after, params.fill)
        }
        _ => assert_irreversible(before, after, tool),
    }
}

/// Destructively apply `tool` to the part of `rect` inside `image`.
///
/// Degenerate or fully out-of-bounds rectangles are skipped and return false.
/// Debug builds re-check the result with [`assert_irreversible`] (or
/// [`assert_filled`] for a non-black fill), warning only.
pub fn apply_redaction(
    image: &mut RgbaImage,
    rect: &Rect,
    tool: RedactionTool,
    params: &RedactionParams,
) -> bool {
    let Some(bounds) = pixel_bounds(image, rect) else {
        debug!(?rect, "skipping empty redaction region");
        return false;
    };
    let (x0, y0, x1, y1) = bounds;
    let region = Rect::from_corners(x0 as f64, y0 as f64, x1 as f64, y1 as f64);
    let before = cfg!(debug_assertions).then(|| SimpleImageData::snapshot(image, &region));

    match tool {
        RedactionTool::Blackout => blackout(image, bounds, params.fill),
        RedactionTool::Blur => blur(image, bounds, params.blur_sigma),
        RedactionTool::Pixelate => pixelate(image, bounds, params.pixel_block),
    }

    if let Some(before) = before {
        let after = SimpleImageData::snapshot(image, &region);
        self_check(&before, &after, tool, params);
    }
    true
}

/// Apply `tool` to every rectangle, returning how many were redacted
pub fn apply_redactions(
    image: &mut RgbaImage,
    rects: &[Rect],
    tool: RedactionTool,
    params: &RedactionParams,
) -> usize {
    rects
        .iter()
        .filter(|rect| apply_redaction(image, rect, tool, params))
        .count()
}
