//! Post-hoc checks that a redaction actually destroyed the pixels under it.
//!
//! These are a development safety net: failures are logged, never raised,
//! and never block an export.

use redact_common::Rect;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{luma, RedactionTool, SimpleImageData};

/// Luma spread allowed inside a blackout
pub const BLACKOUT_TOLERANCE: f64 = 2.0;
/// Mean luma a blackout must stay under
pub const BLACKOUT_MAX_MEAN: f64 = 5.0;
/// A blur must bring variance below this fraction of the original
pub const BLUR_MAX_VARIANCE_RATIO: f64 = 0.6;
/// Mean absolute luma change a pixelation must exceed
pub const PIXELATE_MIN_MEAN_DIFF: f64 = 5.0;

/// Luma statistics over a pixel region, all zero when the region is empty
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RegionStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    pub count: usize,
}

/// Luma statistics of the `w` x `h` region at `(x, y)`, clamped to the image.
///
/// Regions that are empty, inverted or fully outside the image (and buffers
/// whose length does not match their dimensions) give zeroed stats.
pub fn region_stats(image: &SimpleImageData, x: i64, y: i64, w: i64, h: i64) -> RegionStats {
    if !image.is_well_formed() || w <= 0 || h <= 0 {
        return RegionStats::default();
    }
    let x0 = x.clamp(0, image.width as i64) as u32;
    let y0 = y.clamp(0, image.height as i64) as u32;
    let x1 = x.saturating_add(w).clamp(0, image.width as i64) as u32;
    let y1 = y.saturating_add(h).clamp(0, image.height as i64) as u32;
    if x1 <= x0 || y1 <= y0 {
        return RegionStats::default();
    }

    // Welford's running mean and variance
    let mut count = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for py in y0..y1 {
        for px in x0..x1 {
            let value = image.luma_at(px, py);
            count += 1;
            let delta = value - mean;
            mean += delta / count as f64;
            m2 += delta * (value - mean);
            min = min.min(value);
            max = max.max(value);
        }
    }

    RegionStats {
        min,
        max,
        mean,
        variance: m2 / count as f64,
        count,
    }
}

fn rect_stats(image: &SimpleImageData, rect: &Rect) -> RegionStats {
    if !rect.is_finite() {
        return RegionStats::default();
    }
    let x = rect.x.floor() as i64;
    let y = rect.y.floor() as i64;
    let w = (rect.right().ceil() as i64).saturating_sub(x);
    let h = (rect.bottom().ceil() as i64).saturating_sub(y);
    region_stats(image, x, y, w, h)
}

/// True when luma varies by at most `tolerance` inside `rect`.
///
/// An empty region has nothing that could vary and counts as uniform.
pub fn is_uniform_region(image: &SimpleImageData, rect: &Rect, tolerance: f64) -> bool {
    let stats = rect_stats(image, rect);
    stats.max - stats.min <= tolerance
}

fn whole(image: &SimpleImageData) -> Rect {
    Rect::new(0.0, 0.0, image.width as f64, image.height as f64)
}

/// Mean absolute luma difference over the overlap of two buffers
fn mean_abs_diff(before: &SimpleImageData, after: &SimpleImageData) -> f64 {
    let width = before.width.min(after.width);
    let height = before.height.min(after.height);
    let count = width as usize * height as usize;
    if count == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for y in 0..height {
        for x in 0..width {
            total += (before.luma_at(x, y) - after.luma_at(x, y)).abs();
        }
    }
    total / count as f64
}

/// Outcome of one irreversibility check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub tool: RedactionTool,
    pub passed: bool,
    pub before: RegionStats,
    pub after: RegionStats,
    /// Only measured for pixelation
    pub mean_abs_diff: Option<f64>,
    /// Why the check passed or failed
    pub reason: &'static str,
}

/// Compare `before` and `after` snapshots of one region redacted with `tool`.
///
/// Mismatched or zero dimensions pass: there is nothing to compare.
pub fn verify_redaction(
    before: &SimpleImageData,
    after: &SimpleImageData,
    tool: RedactionTool,
) -> VerificationReport {
    let comparable = before.is_well_formed()
        && after.is_well_formed()
        && before.dimensions() == after.dimensions()
        && !before.dimensions().is_empty();

    let before_stats = rect_stats(before, &whole(before));
    let after_stats = rect_stats(after, &whole(after));
    let report = |passed: bool, mean_abs_diff: Option<f64>, reason: &'static str| {
        VerificationReport {
            tool,
            passed,
            before: before_stats,
            after: after_stats,
            mean_abs_diff,
            reason,
        }
    };

    if !comparable {
        return report(true, None, "nothing comparable");
    }

    match tool {
        RedactionTool::Blackout => {
            if !is_uniform_region(after, &whole(after), BLACKOUT_TOLERANCE) {
                report(false, None, "fill is not uniform")
            } else if after_stats.mean >= BLACKOUT_MAX_MEAN {
                report(false, None, "fill is not black")
            } else {
                report(true, None, "uniform black fill")
            }
        }
        RedactionTool::Blur => {
            if after_stats.variance < before_stats.variance * BLUR_MAX_VARIANCE_RATIO {
                report(true, None, "variance reduced")
            } else {
                report(false, None, "variance barely reduced")
            }
        }
        RedactionTool::Pixelate => {
            let diff = mean_abs_diff(before, after);
            if diff > PIXELATE_MIN_MEAN_DIFF {
                report(true, Some(diff), "pixels changed")
            } else {
                report(false, Some(diff), "pixels barely changed")
            }
        }
    }
}

/// Whether redacting with `tool` turned `before` into an unrecoverable `after`.
///
/// Logs a warning on failure; callers should never block on the result.
pub fn assert_irreversible(
    before: &SimpleImageData,
    after: &SimpleImageData,
    tool: RedactionTool,
) -> bool {
    let report = verify_redaction(before, after, tool);
    if report.passed {
        debug!(%tool, reason = report.reason, "redaction verified");
    } else {
        warn!(
            %tool,
            reason = report.reason,
            before_mean = report.before.mean,
            before_variance = report.before.variance,
            after_mean = report.after.mean,
            after_variance = report.after.variance,
            mean_abs_diff = ?report.mean_abs_diff,
            "redaction may be reversible"
        );
    }
    report.passed
}

/// Whether `after` is a uniform fill of `fill`, for blackouts drawn in a custom colour.
///
/// Same uniformity bound as a black fill, but the mean must sit near the
/// fill's own luma instead of near zero. Logs a warning on failure.
pub fn assert_filled(after: &SimpleImageData, fill: [u8; 4]) -> bool {
    if !after.is_well_formed() || after.dimensions().is_empty() {
        return true;
    }
    let stats = rect_stats(after, &whole(after));
    let expected = luma(fill[0], fill[1], fill[2]);
    let passed = stats.max - stats.min <= BLACKOUT_TOLERANCE
        && (stats.mean - expected).abs() <= BLACKOUT_TOLERANCE;
    if passed {
        debug!(expected, "fill verified");
    } else {
        warn!(
            expected,
            mean = stats.mean,
            min = stats.min,
            max = stats.max,
            "fill does not cover the region"
        );
    }
    passed
}
