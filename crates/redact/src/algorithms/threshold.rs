use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold};
use serde::{Deserialize, Serialize};

use crate::types::Sensitivity;

/// How the edge-magnitude map is binarised.
///
/// Both policies lower the cut-off as sensitivity rises, so `High` never
/// lights fewer pixels than `Med`, and `Med` never fewer than `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Otsu's level shifted by `low: +12, med: 0, high: -12`
    #[default]
    Otsu,
    /// Fixed levels `low: 96, med: 64, high: 40`
    Fixed,
}

impl ThresholdPolicy {
    /// Cut-off level for `edges`; pixels strictly above it become foreground
    pub fn level(&self, edges: &GrayImage, sensitivity: Sensitivity) -> u8 {
        match self {
            ThresholdPolicy::Otsu => {
                let bias: i32 = match sensitivity {
                    Sensitivity::Low => 12,
                    Sensitivity::Med => 0,
                    Sensitivity::High => -12,
                };
                (otsu_level(edges) as i32 + bias).clamp(0, 254) as u8
            }
            ThresholdPolicy::Fixed => match sensitivity {
                Sensitivity::Low => 96,
                Sensitivity::Med => 64,
                Sensitivity::High => 40,
            },
        }
    }
}

/// Binary mask (0 / 255) of `edges` above the policy's level
pub fn binarize(edges: &GrayImage, policy: ThresholdPolicy, sensitivity: Sensitivity) -> GrayImage {
    let level = policy.level(edges, sensitivity);
    tracing::trace!(cutoff = level, ?policy, %sensitivity, "edge threshold");
    threshold(edges, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient_image() -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| {
            let v = if (x / 8 + y / 8) % 2 == 0 { x * 4 } else { 255 - y * 3 };
            Luma([v.min(255) as u8])
        })
    }

    fn lit(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] > 0).count()
    }

    #[test]
    fn test_levels_monotonic_with_sensitivity() {
        let edges = gradient_image();
        for policy in [ThresholdPolicy::Otsu, ThresholdPolicy::Fixed] {
            let low = policy.level(&edges, Sensitivity::Low);
            let med = policy.level(&edges, Sensitivity::Med);
            let high = policy.level(&edges, Sensitivity::High);
            assert!(low >= med && med >= high, "{:?}: {} {} {}", policy, low, med, high);
        }
    }

    #[test]
    fn test_mask_grows_with_sensitivity() {
        let edges = gradient_image();
        let low = lit(&binarize(&edges, ThresholdPolicy::Otsu, Sensitivity::Low));
        let high = lit(&binarize(&edges, ThresholdPolicy::Otsu, Sensitivity::High));
        assert!(high >= low);
    }

    #[test]
    fn test_all_zero_edges_give_empty_mask() {
        let edges = GrayImage::new(10, 10);
        for sensitivity in [Sensitivity::Low, Sensitivity::Med, Sensitivity::High] {
            assert_eq!(lit(&binarize(&edges, ThresholdPolicy::Otsu, sensitivity)), 0);
        }
    }
}
