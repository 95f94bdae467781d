use image::GrayImage;
use imageproc::distance_transform::Norm;

/// Dilate then erode by `radius`, joining nearby strokes without growing the outline.
///
/// Uses a square (L∞) structuring element. A zero radius returns the mask unchanged.
pub fn close(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    imageproc::morphology::close(mask, Norm::LInf, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_close_bridges_small_gap() {
        let mut mask = GrayImage::new(30, 11);
        for y in 4..7 {
            for x in 5..12 {
                mask.put_pixel(x, y, Luma([255]));
            }
            for x in 14..21 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let closed = close(&mask, 2);
        assert_eq!(closed.get_pixel(12, 5)[0], 255);
        assert_eq!(closed.get_pixel(13, 5)[0], 255);
        // Outline does not grow past the strokes.
        assert_eq!(closed.get_pixel(2, 5)[0], 0);
        assert_eq!(closed.get_pixel(16, 1)[0], 0);
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let mask = GrayImage::from_fn(8, 8, |x, y| Luma([if (x + y) % 3 == 0 { 255 } else { 0 }]));
        assert_eq!(close(&mask, 0), mask);
    }
}
