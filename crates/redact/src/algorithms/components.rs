use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use redact_common::Rect;

/// Bounding box of one connected blob in a binary mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Lit pixels belonging to the blob
    pub fill: u32,
}

impl ComponentBox {
    /// Bounding-box area in pixels
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn fill_fraction(&self) -> f64 {
        let area = self.area();
        if area == 0 { 0.0 } else { self.fill as f64 / area as f64 }
    }

    /// Width over height
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            f64::INFINITY
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x as f64, self.y as f64, self.width as f64, self.height as f64)
    }
}

/// Label 8-connected foreground blobs and return their bounding boxes
pub fn extract_components(mask: &GrayImage) -> Vec<ComponentBox> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    // (min_x, min_y, max_x, max_y, count) per label, label 0 is background
    let mut bounds: Vec<Option<(u32, u32, u32, u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if bounds.len() <= label {
            bounds.resize(label + 1, None);
        }
        bounds[label] = Some(match bounds[label] {
            None => (x, y, x, y, 1),
            Some((x0, y0, x1, y1, n)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y), n + 1),
        });
    }

    bounds
        .into_iter()
        .flatten()
        .map(|(x0, y0, x1, y1, fill)| ComponentBox {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
            fill,
        })
        .collect()
}

/// Size, shape and density gates for raw blobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentFilter {
    pub min_dim: u32,
    pub min_area: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub min_fill_frac: f64,
}

impl ComponentFilter {
    /// Whether `component` looks like a solid run of text strokes
    pub fn accepts(&self, component: &ComponentBox) -> bool {
        if component.width < self.min_dim || component.height < self.min_dim {
            return false;
        }
        if component.area() < self.min_area {
            return false;
        }
        let aspect = component.aspect();
        if aspect < self.min_aspect || aspect > self.max_aspect {
            return false;
        }
        component.fill_fraction() >= self.min_fill_frac
    }

    pub fn apply(&self, components: Vec<ComponentBox>) -> Vec<ComponentBox> {
        components.into_iter().filter(|c| self.accepts(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_block(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([255]));
            }
        }
    }

    fn filter() -> ComponentFilter {
        ComponentFilter {
            min_dim: 6,
            min_area: 48,
            min_aspect: 0.15,
            max_aspect: 40.0,
            min_fill_frac: 0.03,
        }
    }

    #[test]
    fn test_extract_two_blobs() {
        let mut mask = GrayImage::new(60, 40);
        fill_block(&mut mask, 2, 3, 10, 5);
        fill_block(&mut mask, 30, 20, 20, 8);
        let mut boxes = extract_components(&mask);
        boxes.sort_by_key(|b| b.x);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], ComponentBox { x: 2, y: 3, width: 10, height: 5, fill: 50 });
        assert_eq!(boxes[1].area(), 160);
        assert_eq!(boxes[1].fill_fraction(), 1.0);
    }

    #[test]
    fn test_diagonal_pixels_join_under_eight_connectivity() {
        let mut mask = GrayImage::new(10, 10);
        for i in 0..6 {
            mask.put_pixel(i, i, Luma([255]));
        }
        let boxes = extract_components(&mask);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].fill, 6);
    }

    #[test]
    fn test_filter_rejects_small_thin_and_sparse() {
        let f = filter();
        let line = ComponentBox { x: 0, y: 0, width: 120, height: 12, fill: 900 };
        assert!(f.accepts(&line));

        let speck = ComponentBox { x: 0, y: 0, width: 5, height: 20, fill: 100 };
        assert!(!f.accepts(&speck));

        let tiny = ComponentBox { x: 0, y: 0, width: 6, height: 6, fill: 36 };
        assert!(!f.accepts(&tiny));

        let sliver = ComponentBox { x: 0, y: 0, width: 500, height: 6, fill: 3000 };
        assert!(!f.accepts(&sliver));

        let sparse = ComponentBox { x: 0, y: 0, width: 100, height: 100, fill: 100 };
        assert!(!f.accepts(&sparse));
    }
}
