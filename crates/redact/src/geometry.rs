//! Pure geometry over axis-aligned rectangles and flat polygons.
//!
//! Nothing here errors: malformed input degrades to a zero rectangle or is
//! dropped, so one bad detection never aborts a batch.

use redact_common::{Polygon, Rect};
use tracing::debug;

use crate::types::MergeOptions;

/// Axis-aligned bounding box of a flat polygon.
///
/// Odd-length input, fewer than four values, or no finite coordinate pair
/// yields [`Rect::zero`]. Pairs with a non-finite coordinate are skipped.
pub fn poly_to_rect(poly: &[f64]) -> Rect {
    if poly.len() < 4 || poly.len() % 2 != 0 {
        return Rect::zero();
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut seen = false;

    for pair in poly.chunks_exact(2) {
        let (x, y) = (pair[0], pair[1]);
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        seen = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    if !seen {
        return Rect::zero();
    }

    Rect::new(min_x, min_y, (max_x - min_x).max(0.0), (max_y - min_y).max(0.0))
}

/// Closed 4-point polygon `[x1,y1, x2,y1, x2,y2, x1,y2]` tracing `rect`
pub fn rect_to_polygon(rect: &Rect) -> Polygon {
    let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
    vec![x1, y1, x2, y1, x2, y2, x1, y2]
}

/// Grow `rect` by `pad` on every side; negative `pad` shrinks it.
///
/// Width and height never go below zero. A non-finite `pad` counts as zero.
pub fn inflate_rect(rect: &Rect, pad: f64) -> Rect {
    let pad = if pad.is_finite() { pad } else { 0.0 };
    Rect::new(
        rect.x - pad,
        rect.y - pad,
        (rect.width + 2.0 * pad).max(0.0),
        (rect.height + 2.0 * pad).max(0.0),
    )
}

fn intersection_area(a: &Rect, b: &Rect) -> f64 {
    let w = a.right().min(b.right()) - a.x.max(b.x);
    let h = a.bottom().min(b.bottom()) - a.y.max(b.y);
    if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
}

/// Intersection over union in `[0, 1]`; zero for degenerate or disjoint rectangles
pub fn iou(a: &Rect, b: &Rect) -> f64 {
    if a.is_degenerate() || b.is_degenerate() {
        return 0.0;
    }
    let inter = intersection_area(a, b);
    if inter <= 0.0 {
        return 0.0;
    }
    let union = a.area() + b.area() - inter;
    if union > 0.0 { (inter / union).min(1.0) } else { 0.0 }
}

/// Shortest gap between the boundaries of `a` and `b`.
///
/// Zero when they touch or overlap. Diagonal separation uses the Euclidean
/// length of the horizontal and vertical gaps.
pub fn edge_distance(a: &Rect, b: &Rect) -> f64 {
    let dx = (a.x.max(b.x) - a.right().min(b.right())).max(0.0);
    let dy = (a.y.max(b.y) - a.bottom().min(b.bottom())).max(0.0);
    dx.hypot(dy)
}

/// Smallest rectangle covering both `a` and `b`
pub fn union_rect(a: &Rect, b: &Rect) -> Rect {
    let x1 = a.x.min(b.x);
    let y1 = a.y.min(b.y);
    let x2 = a.right().max(b.right());
    let y2 = a.bottom().max(b.bottom());
    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// Union-find over rectangle indices, discarded after one merge pass
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

fn should_merge(a: &Rect, b: &Rect, iou_thresh: f64, distance_px: f64) -> bool {
    let overlap = iou(a, b);
    (overlap > 0.0 && overlap >= iou_thresh) || edge_distance(a, b) <= distance_px
}

/// One union-find pass; clusters are emitted in order of their first member
fn merge_pass(rects: &[Rect], iou_thresh: f64, distance_px: f64) -> Vec<Rect> {
    let n = rects.len();
    let mut sets = DisjointSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if should_merge(&rects[i], &rects[j], iou_thresh, distance_px) {
                sets.union(i, j);
            }
        }
    }

    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    let mut merged: Vec<Rect> = Vec::new();
    for (i, rect) in rects.iter().enumerate() {
        let root = sets.find(i);
        match slot_of_root[root] {
            Some(slot) => merged[slot] = union_rect(&merged[slot], rect),
            None => {
                slot_of_root[root] = Some(merged.len());
                merged.push(*rect);
            }
        }
    }
    merged
}

/// Collapse overlapping or nearby rectangles into their union boxes.
///
/// Two rectangles belong to the same group when their IoU reaches
/// `iou_thresh` or their boundary gap is within `distance_px`. Passes repeat
/// until no group absorbs another, so the result is a fixed point: running
/// it again with the same options returns the same rectangles.
///
/// Output order follows the first member of each group, not input indices.
pub fn nms_merge_rects(rects: &[Rect], options: &MergeOptions) -> Vec<Rect> {
    let iou_thresh = if options.iou_thresh.is_nan() {
        1.0
    } else {
        options.iou_thresh.clamp(0.0, 1.0)
    };
    let distance_px = if options.distance_px.is_nan() {
        0.0
    } else {
        options.distance_px.max(0.0)
    };

    let mut current: Vec<Rect> = rects.iter().copied().filter(Rect::is_finite).collect();
    if current.len() <= 1 {
        return current;
    }

    let input_len = current.len();
    let mut passes = 0;
    loop {
        passes += 1;
        let merged = merge_pass(&current, iou_thresh, distance_px);
        let changed = merged.len() != current.len();
        current = merged;
        if !changed || current.len() <= 1 {
            break;
        }
    }

    debug!(input = input_len, output = current.len(), passes, "merged rectangles");
    current
}
