//! Planar geometry helpers used by geofencing, in cell-space coordinates.

/// A point in continuous cell space.
pub type Point = (f64, f64);

/// Distance from `point` to the segment `start..end`.
///
/// The projection is clamped to the segment, so the result is the distance
/// to the closest point on it; a zero-length segment degrades to a point.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let (px, py) = (point.0 - start.0, point.1 - start.1);
    let (sx, sy) = (end.0 - start.0, end.1 - start.1);

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq <= f64::EPSILON {
        return (px * px + py * py).sqrt();
    }

    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    let dx = px - t * sx;
    let dy = py - t * sy;
    (dx * dx + dy * dy).sqrt()
}

/// Distance from `point` to the nearest segment of an open polyline.
pub fn distance_to_polyline(point: Point, vertices: &[Point]) -> f64 {
    match vertices {
        [] => f64::INFINITY,
        [only] => distance_to_segment(point, *only, *only),
        _ => vertices
            .windows(2)
            .map(|pair| distance_to_segment(point, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Distance from `point` to the boundary of a ring (closing edge included).
pub fn distance_to_ring(point: Point, ring: &[Point]) -> f64 {
    let n = ring.len();
    if n == 0 {
        return f64::INFINITY;
    }
    let mut best = f64::INFINITY;
    let mut j = n - 1;
    for i in 0..n {
        best = best.min(distance_to_segment(point, ring[j], ring[i]));
        j = i;
    }
    best
}

/// Ray casting point-in-polygon test. The ring may be open or closed.
pub fn ring_contains(ring: &[Point], point: Point) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let (px, py) = point;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounding box in cell space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Smallest box holding all points; `None` for an empty slice.
    pub fn around(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = BoundingBox {
            min: *first,
            max: *first,
        };
        for &(x, y) in rest {
            bbox.min.0 = bbox.min.0.min(x);
            bbox.min.1 = bbox.min.1.min(y);
            bbox.max.0 = bbox.max.0.max(x);
            bbox.max.1 = bbox.max.1.max(y);
        }
        Some(bbox)
    }

    pub fn expanded(self, margin: f64) -> Self {
        BoundingBox {
            min: (self.min.0 - margin, self.min.1 - margin),
            max: (self.max.0 + margin, self.max.1 + margin),
        }
    }

    /// Integer cell range covering the box, clamped to `width x height`.
    ///
    /// Returns `None` when the box misses the grid entirely.
    pub fn cell_range(
        &self,
        width: usize,
        height: usize,
    ) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
        let x0 = self.min.0.floor().max(0.0);
        let y0 = self.min.1.floor().max(0.0);
        let x1 = self.max.0.ceil().min(width as f64 - 1.0);
        let y1 = self.max.1.ceil().min(height as f64 - 1.0);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0 as usize..=x1 as usize, y0 as usize..=y1 as usize))
    }
}
