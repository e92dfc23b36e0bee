//! Ramer-Douglas-Peucker simplification of grid paths in 3D.
//!
//! Points are placed at `(x * scale, y * scale, elevation * exaggeration)`
//! so the tolerance is in metres and height changes can be weighted
//! separately from planar deviation.

use crate::error::SimplifyError;
use crate::grid::{Cell, ElevationGrid};

type Point3 = [f64; 3];

fn to_point(grid: &ElevationGrid, cell: Cell, exaggeration: f64) -> Result<Point3, SimplifyError> {
    let elevation = grid
        .elevation(cell)
        .ok_or(SimplifyError::InvalidNode(cell))?;
    let scale = grid.scale();
    Ok([
        cell.x as f64 * scale,
        cell.y as f64 * scale,
        elevation * exaggeration,
    ])
}

fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: Point3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Distance from `point` to the segment between `start` and `end`.
///
/// `None` when the anchors coincide.
fn segment_distance(point: Point3, start: Point3, end: Point3) -> Option<f64> {
    let dir = sub(end, start);
    let len_sq = dot(dir, dir);
    if len_sq.sqrt() <= f64::EPSILON {
        return None;
    }
    let rel = sub(point, start);
    let t = (dot(rel, dir) / len_sq).clamp(0.0, 1.0);
    let closest = [
        start[0] + t * dir[0],
        start[1] + t * dir[1],
        start[2] + t * dir[2],
    ];
    Some(norm(sub(point, closest)))
}

fn check_tolerance(value: f64) -> Result<(), SimplifyError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimplifyError::InvalidTolerance(value));
    }
    Ok(())
}

fn to_points(
    grid: &ElevationGrid,
    path: &[Cell],
    exaggeration: f64,
) -> Result<Vec<Point3>, SimplifyError> {
    path.iter()
        .map(|&cell| to_point(grid, cell, exaggeration))
        .collect()
}

/// Reduce `path` to the waypoints needed to stay within `epsilon` of it.
///
/// The first and last cells are always kept. Among equally distant
/// candidates the earliest one is chosen, so simplifying the output again
/// with the same parameters returns it unchanged.
pub fn simplify_path(
    grid: &ElevationGrid,
    path: &[Cell],
    epsilon: f64,
    vertical_exaggeration: f64,
) -> Result<Vec<Cell>, SimplifyError> {
    if path.len() < 2 {
        return Err(SimplifyError::TooShort(path.len()));
    }
    check_tolerance(epsilon)?;
    check_tolerance(vertical_exaggeration)?;

    let points = to_points(grid, path, vertical_exaggeration)?;
    let last = points.len() - 1;

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0usize, last)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_distance = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let distance = segment_distance(points[i], points[start], points[end])
                .ok_or(SimplifyError::DegenerateSegment { start, end })?;
            if distance > max_distance {
                max_distance = distance;
                max_index = i;
            }
        }

        if max_distance > epsilon {
            keep[max_index] = true;
            stack.push((max_index, end));
            stack.push((start, max_index));
        }
    }

    Ok(path
        .iter()
        .zip(&keep)
        .filter_map(|(cell, &kept)| kept.then_some(*cell))
        .collect())
}

/// Largest distance of any `original` point from the simplified segment
/// that spans it.
///
/// `simplified` must be an ordered subsequence of `original` sharing its endpoints.
pub fn deviation(
    grid: &ElevationGrid,
    original: &[Cell],
    simplified: &[Cell],
    vertical_exaggeration: f64,
) -> Result<f64, SimplifyError> {
    if simplified.len() < 2 {
        return Err(SimplifyError::TooShort(simplified.len()));
    }
    check_tolerance(vertical_exaggeration)?;

    let points = to_points(grid, original, vertical_exaggeration)?;

    // Positions of the simplified cells within the original path.
    let mut anchors = Vec::with_capacity(simplified.len());
    let mut search_from = 0;
    for &cell in simplified {
        let offset = original[search_from..]
            .iter()
            .position(|&c| c == cell)
            .ok_or(SimplifyError::InvalidNode(cell))?;
        anchors.push(search_from + offset);
        search_from += offset;
    }

    let mut worst: f64 = 0.0;
    for pair in anchors.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        for i in (start + 1)..end {
            let distance = segment_distance(points[i], points[start], points[end])
                .ok_or(SimplifyError::DegenerateSegment { start, end })?;
            worst = worst.max(distance);
        }
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use approx::assert_relative_eq;

    fn grid_with(elevation: impl FnMut(Cell) -> f32) -> ElevationGrid {
        ElevationGrid::from_fn(10, 10, GridGeometry::new(10.0, (0.0, 0.0)), 5000.0, elevation)
            .unwrap()
    }

    fn row(y: usize, xs: std::ops::RangeInclusive<usize>) -> Vec<Cell> {
        xs.map(|x| Cell::new(x, y)).collect()
    }

    #[test]
    fn collinear_flat_path_collapses_to_endpoints() {
        let grid = grid_with(|_| 100.0);
        let path = row(2, 0..=9);
        let simplified = simplify_path(&grid, &path, 1.0, 0.1).unwrap();
        assert_eq!(simplified, vec![Cell::new(0, 2), Cell::new(9, 2)]);
    }

    #[test]
    fn corner_is_kept() {
        let grid = grid_with(|_| 100.0);
        let mut path = row(0, 0..=5);
        path.extend((1..=5).map(|y| Cell::new(5, y)));
        let simplified = simplify_path(&grid, &path, 5.0, 0.1).unwrap();
        assert_eq!(
            simplified,
            vec![Cell::new(0, 0), Cell::new(5, 0), Cell::new(5, 5)]
        );
    }

    #[test]
    fn elevation_bump_survives_with_exaggeration() {
        let grid = grid_with(|cell| if cell.x == 5 { 300.0 } else { 100.0 });
        let path = row(0, 0..=9);
        // planar path is straight, only the height differs
        let flat = simplify_path(&grid, &path, 10.0, 0.0).unwrap();
        assert_eq!(flat.len(), 2);
        let lifted = simplify_path(&grid, &path, 10.0, 1.0).unwrap();
        assert!(lifted.contains(&Cell::new(5, 0)));
    }

    #[test]
    fn peak_beyond_the_far_anchor_is_kept() {
        let heights = [1000.0, 1300.0, 1250.0];
        let grid = ElevationGrid::from_fn(3, 1, GridGeometry::new(148.0, (0.0, 0.0)), 5000.0, |cell| {
            heights[cell.x]
        })
        .unwrap();
        let path = row(0, 0..=2);
        // the middle point projects past (2, 0) along the climb
        let simplified = simplify_path(&grid, &path, 500.0, 50.0).unwrap();
        assert_eq!(simplified, path);

        let dropped = vec![Cell::new(0, 0), Cell::new(2, 0)];
        let worst = deviation(&grid, &path, &dropped, 50.0).unwrap();
        assert_relative_eq!(worst, (148.0f64.powi(2) + 2500.0f64.powi(2)).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn two_node_path_is_returned_unchanged() {
        let grid = grid_with(|_| 0.0);
        let path = vec![Cell::new(0, 0), Cell::new(1, 1)];
        assert_eq!(simplify_path(&grid, &path, 1.0, 0.1).unwrap(), path);
    }

    #[test]
    fn contract_violations_are_reported() {
        let mut grid = grid_with(|_| 0.0);
        assert_eq!(
            simplify_path(&grid, &[Cell::new(0, 0)], 1.0, 0.1),
            Err(SimplifyError::TooShort(1))
        );
        let closed = vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(0, 0)];
        assert_eq!(
            simplify_path(&grid, &closed, 1.0, 0.1),
            Err(SimplifyError::DegenerateSegment { start: 0, end: 2 })
        );
        assert!(matches!(
            simplify_path(&grid, &[Cell::new(0, 0), Cell::new(1, 0)], -1.0, 0.1),
            Err(SimplifyError::InvalidTolerance(_))
        ));
        grid.invalidate(1, 0);
        assert_eq!(
            simplify_path(&grid, &[Cell::new(0, 0), Cell::new(1, 0)], 1.0, 0.1),
            Err(SimplifyError::InvalidNode(Cell::new(1, 0)))
        );
    }

    #[test]
    fn deviation_measures_dropped_points() {
        let grid = grid_with(|_| 0.0);
        let path = vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 0)];
        let simplified = vec![Cell::new(0, 0), Cell::new(2, 0)];
        assert_relative_eq!(
            deviation(&grid, &path, &simplified, 0.1).unwrap(),
            10.0,
            epsilon = 1e-9
        );
        assert_eq!(deviation(&grid, &path, &path, 0.1).unwrap(), 0.0);
        assert_eq!(
            deviation(&grid, &path, &[Cell::new(0, 0), Cell::new(5, 5)], 0.1),
            Err(SimplifyError::InvalidNode(Cell::new(5, 5)))
        );
    }
}
