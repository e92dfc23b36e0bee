//! Implicit 8-connected adjacency with slope-penalised edge costs.
//!
//! Edges are never stored; they are derived on demand from the fixed
//! neighbour offsets and the elevations of both endpoints.

use crate::grid::{Cell, ElevationGrid};
use std::f64::consts::SQRT_2;

/// Neighbour offsets with their length in cell units: 4 orthogonal, then 4 diagonal.
pub const NEIGHBOR_OFFSETS: [(i64, i64, f64); 8] = [
    (1, 0, 1.0),
    (0, 1, 1.0),
    (-1, 0, 1.0),
    (0, -1, 1.0),
    (1, 1, SQRT_2),
    (-1, 1, SQRT_2),
    (-1, -1, SQRT_2),
    (1, -1, SQRT_2),
];

/// Outgoing edge towards a traversable neighbour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: Cell,
    /// Geometric length in metres.
    pub length: f64,
    /// Slope-penalised cost, never below `length`.
    pub cost: f64,
}

/// Penalised cost of an edge: `length * (1 + k * slope^2)`.
///
/// `slope_factor` must be non-negative for the penalty to be a surcharge;
/// the planner configuration enforces that.
pub fn edge_cost(length: f64, delta_elevation: f64, slope_factor: f64) -> f64 {
    let slope = delta_elevation.abs() / length;
    length * (1.0 + slope_factor * slope * slope)
}

/// Traversable neighbours of `cell` paired with their edge costs.
///
/// Yields nothing when `cell` itself is not traversable, and nothing for a
/// dead end whose neighbours have all been removed.
pub fn neighbors(
    grid: &ElevationGrid,
    cell: Cell,
    slope_factor: f64,
) -> impl Iterator<Item = Edge> + '_ {
    let origin = grid.elevation(cell);
    let scale = grid.scale();
    NEIGHBOR_OFFSETS
        .iter()
        .filter_map(move |&(dx, dy, unit_length)| {
            let from = origin?;
            let nx = cell.x as i64 + dx;
            let ny = cell.y as i64 + dy;
            if !grid.contains(nx, ny) {
                return None;
            }
            let to = Cell::new(nx as usize, ny as usize);
            let elevation = grid.elevation(to)?;
            let length = unit_length * scale;
            Some(Edge {
                to,
                length,
                cost: edge_cost(length, elevation - from, slope_factor),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn flat(size: usize) -> ElevationGrid {
        ElevationGrid::filled(size, size, GridGeometry::new(50.0, (0.0, 0.0)), 5000.0, 100.0)
            .unwrap()
    }

    #[test]
    fn interior_cell_has_eight_neighbours() {
        let grid = flat(3);
        let edges: Vec<Edge> = neighbors(&grid, Cell::new(1, 1), 40.0).collect();
        assert_eq!(edges.len(), 8);
        let diagonals = edges.iter().filter(|edge| edge.length > 50.0).count();
        assert_eq!(diagonals, 4);
        for edge in &edges {
            assert_relative_eq!(edge.cost, edge.length);
        }
    }

    #[test]
    fn corner_cell_is_clipped_to_grid() {
        let grid = flat(3);
        let targets: Vec<Cell> = neighbors(&grid, Cell::new(0, 0), 0.0)
            .map(|edge| edge.to)
            .collect();
        assert_eq!(targets.len(), 3);
        assert!(targets.contains(&Cell::new(1, 1)));
    }

    #[test]
    fn invalid_neighbours_are_skipped_and_dead_ends_yield_nothing() {
        let mut grid = flat(3);
        for (x, y) in [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            grid.invalidate(x, y);
        }
        assert_eq!(neighbors(&grid, Cell::new(1, 1), 1.0).count(), 0);
        assert_eq!(neighbors(&grid, Cell::new(0, 0), 1.0).count(), 0);
    }

    #[test]
    fn slope_penalty_matches_formula() {
        let grid = ElevationGrid::from_fn(2, 1, GridGeometry::new(100.0, (0.0, 0.0)), 5000.0, |c| {
            if c.x == 0 {
                0.0
            } else {
                10.0
            }
        })
        .unwrap();
        let edge = neighbors(&grid, Cell::new(0, 0), 40.0).next().unwrap();
        // slope 0.1 -> 100 * (1 + 40 * 0.01)
        assert_relative_eq!(edge.cost, 140.0, epsilon = 1e-9);
    }

    #[test]
    fn penalised_cost_never_undercuts_length_and_grows_with_slope() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let length = rng.random_range(1.0..500.0);
            let k = rng.random_range(0.0..200.0);
            let delta = rng.random_range(-1000.0..1000.0);
            let cost = edge_cost(length, delta, k);
            assert!(cost >= length);
            let steeper = edge_cost(length, delta.abs() + 1.0, k);
            assert!(steeper >= cost);
        }
    }
}
