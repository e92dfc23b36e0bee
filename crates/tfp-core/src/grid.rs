//! Dense elevation grid: the node store of the planning graph.
//!
//! Every cell is a node addressed by its integer `(x, y)`. Nodes are never
//! removed from the array; geofencing overwrites the elevation with a NaN
//! sentinel, which fails the validity range check.

use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Elevation value used to mark a removed cell.
pub const INVALID_ELEVATION: f32 = f32::NAN;

/// Integer grid coordinate of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Position in continuous cell space.
    pub fn as_f64(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// Straight-line distance to another cell, in cell units.
    pub fn distance(self, other: Cell) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Metric placement of the grid in the projected world frame.
///
/// `origin` is the world coordinate of cell `(0, 0)`, the north-west corner.
/// Columns grow eastwards and rows grow southwards, as in a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Length of one cell edge in metres.
    pub scale: f64,
    pub origin: (f64, f64),
}

impl GridGeometry {
    pub fn new(scale: f64, origin: (f64, f64)) -> Self {
        Self { scale, origin }
    }

    /// Pseudo-Mercator scale for a ground resolution at a reference latitude.
    ///
    /// Projected metres stretch by `1 / cos(lat)`, so a grid meant to hold
    /// `resolution_m` on the ground needs a correspondingly larger step.
    pub fn mercator(resolution_m: f64, reference_lat_deg: f64, origin: (f64, f64)) -> Self {
        let distortion = 1.0 / reference_lat_deg.to_radians().cos();
        Self::new(distortion * resolution_m, origin)
    }

    /// Continuous cell-space coordinate of a world position.
    pub fn world_to_cell_space(&self, x_m: f64, y_m: f64) -> (f64, f64) {
        (
            (x_m - self.origin.0) / self.scale,
            (self.origin.1 - y_m) / self.scale,
        )
    }

    /// Integer cell coordinate of a world position. May lie outside the grid.
    pub fn world_to_cell(&self, x_m: f64, y_m: f64) -> (i64, i64) {
        let (cx, cy) = self.world_to_cell_space(x_m, y_m);
        (cx.floor() as i64, cy.floor() as i64)
    }

    /// World coordinate of a cell's sample point.
    pub fn cell_to_world(&self, cell: Cell) -> (f64, f64) {
        (
            self.origin.0 + cell.x as f64 * self.scale,
            self.origin.1 - cell.y as f64 * self.scale,
        )
    }

    fn validate(&self) -> Result<(), GridError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(GridError::InvalidScale(self.scale));
        }
        if !self.origin.0.is_finite() || !self.origin.1.is_finite() {
            return Err(GridError::InvalidOrigin(self.origin.0, self.origin.1));
        }
        Ok(())
    }
}

/// Elevation samples for every node plus the grid's metric parameters.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    width: usize,
    height: usize,
    geometry: GridGeometry,
    max_elevation: f64,
    values: Vec<f32>,
}

impl ElevationGrid {
    /// Build a grid from `[x][y]`-ordered samples (`index = x * height + y`).
    ///
    /// A cell is traversable while its elevation lies in `[0, max_elevation]`.
    pub fn new(
        width: usize,
        height: usize,
        geometry: GridGeometry,
        max_elevation: f64,
        values: Vec<f32>,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        let expected = width
            .checked_mul(height)
            .ok_or(GridError::EmptyGrid { width, height })?;
        if values.len() != expected {
            return Err(GridError::SampleCount {
                expected,
                actual: values.len(),
            });
        }
        geometry.validate()?;
        if !max_elevation.is_finite() || max_elevation < 0.0 {
            return Err(GridError::InvalidElevationBound(max_elevation));
        }
        Ok(Self {
            width,
            height,
            geometry,
            max_elevation,
            values,
        })
    }

    /// Grid with every cell at the same elevation.
    pub fn filled(
        width: usize,
        height: usize,
        geometry: GridGeometry,
        max_elevation: f64,
        elevation: f32,
    ) -> Result<Self, GridError> {
        let len = width.saturating_mul(height);
        Self::new(width, height, geometry, max_elevation, vec![elevation; len])
    }

    /// Grid whose elevations are produced per cell.
    pub fn from_fn<F>(
        width: usize,
        height: usize,
        geometry: GridGeometry,
        max_elevation: f64,
        mut elevation: F,
    ) -> Result<Self, GridError>
    where
        F: FnMut(Cell) -> f32,
    {
        let mut values = Vec::with_capacity(width.saturating_mul(height));
        for x in 0..width {
            for y in 0..height {
                values.push(elevation(Cell::new(x, y)));
            }
        }
        Self::new(width, height, geometry, max_elevation, values)
    }

    /// Decode a raw little-endian f32 blob in `[x][y]` order.
    pub fn from_le_bytes(
        width: usize,
        height: usize,
        geometry: GridGeometry,
        max_elevation: f64,
        bytes: &[u8],
    ) -> Result<Self, GridError> {
        if bytes.len() % 4 != 0 {
            return Err(GridError::BlobLength(bytes.len()));
        }
        let values = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::new(width, height, geometry, max_elevation, values)
    }

    /// Encode the samples (including invalidation sentinels) as a little-endian f32 blob.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * 4);
        for value in &self.values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn scale(&self) -> f64 {
        self.geometry.scale
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    /// Whether a signed coordinate lies inside the array.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    fn index(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    fn in_range(&self, value: f32) -> bool {
        let value = value as f64;
        (0.0..=self.max_elevation).contains(&value)
    }

    /// Bounds plus elevation-range check for a signed coordinate.
    pub fn is_valid(&self, x: i64, y: i64) -> bool {
        self.contains(x, y) && self.in_range(self.values[self.index(x as usize, y as usize)])
    }

    pub fn is_valid_cell(&self, cell: Cell) -> bool {
        self.elevation(cell).is_some()
    }

    /// Elevation of a traversable cell; `None` when out of bounds or invalid.
    pub fn elevation(&self, cell: Cell) -> Option<f64> {
        if cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        let value = self.values[self.index(cell.x, cell.y)];
        self.in_range(value).then_some(value as f64)
    }

    /// Mark a cell as removed.
    ///
    /// Out-of-bounds coordinates are ignored. Returns `true` only when a
    /// traversable cell was turned invalid, so repeated calls are no-ops.
    pub fn invalidate(&mut self, x: i64, y: i64) -> bool {
        if !self.is_valid(x, y) {
            return false;
        }
        let idx = self.index(x as usize, y as usize);
        self.values[idx] = INVALID_ELEVATION;
        true
    }

    /// Cell containing a world position, if it lies on the grid.
    pub fn cell_at_world(&self, x_m: f64, y_m: f64) -> Option<Cell> {
        let (x, y) = self.geometry.world_to_cell(x_m, y_m);
        self.contains(x, y).then(|| Cell::new(x as usize, y as usize))
    }

    pub fn cell_to_world(&self, cell: Cell) -> (f64, f64) {
        self.geometry.cell_to_world(cell)
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|value| self.in_range(**value)).count()
    }

    /// Traversability of every cell, in storage order.
    pub fn validity_mask(&self) -> Vec<bool> {
        self.values.iter().map(|value| self.in_range(*value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry::new(100.0, (1000.0, 5000.0))
    }

    #[test]
    fn rejects_mismatched_sample_count() {
        let err = ElevationGrid::new(3, 3, geometry(), 5000.0, vec![0.0; 8]).unwrap_err();
        assert_eq!(
            err,
            GridError::SampleCount {
                expected: 9,
                actual: 8
            }
        );
    }

    #[test]
    fn rejects_bad_scale_and_bound() {
        let bad_scale = GridGeometry::new(0.0, (0.0, 0.0));
        assert!(matches!(
            ElevationGrid::filled(2, 2, bad_scale, 5000.0, 1.0),
            Err(GridError::InvalidScale(_))
        ));
        assert!(matches!(
            ElevationGrid::filled(2, 2, geometry(), f64::NAN, 1.0),
            Err(GridError::InvalidElevationBound(_))
        ));
    }

    #[test]
    fn validity_follows_elevation_range() {
        let grid = ElevationGrid::from_fn(3, 1, geometry(), 4000.0, |cell| match cell.x {
            0 => -1.0,
            1 => 4000.0,
            _ => 4000.5,
        })
        .unwrap();
        assert!(!grid.is_valid(0, 0));
        assert!(grid.is_valid(1, 0));
        assert!(!grid.is_valid(2, 0));
        assert!(!grid.is_valid(-1, 0));
        assert!(!grid.is_valid(0, 1));
        assert_eq!(grid.elevation(Cell::new(1, 0)), Some(4000.0));
        assert_eq!(grid.elevation(Cell::new(2, 0)), None);
    }

    #[test]
    fn invalidate_is_idempotent_and_ignores_out_of_bounds() {
        let mut grid = ElevationGrid::filled(4, 4, geometry(), 5000.0, 10.0).unwrap();
        assert!(grid.invalidate(2, 3));
        assert!(!grid.invalidate(2, 3));
        assert!(!grid.invalidate(-5, 2));
        assert!(!grid.invalidate(4, 0));
        assert_eq!(grid.valid_count(), 15);
        assert_eq!(grid.elevation(Cell::new(2, 3)), None);
    }

    #[test]
    fn world_cell_conversion_uses_north_west_origin() {
        let grid = ElevationGrid::filled(10, 10, geometry(), 5000.0, 0.0).unwrap();
        assert_eq!(grid.cell_at_world(1050.0, 4950.0), Some(Cell::new(0, 0)));
        assert_eq!(grid.cell_at_world(1250.0, 4750.0), Some(Cell::new(2, 2)));
        assert_eq!(grid.cell_at_world(999.0, 4950.0), None);
        assert_eq!(grid.cell_at_world(1050.0, 5001.0), None);

        let cell = Cell::new(7, 3);
        let (x_m, y_m) = grid.cell_to_world(cell);
        assert_eq!((x_m, y_m), (1700.0, 4700.0));
        assert_eq!(grid.cell_at_world(x_m, y_m), Some(cell));
    }

    #[test]
    fn blob_round_trip_keeps_sentinels() {
        let mut grid = ElevationGrid::from_fn(3, 2, geometry(), 5000.0, |cell| {
            (cell.x * 10 + cell.y) as f32
        })
        .unwrap();
        grid.invalidate(1, 1);
        let bytes = grid.to_le_bytes();
        assert_eq!(bytes.len(), 24);

        let decoded = ElevationGrid::from_le_bytes(3, 2, geometry(), 5000.0, &bytes).unwrap();
        assert_eq!(decoded.validity_mask(), grid.validity_mask());
        assert_eq!(decoded.elevation(Cell::new(2, 1)), Some(21.0));
        assert!(matches!(
            ElevationGrid::from_le_bytes(3, 2, geometry(), 5000.0, &bytes[..23]),
            Err(GridError::BlobLength(23))
        ));
    }

    #[test]
    fn mercator_scale_grows_with_latitude() {
        let equator = GridGeometry::mercator(100.0, 0.0, (0.0, 0.0));
        let austria = GridGeometry::mercator(100.0, 47.5, (0.0, 0.0));
        assert!((equator.scale - 100.0).abs() < 1e-9);
        assert!((austria.scale - 148.0).abs() < 0.1);
    }
}
