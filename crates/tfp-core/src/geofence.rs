//! Geofencing: removes grid cells inside or near excluded regions.
//!
//! Every operation converts its geometry to cell space, limits the scan to
//! the buffered bounding box and then refines per cell. Operations only ever
//! invalidate, so applying regions in any order gives the same grid.

use crate::error::GeofenceError;
use crate::exclusion::{ExclusionPolicy, ExclusionRegion, FeatureShape};
use crate::geometry::{
    distance_to_polyline, distance_to_ring, distance_to_segment, ring_contains, BoundingBox, Point,
};
use crate::grid::{Cell, ElevationGrid};
use serde::{Deserialize, Serialize};

/// Summary of a batch of feature-source shapes applied to the grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeofenceReport {
    pub applied: usize,
    pub skipped_altitude: usize,
    /// Data-quality warnings for shapes that could not be used.
    pub rejected: Vec<String>,
    pub cells_removed: usize,
}

/// Exclusive writer over the grid for the geofencing stage.
pub struct Geofencer<'a> {
    grid: &'a mut ElevationGrid,
}

impl<'a> Geofencer<'a> {
    pub fn new(grid: &'a mut ElevationGrid) -> Self {
        Self { grid }
    }

    /// Remove cells closer than `radius_m` to any of the points.
    pub fn remove_near_points(
        &mut self,
        points: &[[f64; 2]],
        radius_m: f64,
    ) -> Result<usize, GeofenceError> {
        let centers = self.to_cell_space(points)?;
        let radius = self.buffer_in_cells(radius_m)?;

        let mut removed = 0;
        for center in centers {
            let bbox = BoundingBox {
                min: center,
                max: center,
            }
            .expanded(radius);
            removed += self.invalidate_where(bbox, |cell| {
                distance_to_segment(cell, center, center) < radius
            });
        }
        Ok(removed)
    }

    /// Remove cells closer than `margin_m` to any segment of the polyline.
    pub fn remove_near_line(
        &mut self,
        polyline: &[[f64; 2]],
        margin_m: f64,
    ) -> Result<usize, GeofenceError> {
        let vertices = self.to_cell_space(polyline)?;
        let margin = self.buffer_in_cells(margin_m)?;
        let Some(bbox) = BoundingBox::around(&vertices) else {
            return Err(GeofenceError::EmptyGeometry);
        };

        Ok(self.invalidate_where(bbox.expanded(margin), |cell| {
            distance_to_polyline(cell, &vertices) < margin
        }))
    }

    /// Remove cells whose sample point lies inside the polygon.
    ///
    /// With an `offset_m` the polygon is grown outwards: cells within the
    /// offset of any ring edge go too. This is evaluated per cell instead of
    /// constructing an offset curve.
    pub fn remove_polygon(
        &mut self,
        polygon: &[[f64; 2]],
        offset_m: Option<f64>,
    ) -> Result<usize, GeofenceError> {
        if polygon.len() < 3 {
            return Err(GeofenceError::PolygonTooSmall(polygon.len()));
        }
        let ring = self.to_cell_space(polygon)?;
        let offset = match offset_m {
            Some(offset) => self.buffer_in_cells(offset)?,
            None => 0.0,
        };
        let Some(bbox) = BoundingBox::around(&ring) else {
            return Err(GeofenceError::EmptyGeometry);
        };

        Ok(self.invalidate_where(bbox.expanded(offset), |cell| {
            ring_contains(&ring, cell) || (offset > 0.0 && distance_to_ring(cell, &ring) < offset)
        }))
    }

    pub fn apply_region(&mut self, region: &ExclusionRegion) -> Result<usize, GeofenceError> {
        let removed = match region {
            ExclusionRegion::Points { points, radius_m } => {
                self.remove_near_points(points, *radius_m)?
            }
            ExclusionRegion::Line { vertices, margin_m } => {
                self.remove_near_line(vertices, *margin_m)?
            }
            ExclusionRegion::Polygon { ring, offset_m } => self.remove_polygon(ring, *offset_m)?,
        };
        tracing::debug!(
            shape = ?region.shape_type(),
            removed,
            "Applied exclusion region"
        );
        Ok(removed)
    }

    /// Apply raw feature-source shapes.
    ///
    /// Shapes outside the flight altitude band are skipped. Unknown geometry
    /// types and malformed shapes are logged and reported, never fatal.
    pub fn apply_shapes(
        &mut self,
        shapes: &[FeatureShape],
        policy: &ExclusionPolicy,
        flight_altitude_m: Option<f64>,
    ) -> GeofenceReport {
        let mut report = GeofenceReport::default();

        for (idx, shape) in shapes.iter().enumerate() {
            let label = shape
                .name
                .clone()
                .unwrap_or_else(|| format!("shape #{idx}"));

            if !shape.applies_at(flight_altitude_m) {
                report.skipped_altitude += 1;
                continue;
            }

            let result = shape
                .to_region(policy)
                .map_err(|err| err.to_string())
                .and_then(|region| self.apply_region(&region).map_err(|err| err.to_string()));

            match result {
                Ok(removed) => {
                    report.applied += 1;
                    report.cells_removed += removed;
                }
                Err(err) => {
                    tracing::warn!("Ignoring exclusion {}: {}", label, err);
                    report.rejected.push(format!("{label}: {err}"));
                }
            }
        }

        tracing::info!(
            applied = report.applied,
            skipped_altitude = report.skipped_altitude,
            rejected = report.rejected.len(),
            cells_removed = report.cells_removed,
            "Geofencing complete"
        );
        report
    }

    fn to_cell_space(&self, coords: &[[f64; 2]]) -> Result<Vec<Point>, GeofenceError> {
        if coords.is_empty() {
            return Err(GeofenceError::EmptyGeometry);
        }
        let geometry = self.grid.geometry();
        coords
            .iter()
            .map(|&[x, y]| {
                if !x.is_finite() || !y.is_finite() {
                    return Err(GeofenceError::NonFiniteCoordinate(x, y));
                }
                Ok(geometry.world_to_cell_space(x, y))
            })
            .collect()
    }

    fn buffer_in_cells(&self, distance_m: f64) -> Result<f64, GeofenceError> {
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(GeofenceError::InvalidBuffer(distance_m));
        }
        Ok(distance_m / self.grid.scale())
    }

    fn invalidate_where<F>(&mut self, bbox: BoundingBox, mut inside: F) -> usize
    where
        F: FnMut(Point) -> bool,
    {
        let Some((xs, ys)) = bbox.cell_range(self.grid.width(), self.grid.height()) else {
            return 0;
        };

        let mut removed = 0;
        for x in xs {
            for y in ys.clone() {
                if inside(Cell::new(x, y).as_f64()) && self.grid.invalidate(x as i64, y as i64) {
                    removed += 1;
                }
            }
        }
        removed
    }
}
