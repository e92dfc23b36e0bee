//! Altitude profile statistics along a route.

use crate::error::ProfileError;
use crate::grid::{Cell, ElevationGrid};
use serde::{Deserialize, Serialize};

/// One leg between consecutive waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSegment {
    /// Planar distance from the route start to the beginning of this leg.
    pub offset_m: f64,
    pub length_m: f64,
    pub start_elevation_m: f64,
    pub end_elevation_m: f64,
    /// Signed rise over run; negative when descending.
    pub slope: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteProfile {
    /// Planar route length.
    pub length_m: f64,
    pub total_ascent_m: f64,
    pub total_descent_m: f64,
    /// Largest positive slope (0 when the route never climbs).
    pub steepest_climb: f64,
    /// Most negative slope (0 when the route never descends).
    pub steepest_descent: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    pub segments: Vec<ProfileSegment>,
}

impl RouteProfile {
    pub fn compute(grid: &ElevationGrid, waypoints: &[Cell]) -> Result<Self, ProfileError> {
        let elevations = waypoints
            .iter()
            .map(|&cell| grid.elevation(cell).ok_or(ProfileError::InvalidNode(cell)))
            .collect::<Result<Vec<f64>, _>>()?;
        let (&first, _) = elevations.split_first().ok_or(ProfileError::Empty)?;

        let mut profile = RouteProfile {
            length_m: 0.0,
            total_ascent_m: 0.0,
            total_descent_m: 0.0,
            steepest_climb: 0.0,
            steepest_descent: 0.0,
            min_elevation_m: first,
            max_elevation_m: first,
            segments: Vec::with_capacity(waypoints.len().saturating_sub(1)),
        };

        for (cells, heights) in waypoints.windows(2).zip(elevations.windows(2)) {
            let length_m = cells[0].distance(cells[1]) * grid.scale();
            let rise = heights[1] - heights[0];
            let slope = if length_m > 0.0 { rise / length_m } else { 0.0 };

            if rise > 0.0 {
                profile.total_ascent_m += rise;
            } else {
                profile.total_descent_m -= rise;
            }
            profile.steepest_climb = profile.steepest_climb.max(slope);
            profile.steepest_descent = profile.steepest_descent.min(slope);
            profile.min_elevation_m = profile.min_elevation_m.min(heights[1]);
            profile.max_elevation_m = profile.max_elevation_m.max(heights[1]);

            profile.segments.push(ProfileSegment {
                offset_m: profile.length_m,
                length_m,
                start_elevation_m: heights[0],
                end_elevation_m: heights[1],
                slope,
            });
            profile.length_m += length_m;
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use approx::assert_relative_eq;

    #[test]
    fn climb_then_descent() {
        let heights = [100.0, 150.0, 120.0, 120.0];
        let grid = ElevationGrid::from_fn(4, 1, GridGeometry::new(100.0, (0.0, 0.0)), 5000.0, |c| {
            heights[c.x]
        })
        .unwrap();
        let cells: Vec<Cell> = (0..4).map(|x| Cell::new(x, 0)).collect();
        let profile = RouteProfile::compute(&grid, &cells).unwrap();

        assert_relative_eq!(profile.length_m, 300.0);
        assert_relative_eq!(profile.total_ascent_m, 50.0);
        assert_relative_eq!(profile.total_descent_m, 30.0);
        assert_relative_eq!(profile.steepest_climb, 0.5);
        assert_relative_eq!(profile.steepest_descent, -0.3);
        assert_eq!(profile.min_elevation_m, 100.0);
        assert_eq!(profile.max_elevation_m, 150.0);
        assert_eq!(profile.segments.len(), 3);
        assert_relative_eq!(profile.segments[2].offset_m, 200.0);
    }

    #[test]
    fn single_waypoint_has_zero_length() {
        let grid =
            ElevationGrid::filled(2, 2, GridGeometry::new(10.0, (0.0, 0.0)), 5000.0, 42.0).unwrap();
        let profile = RouteProfile::compute(&grid, &[Cell::new(1, 1)]).unwrap();
        assert_eq!(profile.length_m, 0.0);
        assert!(profile.segments.is_empty());
        assert_eq!(RouteProfile::compute(&grid, &[]), Err(ProfileError::Empty));
    }
}
