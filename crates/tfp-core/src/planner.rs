//! End-to-end planning over a fenced grid: locate, search, simplify, profile.

use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::grid::{Cell, ElevationGrid};
use crate::pathfinder::{find_path, SearchOptions};
use crate::profile::RouteProfile;
use crate::simplify::{deviation, simplify_path};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

/// A retained waypoint with its world placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteWaypoint {
    pub cell: Cell,
    pub x_m: f64,
    pub y_m: f64,
    pub elevation_m: f64,
    /// Terrain elevation plus the configured clearance.
    pub altitude_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub dense_path: Vec<Cell>,
    pub waypoints: Vec<RouteWaypoint>,
    pub cost: f64,
    pub nodes_visited: usize,
    /// Largest 3D deviation of the dense path from the waypoint polyline.
    pub max_deviation: f64,
    pub profile: RouteProfile,
}

/// Read-only search stage. Owns the grid once geofencing has finished with it.
#[derive(Debug, Clone)]
pub struct TerrainPlanner {
    grid: ElevationGrid,
    config: PlannerConfig,
}

impl TerrainPlanner {
    pub fn new(grid: ElevationGrid, config: PlannerConfig) -> Result<Self, PlanError> {
        config.validate()?;
        Ok(Self { grid, config })
    }

    pub fn grid(&self) -> &ElevationGrid {
        &self.grid
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Hand the grid back, e.g. to save it.
    pub fn into_grid(self) -> ElevationGrid {
        self.grid
    }

    pub fn plan(
        &self,
        start: (f64, f64),
        goal: (f64, f64),
        cancel: Option<&AtomicBool>,
    ) -> Result<PlannedRoute, PlanError> {
        let start_cell = self
            .grid
            .cell_at_world(start.0, start.1)
            .ok_or(PlanError::StartOutsideGrid(start.0, start.1))?;
        let goal_cell = self
            .grid
            .cell_at_world(goal.0, goal.1)
            .ok_or(PlanError::GoalOutsideGrid(goal.0, goal.1))?;
        self.plan_cells(start_cell, goal_cell, cancel)
    }

    pub fn plan_cells(
        &self,
        start: Cell,
        goal: Cell,
        cancel: Option<&AtomicBool>,
    ) -> Result<PlannedRoute, PlanError> {
        let options = SearchOptions {
            slope_factor: self.config.slope_factor,
            cancel,
            max_expansions: self.config.max_expansions,
        };
        let search = find_path(&self.grid, start, goal, &options)?;

        let epsilon = self.config.epsilon_for(self.grid.scale());
        let exaggeration = self.config.exaggeration_for(epsilon);
        let (simplified, max_deviation) = if search.path.len() < 2 {
            (search.path.clone(), 0.0)
        } else {
            let simplified = simplify_path(&self.grid, &search.path, epsilon, exaggeration)?;
            let max_deviation = deviation(&self.grid, &search.path, &simplified, exaggeration)?;
            (simplified, max_deviation)
        };

        let profile = RouteProfile::compute(&self.grid, &simplified)?;
        let waypoints = simplified
            .iter()
            .filter_map(|&cell| {
                let elevation_m = self.grid.elevation(cell)?;
                let (x_m, y_m) = self.grid.cell_to_world(cell);
                Some(RouteWaypoint {
                    cell,
                    x_m,
                    y_m,
                    elevation_m,
                    altitude_m: elevation_m + self.config.clearance_m,
                })
            })
            .collect::<Vec<_>>();

        tracing::info!(
            start = %start,
            goal = %goal,
            dense = search.path.len(),
            waypoints = waypoints.len(),
            cost = search.cost,
            nodes_visited = search.nodes_visited,
            length_m = profile.length_m,
            "Planned route"
        );

        Ok(PlannedRoute {
            dense_path: search.path,
            waypoints,
            cost: search.cost,
            nodes_visited: search.nodes_visited,
            max_deviation,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::grid::GridGeometry;

    fn planner(config: PlannerConfig) -> TerrainPlanner {
        let grid = ElevationGrid::from_fn(
            12,
            12,
            GridGeometry::new(10.0, (500.0, 1000.0)),
            5000.0,
            |cell| (cell.x * 3) as f32,
        )
        .unwrap();
        TerrainPlanner::new(grid, config).unwrap()
    }

    #[test]
    fn plans_between_world_points() {
        let planner = planner(PlannerConfig::default());
        let route = planner
            .plan((505.0, 995.0), (615.0, 885.0), None)
            .unwrap();

        assert_eq!(route.dense_path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(route.dense_path.last(), Some(&Cell::new(11, 11)));
        let first = route.waypoints[0];
        assert_eq!((first.x_m, first.y_m), (500.0, 1000.0));
        assert_eq!(first.altitude_m, first.elevation_m + 110.0);
        assert!(route.waypoints.len() <= route.dense_path.len());
        assert!(route.max_deviation <= planner.config().epsilon_for(10.0) + 1e-9);
    }

    #[test]
    fn outside_points_are_invalid_requests() {
        let planner = planner(PlannerConfig::default());
        let err = planner.plan((0.0, 0.0), (505.0, 995.0), None).unwrap_err();
        assert_eq!(err, PlanError::StartOutsideGrid(0.0, 0.0));
        assert!(err.is_invalid_request());
        assert!(!err.is_no_path());
    }

    #[test]
    fn single_cell_route() {
        let planner = planner(PlannerConfig::default());
        let route = planner.plan_cells(Cell::new(3, 3), Cell::new(3, 3), None).unwrap();
        assert_eq!(route.waypoints.len(), 1);
        assert_eq!(route.cost, 0.0);
        assert_eq!(route.profile.length_m, 0.0);
    }

    #[test]
    fn fenced_goal_reports_no_path() {
        let mut grid =
            ElevationGrid::filled(5, 5, GridGeometry::new(10.0, (0.0, 0.0)), 5000.0, 1.0).unwrap();
        for y in 0..5 {
            grid.invalidate(2, y);
        }
        let planner = TerrainPlanner::new(grid, PlannerConfig::default()).unwrap();
        let err = planner
            .plan_cells(Cell::new(0, 0), Cell::new(4, 4), None)
            .unwrap_err();
        assert!(err.is_no_path());
        assert!(matches!(err, PlanError::Search(SearchError::NoPath { .. })));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let grid =
            ElevationGrid::filled(2, 2, GridGeometry::new(10.0, (0.0, 0.0)), 5000.0, 1.0).unwrap();
        let config = PlannerConfig {
            slope_factor: f64::NAN,
            ..PlannerConfig::default()
        };
        assert!(TerrainPlanner::new(grid, config).is_err());
    }
}
