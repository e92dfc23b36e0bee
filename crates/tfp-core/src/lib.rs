pub mod adjacency;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod geofence;
pub mod geometry;
pub mod grid;
pub mod pathfinder;
pub mod planner;
pub mod profile;
pub mod simplify;

pub use adjacency::{edge_cost, neighbors, Edge, NEIGHBOR_OFFSETS};
pub use config::{GridMeta, PlannerConfig};
pub use error::{
    ConfigError, GeofenceError, GridError, PlanError, ProfileError, SearchError, ShapeError,
    SimplifyError,
};
pub use exclusion::{
    AltitudeLimit, AltitudeLimits, AltitudeUnit, ExclusionPolicy, ExclusionRegion, FeatureShape,
    ShapeType,
};
pub use geofence::{GeofenceReport, Geofencer};
pub use grid::{Cell, ElevationGrid, GridGeometry, INVALID_ELEVATION};
pub use pathfinder::{find_path, SearchOptions, SearchResult};
pub use planner::{PlannedRoute, RouteWaypoint, TerrainPlanner};
pub use profile::{ProfileSegment, RouteProfile};
pub use simplify::{deviation, simplify_path};
