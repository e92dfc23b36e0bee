//! Error types for the planning core.

use crate::grid::Cell;
use thiserror::Error;

/// Errors raised while constructing or describing an elevation grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Width or height is zero.
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },

    /// Number of elevation samples does not match `width * height`.
    #[error("expected {expected} elevation samples, got {actual}")]
    SampleCount { expected: usize, actual: usize },

    /// Raw blob length is not a whole number of f32 samples.
    #[error("elevation blob of {0} bytes is not a multiple of 4")]
    BlobLength(usize),

    /// Cell scale must be finite and positive.
    #[error("invalid grid scale {0}")]
    InvalidScale(f64),

    /// Grid origin must be finite.
    #[error("invalid grid origin ({0}, {1})")]
    InvalidOrigin(f64, f64),

    /// Validity upper bound must be finite and non-negative.
    #[error("invalid maximum elevation {0}")]
    InvalidElevationBound(f64),
}

/// Errors raised by the geofencing engine. The grid is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    #[error("exclusion geometry has no coordinates")]
    EmptyGeometry,

    #[error("polygon needs at least 3 vertices, got {0}")]
    PolygonTooSmall(usize),

    #[error("coordinate ({0}, {1}) is not finite")]
    NonFiniteCoordinate(f64, f64),

    #[error("buffer distance {0} must be finite and non-negative")]
    InvalidBuffer(f64),
}

/// Errors raised when a raw feature-source shape cannot be turned into an exclusion region.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("unknown geometry type {0}")]
    UnknownType(String),

    #[error("{kind} shape needs at least {required} coordinates, got {actual}")]
    TooFewCoordinates {
        kind: &'static str,
        required: usize,
        actual: usize,
    },
}

/// Outcome of a failed A* search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Start cell is out of bounds or not traversable.
    #[error("start cell {0} is not traversable")]
    InvalidStart(Cell),

    /// Goal cell is out of bounds or not traversable.
    #[error("goal cell {0} is not traversable")]
    InvalidGoal(Cell),

    /// Frontier exhausted without reaching the goal.
    #[error("no path found after visiting {nodes_visited} nodes")]
    NoPath { nodes_visited: usize },

    /// External cancellation signal was raised.
    #[error("search cancelled after visiting {nodes_visited} nodes")]
    Cancelled { nodes_visited: usize },

    /// Configured cap on frontier pops was hit.
    #[error("search stopped after {limit} expansions")]
    ExpansionLimit { limit: usize },
}

/// Caller contract violations of the path simplifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplifyError {
    #[error("path with {0} nodes cannot be simplified (need at least 2)")]
    TooShort(usize),

    #[error("zero-length anchor segment between path indices {start} and {end}")]
    DegenerateSegment { start: usize, end: usize },

    #[error("path node {0} has no valid elevation")]
    InvalidNode(Cell),

    #[error("invalid tolerance {0}")]
    InvalidTolerance(f64),
}

/// Errors raised while building an altitude profile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("profile needs at least one waypoint")]
    Empty,

    #[error("waypoint {0} has no valid elevation")]
    InvalidNode(Cell),
}

/// Invalid planner configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("slope factor {0} must be finite and non-negative")]
    SlopeFactor(f64),

    #[error("{name} must be finite and positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },
}

/// Umbrella error for a full planning run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("start position ({0}, {1}) lies outside the grid")]
    StartOutsideGrid(f64, f64),

    #[error("goal position ({0}, {1}) lies outside the grid")]
    GoalOutsideGrid(f64, f64),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Simplify(#[from] SimplifyError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl PlanError {
    /// True when the request itself is at fault (bad start/goal, bad config).
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            PlanError::StartOutsideGrid(..)
                | PlanError::GoalOutsideGrid(..)
                | PlanError::Config(_)
                | PlanError::Search(SearchError::InvalidStart(_))
                | PlanError::Search(SearchError::InvalidGoal(_))
        )
    }

    /// True when the request was valid but the goal is unreachable on the fenced grid.
    pub fn is_no_path(&self) -> bool {
        matches!(self, PlanError::Search(SearchError::NoPath { .. }))
    }
}
