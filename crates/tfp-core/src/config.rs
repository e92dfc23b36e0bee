//! Planner and grid metadata configuration.

use crate::error::{ConfigError, GridError};
use crate::grid::GridGeometry;
use serde::{Deserialize, Serialize};
use std::env;

/// Tunables of a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Slope penalty `k`; the default accepts a 10 % detour to avoid a 5 % slope.
    pub slope_factor: f64,
    /// Simplification tolerance in metres. Defaults to the grid scale.
    pub epsilon_m: Option<f64>,
    /// Height weight in the simplifier. Defaults to `epsilon / 10`.
    pub vertical_exaggeration: Option<f64>,
    /// Flight altitude used to select exclusion shapes by altitude band.
    pub flight_altitude_m: Option<f64>,
    /// Height above terrain of exported waypoints.
    pub clearance_m: f64,
    pub max_expansions: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            slope_factor: 0.1 / (0.05 * 0.05),
            epsilon_m: None,
            vertical_exaggeration: None,
            flight_altitude_m: Some(200.0),
            clearance_m: 110.0,
            max_expansions: None,
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `TFP_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Unparseable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_f64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());

        Self {
            slope_factor: parse_f64("TFP_SLOPE_FACTOR").unwrap_or(defaults.slope_factor),
            epsilon_m: parse_f64("TFP_EPSILON_M").or(defaults.epsilon_m),
            vertical_exaggeration: parse_f64("TFP_VERTICAL_EXAGGERATION")
                .or(defaults.vertical_exaggeration),
            flight_altitude_m: parse_f64("TFP_FLIGHT_ALTITUDE_M").or(defaults.flight_altitude_m),
            clearance_m: parse_f64("TFP_CLEARANCE_M").unwrap_or(defaults.clearance_m),
            max_expansions: lookup("TFP_MAX_EXPANSIONS")
                .and_then(|s| s.trim().parse().ok())
                .or(defaults.max_expansions),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.slope_factor.is_finite() || self.slope_factor < 0.0 {
            return Err(ConfigError::SlopeFactor(self.slope_factor));
        }
        let positive = |name: &'static str, value: Option<f64>| match value {
            Some(value) if !value.is_finite() || value <= 0.0 => {
                Err(ConfigError::NotPositive { name, value })
            }
            _ => Ok(()),
        };
        positive("epsilon_m", self.epsilon_m)?;
        positive("vertical_exaggeration", self.vertical_exaggeration)?;
        if !self.clearance_m.is_finite() {
            return Err(ConfigError::NotPositive {
                name: "clearance_m",
                value: self.clearance_m,
            });
        }
        Ok(())
    }

    /// Simplification tolerance for a grid with the given cell size.
    pub fn epsilon_for(&self, scale: f64) -> f64 {
        self.epsilon_m.unwrap_or(scale)
    }

    pub fn exaggeration_for(&self, epsilon: f64) -> f64 {
        self.vertical_exaggeration.unwrap_or(epsilon / 10.0)
    }
}

/// JSON sidecar describing a raw elevation blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMeta {
    pub width: usize,
    pub height: usize,
    /// Projected cell size. Derived from `resolution_m` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_m: Option<f64>,
    /// World coordinate of the north-west corner.
    pub origin: [f64; 2],
    /// Upper bound of the traversable elevation range.
    pub max_elevation_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_lat_deg: Option<f64>,
}

impl GridMeta {
    pub fn geometry(&self) -> Result<GridGeometry, GridError> {
        let origin = (self.origin[0], self.origin[1]);
        match (self.scale_m, self.resolution_m) {
            (Some(scale), _) => Ok(GridGeometry::new(scale, origin)),
            (None, Some(resolution)) => Ok(GridGeometry::mercator(
                resolution,
                self.reference_lat_deg.unwrap_or(0.0),
                origin,
            )),
            (None, None) => Err(GridError::InvalidScale(f64::NAN)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_values() {
        let config = PlannerConfig::default();
        assert_relative_eq!(config.slope_factor, 40.0, epsilon = 1e-9);
        assert_eq!(config.clearance_m, 110.0);
        assert_eq!(config.epsilon_for(148.0), 148.0);
        assert_relative_eq!(config.exaggeration_for(148.0), 14.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("TFP_SLOPE_FACTOR", "12.5"),
            ("TFP_EPSILON_M", "not-a-number"),
            ("TFP_MAX_EXPANSIONS", " 5000 "),
        ]
        .into_iter()
        .collect();
        let config = PlannerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.slope_factor, 12.5);
        assert_eq!(config.epsilon_m, None);
        assert_eq!(config.max_expansions, Some(5000));
        assert_eq!(config.flight_altitude_m, Some(200.0));
    }

    #[test]
    fn validation_rejects_negative_values() {
        let config = PlannerConfig {
            slope_factor: -1.0,
            ..PlannerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SlopeFactor(-1.0)));

        let config = PlannerConfig {
            epsilon_m: Some(0.0),
            ..PlannerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { name: "epsilon_m", .. })
        ));
    }

    #[test]
    fn meta_derives_scale_from_resolution() {
        let meta: GridMeta = serde_json::from_str(
            r#"{"width": 4, "height": 3, "origin": [1000.0, 2000.0],
                "max_elevation_m": 4500, "resolution_m": 100, "reference_lat_deg": 60}"#,
        )
        .unwrap();
        let geometry = meta.geometry().unwrap();
        assert_relative_eq!(geometry.scale, 200.0, epsilon = 1e-9);
        assert_eq!(geometry.origin, (1000.0, 2000.0));

        let explicit = GridMeta {
            scale_m: Some(25.0),
            ..meta
        };
        assert_eq!(explicit.geometry().unwrap().scale, 25.0);
    }

    #[test]
    fn meta_without_scale_is_rejected() {
        let meta = GridMeta {
            width: 1,
            height: 1,
            scale_m: None,
            origin: [0.0, 0.0],
            max_elevation_m: 5000.0,
            resolution_m: None,
            reference_lat_deg: None,
        };
        assert!(matches!(meta.geometry(), Err(GridError::InvalidScale(_))));
    }
}
