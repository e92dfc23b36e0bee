//! Exclusion regions and the raw shape records delivered by feature sources.

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geometry tag shared with the feature sources (point = 1, line = 2, polygon = 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ShapeType {
    Point = 1,
    Line = 2,
    Polygon = 3,
}

impl TryFrom<u8> for ShapeType {
    type Error = ShapeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ShapeType::Point),
            2 => Ok(ShapeType::Line),
            3 => Ok(ShapeType::Polygon),
            other => Err(ShapeError::UnknownType(other.to_string())),
        }
    }
}

impl TryFrom<&Value> for ShapeType {
    type Error = ShapeError;

    /// Accepts integral tags in range; anything else is reported verbatim.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value
            .as_u64()
            .and_then(|tag| u8::try_from(tag).ok())
            .ok_or_else(|| ShapeError::UnknownType(value.to_string()))
            .and_then(ShapeType::try_from)
    }
}

impl From<ShapeType> for u8 {
    fn from(value: ShapeType) -> Self {
        value as u8
    }
}

/// A region to remove from the grid, in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExclusionRegion {
    /// Discs of `radius_m` around each point.
    Points { points: Vec<[f64; 2]>, radius_m: f64 },
    /// Corridor of `margin_m` around an open polyline.
    Line { vertices: Vec<[f64; 2]>, margin_m: f64 },
    /// Polygon ring, optionally grown outwards by `offset_m`.
    Polygon {
        ring: Vec<[f64; 2]>,
        #[serde(default)]
        offset_m: Option<f64>,
    },
}

impl ExclusionRegion {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ExclusionRegion::Points { .. } => ShapeType::Point,
            ExclusionRegion::Line { .. } => ShapeType::Line,
            ExclusionRegion::Polygon { .. } => ShapeType::Polygon,
        }
    }
}

/// Unit of an altitude limit as published by airspace sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltitudeUnit {
    #[default]
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "ft", alias = "F")]
    Feet,
    #[serde(rename = "FL")]
    FlightLevel,
}

/// One bound of an altitude band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeLimit {
    pub value: f64,
    #[serde(default)]
    pub unit: AltitudeUnit,
}

impl AltitudeLimit {
    pub fn meters(value: f64) -> Self {
        Self {
            value,
            unit: AltitudeUnit::Meters,
        }
    }

    /// Limit converted to metres. Zero is ground level whatever the unit.
    pub fn to_meters(&self) -> f64 {
        if self.value == 0.0 {
            return 0.0;
        }
        match self.unit {
            AltitudeUnit::Meters => self.value,
            AltitudeUnit::Feet => self.value * 0.3048,
            AltitudeUnit::FlightLevel => self.value * 30.48,
        }
    }
}

/// Vertical extent of a restricted volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeLimits {
    pub lower: AltitudeLimit,
    pub upper: AltitudeLimit,
}

impl AltitudeLimits {
    pub fn contains(&self, altitude_m: f64) -> bool {
        self.lower.to_meters() <= altitude_m && altitude_m <= self.upper.to_meters()
    }
}

/// Raw shape record as handed over by a feature source.
///
/// The geometry tag is kept as raw JSON so that unrecognised types (out of
/// range, negative or not a number) survive deserialisation and can be
/// reported instead of failing the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureShape {
    pub shape_type: Value,
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_limits: Option<AltitudeLimits>,
    /// Overrides the policy buffer for this shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_m: Option<f64>,
}

impl FeatureShape {
    pub fn new(shape_type: ShapeType, coordinates: Vec<[f64; 2]>) -> Self {
        Self {
            shape_type: Value::from(u8::from(shape_type)),
            coordinates,
            name: None,
            altitude_limits: None,
            buffer_m: None,
        }
    }

    /// Whether the shape restricts flight at `altitude_m`. Shapes without limits always apply.
    pub fn applies_at(&self, altitude_m: Option<f64>) -> bool {
        match (altitude_m, &self.altitude_limits) {
            (Some(altitude), Some(limits)) => limits.contains(altitude),
            _ => true,
        }
    }

    /// Convert to an exclusion region using the policy's default buffers.
    pub fn to_region(&self, policy: &ExclusionPolicy) -> Result<ExclusionRegion, ShapeError> {
        let shape_type = ShapeType::try_from(&self.shape_type)?;
        let count = self.coordinates.len();
        let require = |kind: &'static str, required: usize| {
            if count < required {
                Err(ShapeError::TooFewCoordinates {
                    kind,
                    required,
                    actual: count,
                })
            } else {
                Ok(())
            }
        };

        match shape_type {
            ShapeType::Point => {
                require("point", 1)?;
                Ok(ExclusionRegion::Points {
                    points: self.coordinates.clone(),
                    radius_m: self.buffer_m.unwrap_or(policy.point_radius_m),
                })
            }
            ShapeType::Line => {
                require("line", 2)?;
                Ok(ExclusionRegion::Line {
                    vertices: self.coordinates.clone(),
                    margin_m: self.buffer_m.unwrap_or(policy.line_margin_m),
                })
            }
            ShapeType::Polygon => {
                require("polygon", 3)?;
                let offset = self.buffer_m.unwrap_or(policy.polygon_offset_m);
                Ok(ExclusionRegion::Polygon {
                    ring: self.coordinates.clone(),
                    offset_m: (offset > 0.0).then_some(offset),
                })
            }
        }
    }
}

/// Default buffer distances per geometry kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionPolicy {
    pub point_radius_m: f64,
    pub line_margin_m: f64,
    pub polygon_offset_m: f64,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            point_radius_m: 2000.0,
            line_margin_m: 300.0,
            polygon_offset_m: 300.0,
        }
    }
}
