//! Exclusion feature files produced by the feature sources.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tfp_core::{ElevationGrid, ExclusionPolicy, FeatureShape, GeofenceReport, Geofencer};

/// Contents of one feature file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    pub shapes: Vec<FeatureShape>,
    /// Buffers to use instead of the caller's policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ExclusionPolicy>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureDocument {
    Set(FeatureSet),
    Bare(Vec<FeatureShape>),
}

impl FeatureSet {
    pub fn from_json(text: &str) -> Result<Self> {
        let document: FeatureDocument = serde_json::from_str(text)?;
        Ok(match document {
            FeatureDocument::Set(set) => set,
            FeatureDocument::Bare(shapes) => FeatureSet {
                shapes,
                policy: None,
            },
        })
    }
}

/// Read `{ "shapes": [...] }` or a bare array of shapes.
pub fn load_features(path: &Path) -> Result<FeatureSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature file {}", path.display()))?;
    let set = FeatureSet::from_json(&text)
        .with_context(|| format!("Invalid feature file {}", path.display()))?;
    tracing::debug!(shapes = set.shapes.len(), "Loaded features from {}", path.display());
    Ok(set)
}

/// Apply every feature file to `grid`, merging the per-file reports.
///
/// Files without their own policy use `fallback`. Rejected shapes are
/// prefixed with their file and never abort the run, even when nothing
/// could be applied; unreadable files do.
pub fn apply_feature_files(
    grid: &mut ElevationGrid,
    paths: &[impl AsRef<Path>],
    fallback: &ExclusionPolicy,
    flight_altitude_m: Option<f64>,
) -> Result<GeofenceReport> {
    let mut total = GeofenceReport::default();
    let mut fencer = Geofencer::new(grid);
    for path in paths {
        let path = path.as_ref();
        let features = load_features(path)?;
        let policy = features.policy.unwrap_or_else(|| fallback.clone());
        let report = fencer.apply_shapes(&features.shapes, &policy, flight_altitude_m);
        tracing::info!(
            applied = report.applied,
            removed = report.cells_removed,
            "Applied {}",
            path.display()
        );
        total.applied += report.applied;
        total.skipped_altitude += report.skipped_altitude;
        total.cells_removed += report.cells_removed;
        total
            .rejected
            .extend(report.rejected.into_iter().map(|w| format!("{}: {w}", path.display())));
    }

    if total.applied == 0 && !total.rejected.is_empty() {
        tracing::warn!(
            rejected = total.rejected.len(),
            "No usable exclusion shapes, grid left unchanged"
        );
    }
    Ok(total)
}
