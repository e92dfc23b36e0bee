//! Raw elevation blob plus JSON metadata sidecar.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tfp_core::{ElevationGrid, GridMeta};

/// Default sidecar location: `<blob>.json`.
pub fn meta_path_for(blob_path: &Path) -> PathBuf {
    let mut name = blob_path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

pub fn load_grid(blob_path: &Path, meta_path: &Path) -> Result<ElevationGrid> {
    let meta_text = fs::read_to_string(meta_path)
        .with_context(|| format!("Failed to read grid metadata {}", meta_path.display()))?;
    let meta: GridMeta = serde_json::from_str(&meta_text)
        .with_context(|| format!("Invalid grid metadata in {}", meta_path.display()))?;

    let bytes = fs::read(blob_path)
        .with_context(|| format!("Failed to read elevation blob {}", blob_path.display()))?;
    let expected = meta.width.saturating_mul(meta.height).saturating_mul(4);
    if bytes.len() != expected {
        bail!(
            "{} holds {} bytes but a {}x{} grid needs {}",
            blob_path.display(),
            bytes.len(),
            meta.width,
            meta.height,
            expected
        );
    }

    let geometry = meta.geometry()?;
    let grid = ElevationGrid::from_le_bytes(
        meta.width,
        meta.height,
        geometry,
        meta.max_elevation_m,
        &bytes,
    )?;
    tracing::info!(
        width = grid.width(),
        height = grid.height(),
        scale_m = grid.scale(),
        valid = grid.valid_count(),
        "Loaded grid {}",
        blob_path.display()
    );
    Ok(grid)
}

pub fn save_grid(grid: &ElevationGrid, blob_path: &Path, meta_path: &Path) -> Result<()> {
    let geometry = grid.geometry();
    let meta = GridMeta {
        width: grid.width(),
        height: grid.height(),
        scale_m: Some(geometry.scale),
        origin: [geometry.origin.0, geometry.origin.1],
        max_elevation_m: grid.max_elevation(),
        resolution_m: None,
        reference_lat_deg: None,
    };

    fs::write(blob_path, grid.to_le_bytes())
        .with_context(|| format!("Failed to write elevation blob {}", blob_path.display()))?;
    fs::write(meta_path, serde_json::to_string_pretty(&meta)?)
        .with_context(|| format!("Failed to write grid metadata {}", meta_path.display()))?;
    tracing::info!(valid = grid.valid_count(), "Saved grid {}", blob_path.display());
    Ok(())
}
