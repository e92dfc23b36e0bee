//! TFP CLI - file formats, projection and export around the planning core.
//!
//! Binaries:
//! - find_path: plan a terrain-following route and export it
//! - fence_grid: remove excluded areas from a grid and save it

pub mod export;
pub mod features;
pub mod grid_file;
pub mod map_image;
pub mod projection;

pub use export::{write_kml, write_profile_svg, write_report_json, write_svg_overlay};
pub use features::{apply_feature_files, load_features, FeatureSet};
pub use grid_file::{load_grid, meta_path_for, save_grid};
pub use map_image::{render_map, write_map_png};
pub use projection::{lonlat_to_mercator, mercator_to_lonlat};

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the fmt subscriber, honouring `RUST_LOG` on top of crate-level defaults.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tfp_cli=info".parse()?)
                .add_directive("tfp_core=info".parse()?),
        )
        .init();
    Ok(())
}

/// Parse an `x,y` coordinate pair.
pub fn parse_coordinate(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate '{part}': {err}"))
    };
    Ok((parse(x)?, parse(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(
            parse_coordinate("1586302.74, 6202211.87"),
            Ok((1586302.74, 6202211.87))
        );
        assert!(parse_coordinate("12.5").is_err());
        assert!(parse_coordinate("a,1").is_err());
    }
}
