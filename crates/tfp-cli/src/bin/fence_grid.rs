//! Remove forbidden areas from an elevation grid and save the result.
//!
//! Usage:
//!   cargo run -p tfp-cli --bin fence_grid -- austria_100.bin --exclude airspace.json --exclude roads.json

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tfp_cli::{
    apply_feature_files, init_tracing, load_grid, meta_path_for, save_grid, write_map_png,
};
use tfp_core::{ExclusionPolicy, PlannerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Remove excluded areas from an elevation grid", long_about = None)]
struct Args {
    /// Raw little-endian f32 elevation blob
    grid: PathBuf,

    /// Grid metadata JSON (default: <GRID>.json)
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Exclusion feature files
    #[arg(long = "exclude", required = true)]
    exclusions: Vec<PathBuf>,

    /// Buffer radius around point features in metres
    #[arg(long, default_value_t = 2000.0)]
    point_radius: f64,

    /// Buffer margin around line features in metres
    #[arg(long, default_value_t = 300.0)]
    line_margin: f64,

    /// Outward offset of polygon features in metres
    #[arg(long, default_value_t = 300.0)]
    polygon_offset: f64,

    /// Flight altitude used to select airspace shapes
    #[arg(long)]
    flight_altitude: Option<f64>,

    /// Output blob (default: <GRID stem>_fenced.bin)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let meta_path = args.meta.clone().unwrap_or_else(|| meta_path_for(&args.grid));
    let mut grid = load_grid(&args.grid, &meta_path)?;
    let flight_altitude = args
        .flight_altitude
        .or(PlannerConfig::from_env().flight_altitude_m);
    let cli_policy = ExclusionPolicy {
        point_radius_m: args.point_radius,
        line_margin_m: args.line_margin,
        polygon_offset_m: args.polygon_offset,
    };

    let before = grid.valid_count();
    let total = apply_feature_files(&mut grid, &args.exclusions, &cli_policy, flight_altitude)?;

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .grid
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "grid".to_string());
        args.grid.with_file_name(format!("{stem}_fenced.bin"))
    });
    save_grid(&grid, &output, &meta_path_for(&output))?;
    write_map_png(&output.with_extension("png"), &grid, &[])?;

    println!("  shapes applied:   {}", total.applied);
    println!("  skipped (alt):    {}", total.skipped_altitude);
    println!("  rejected:         {}", total.rejected.len());
    println!(
        "  cells removed:    {} of {}",
        total.cells_removed, before
    );
    Ok(())
}
