//! Plan a terrain-following route between two projected coordinates.
//!
//! Usage:
//!   cargo run -p tfp-cli --bin find_path -- austria_100.bin 1586302.74,6202211.87 1783338.24,5915996.99

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tfp_cli::{
    apply_feature_files, init_tracing, load_grid, lonlat_to_mercator, meta_path_for,
    parse_coordinate, write_kml, write_map_png, write_profile_svg, write_report_json,
    write_svg_overlay,
};
use tfp_core::{ExclusionPolicy, PlannerConfig, TerrainPlanner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find a terrain following path", long_about = None)]
struct Args {
    /// Raw little-endian f32 elevation blob
    grid: PathBuf,

    /// Start coordinate X,Y in EPSG:3857 metres (or LON,LAT with --lonlat)
    #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
    start: (f64, f64),

    /// Goal coordinate X,Y in EPSG:3857 metres (or LON,LAT with --lonlat)
    #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
    goal: (f64, f64),

    /// Grid metadata JSON (default: <GRID>.json)
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Interpret START and GOAL as WGS84 degrees
    #[arg(long)]
    lonlat: bool,

    /// Slope penalty factor
    #[arg(short, long)]
    slope_factor: Option<f64>,

    /// RDP tolerance in metres (default: grid scale)
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Exclusion feature files applied before searching
    #[arg(long = "exclude")]
    exclusions: Vec<PathBuf>,

    /// Flight altitude used to select airspace shapes
    #[arg(long)]
    flight_altitude: Option<f64>,

    /// Output file prefix (default: grid path without extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let mut config = PlannerConfig::from_env();
    if let Some(slope_factor) = args.slope_factor {
        config.slope_factor = slope_factor;
    }
    if let Some(epsilon) = args.epsilon {
        config.epsilon_m = Some(epsilon);
    }
    if args.flight_altitude.is_some() {
        config.flight_altitude_m = args.flight_altitude;
    }

    let meta_path = args.meta.clone().unwrap_or_else(|| meta_path_for(&args.grid));
    let mut grid = load_grid(&args.grid, &meta_path)?;

    if !args.exclusions.is_empty() {
        apply_feature_files(
            &mut grid,
            &args.exclusions,
            &ExclusionPolicy::default(),
            config.flight_altitude_m,
        )?;
    }

    let (start, goal) = if args.lonlat {
        (
            lonlat_to_mercator(args.start.0, args.start.1),
            lonlat_to_mercator(args.goal.0, args.goal.1),
        )
    } else {
        (args.start, args.goal)
    };

    let planner = TerrainPlanner::new(grid, config)?;

    tracing::info!("Searching path ...");
    let started = Instant::now();
    let route = planner.plan(start, goal, None).map_err(|err| {
        if err.is_no_path() {
            anyhow!("{err}; try a larger slope factor or fewer exclusions")
        } else {
            err.into()
        }
    })?;
    tracing::info!(
        dense = route.dense_path.len(),
        waypoints = route.waypoints.len(),
        "Found a path in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    let base = args
        .output
        .clone()
        .unwrap_or_else(|| args.grid.with_extension(""));
    let with_suffix = |suffix: &str| {
        let mut name = base.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };

    write_kml(&with_suffix("_path.kml"), &route.waypoints)?;
    let grid = planner.grid();
    write_map_png(&with_suffix("_path.png"), grid, &route.dense_path)?;
    write_svg_overlay(
        &with_suffix("_path.svg"),
        grid.width(),
        grid.height(),
        &route.waypoints,
    )?;
    write_profile_svg(&with_suffix("_profile.svg"), &route.profile)?;
    write_report_json(&with_suffix("_route.json"), &route)?;

    let profile = &route.profile;
    println!("  path length:      {:.3} km", profile.length_m / 1000.0);
    println!("  steepest climb:   {:.2} %", profile.steepest_climb * 100.0);
    println!("  steepest descent: {:.2} %", profile.steepest_descent * 100.0);
    println!("  total ascent:     {:.0} m", profile.total_ascent_m);
    println!("  total descent:    {:.0} m", profile.total_descent_m);
    Ok(())
}
