//! KML, SVG and JSON export of planned routes.

use crate::projection::mercator_to_lonlat;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tfp_core::{PlannedRoute, RouteProfile, RouteWaypoint};

/// Horizontal and vertical scale of the profile drawing (px per metre).
const PROFILE_SCALE: (f64, f64) = (0.1, 1.0);

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// KML LineString with `lon,lat,altitude` tuples.
pub fn render_kml(waypoints: &[RouteWaypoint]) -> String {
    let mut kml = String::new();
    kml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    kml.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    kml.push_str("  <Document>\n");
    kml.push_str("    <name>Terrain Following Path Planner</name>\n");
    kml.push_str("    <Placemark>\n");
    kml.push_str("      <name>Flight Path</name>\n");
    kml.push_str("      <LineString>\n");
    kml.push_str("        <altitudeMode>absolute</altitudeMode>\n");
    kml.push_str("        <coordinates>\n");
    for waypoint in waypoints {
        let (lon, lat) = mercator_to_lonlat(waypoint.x_m, waypoint.y_m);
        kml.push_str(&format!(
            "          {lon:.7},{lat:.7},{:.1}\n",
            waypoint.altitude_m
        ));
    }
    kml.push_str("        </coordinates>\n");
    kml.push_str("      </LineString>\n");
    kml.push_str("    </Placemark>\n");
    kml.push_str("  </Document>\n");
    kml.push_str("</kml>\n");
    kml
}

pub fn write_kml(path: &Path, waypoints: &[RouteWaypoint]) -> Result<()> {
    write_file(path, &render_kml(waypoints))
}

/// Route polyline in cell coordinates, sized to overlay a `width x height` map image.
pub fn render_svg_overlay(width: usize, height: usize, waypoints: &[RouteWaypoint]) -> String {
    let points = waypoints
        .iter()
        .map(|w| format!("{},{}", w.cell.x, w.cell.y))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" \
         xmlns=\"http://www.w3.org/2000/svg\">\n  \
         <polyline points=\"{points}\" fill=\"none\" stroke=\"black\" />\n</svg>\n"
    )
}

pub fn write_svg_overlay(
    path: &Path,
    width: usize,
    height: usize,
    waypoints: &[RouteWaypoint],
) -> Result<()> {
    write_file(path, &render_svg_overlay(width, height, waypoints))
}

/// Fill colour of a profile leg: white fading to red when climbing, to blue when descending.
fn slope_color(slope: f64) -> (u8, u8, u8) {
    let t = slope.abs().min(1.0);
    let target = if slope >= 0.0 { (255.0, 0.0, 0.0) } else { (0.0, 0.0, 255.0) };
    let mix = |stop: f64| ((1.0 - t) * 255.0 + t * stop).round() as u8;
    (mix(target.0), mix(target.1), mix(target.2))
}

/// Terrain profile along the route, one filled polygon per leg.
pub fn render_profile_svg(profile: &RouteProfile) -> String {
    let width = (profile.length_m * PROFILE_SCALE.0).ceil().max(1.0);
    let height = (profile.max_elevation_m * PROFILE_SCALE.1).ceil().max(1.0);

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" \
         xmlns=\"http://www.w3.org/2000/svg\">\n"
    );
    let mut terrain = Vec::with_capacity(profile.segments.len() + 1);
    if let Some(first) = profile.segments.first() {
        terrain.push((0.0, height - first.start_elevation_m * PROFILE_SCALE.1));
    }

    for segment in &profile.segments {
        let x0 = segment.offset_m * PROFILE_SCALE.0;
        let x1 = (segment.offset_m + segment.length_m) * PROFILE_SCALE.0;
        let y0 = height - segment.start_elevation_m * PROFILE_SCALE.1;
        let y1 = height - segment.end_elevation_m * PROFILE_SCALE.1;
        let (r, g, b) = slope_color(segment.slope);
        svg.push_str(&format!(
            "  <polygon points=\"{x0:.1},{height} {x1:.1},{height} {x1:.1},{y1:.1} {x0:.1},{y0:.1}\" \
             fill=\"rgb({r},{g},{b})\" stroke=\"none\" />\n"
        ));
        terrain.push((x1, y1));
    }

    let line = terrain
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    svg.push_str(&format!(
        "  <polyline points=\"{line}\" fill=\"none\" stroke=\"black\" />\n</svg>\n"
    ));
    svg
}

pub fn write_profile_svg(path: &Path, profile: &RouteProfile) -> Result<()> {
    write_file(path, &render_profile_svg(profile))
}

#[derive(Debug, Serialize)]
struct ReportWaypoint<'a> {
    lon: f64,
    lat: f64,
    #[serde(flatten)]
    waypoint: &'a RouteWaypoint,
}

#[derive(Debug, Serialize)]
struct RouteReport<'a> {
    generated_at: DateTime<Utc>,
    cost: f64,
    nodes_visited: usize,
    dense_nodes: usize,
    max_deviation_m: f64,
    waypoints: Vec<ReportWaypoint<'a>>,
    profile: &'a RouteProfile,
}

pub fn render_report_json(route: &PlannedRoute, generated_at: DateTime<Utc>) -> Result<String> {
    let report = RouteReport {
        generated_at,
        cost: route.cost,
        nodes_visited: route.nodes_visited,
        dense_nodes: route.dense_path.len(),
        max_deviation_m: route.max_deviation,
        waypoints: route
            .waypoints
            .iter()
            .map(|waypoint| {
                let (lon, lat) = mercator_to_lonlat(waypoint.x_m, waypoint.y_m);
                ReportWaypoint { lon, lat, waypoint }
            })
            .collect(),
        profile: &route.profile,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn write_report_json(path: &Path, route: &PlannedRoute) -> Result<()> {
    write_file(path, &render_report_json(route, Utc::now())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_colours_fade_from_white() {
        assert_eq!(slope_color(0.0), (255, 255, 255));
        assert_eq!(slope_color(1.5), (255, 0, 0));
        assert_eq!(slope_color(-1.0), (0, 0, 255));
        assert_eq!(slope_color(0.5), (255, 128, 128));
    }
}
