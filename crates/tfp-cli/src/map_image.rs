//! Terrain-coloured PNG map with the planned route drawn over it.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::path::Path;
use tfp_core::{Cell, ElevationGrid};

/// Colour stops from lowland green to rock grey, spread over `[0, max_elevation]`.
const TERRAIN_PALETTE: [[u8; 3]; 6] = [
    [0, 102, 43],
    [51, 204, 0],
    [220, 216, 102],
    [220, 170, 62],
    [153, 100, 43],
    [180, 180, 180],
];

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const PATH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const ENDPOINT_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Palette colour for a normalised elevation; out of range values get the background.
pub fn terrain_color(fraction: f64) -> Rgb<u8> {
    if !(0.0..=1.0).contains(&fraction) {
        return BACKGROUND;
    }
    let position = fraction * (TERRAIN_PALETTE.len() - 1) as f64;
    let idx = position.floor() as usize;
    let Some(next) = TERRAIN_PALETTE.get(idx + 1) else {
        return Rgb(TERRAIN_PALETTE[TERRAIN_PALETTE.len() - 1]);
    };
    let low = TERRAIN_PALETTE[idx];
    let offset = position - idx as f64;
    let mix = |i: usize| ((1.0 - offset) * low[i] as f64 + offset * next[i] as f64).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// One pixel per cell. Removed cells stay white, the route is red and its
/// first and last cells are blue.
pub fn render_map(grid: &ElevationGrid, route: &[Cell]) -> Result<RgbImage> {
    let width = u32::try_from(grid.width()).context("grid too wide for an image")?;
    let height = u32::try_from(grid.height()).context("grid too tall for an image")?;
    let max_elevation = grid.max_elevation();

    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if let Some(elevation) = grid.elevation(Cell::new(x as usize, y as usize)) {
            *pixel = terrain_color(elevation / max_elevation);
        }
    }

    let mut paint = |cell: &Cell, color: Rgb<u8>| {
        if cell.x < grid.width() && cell.y < grid.height() {
            image.put_pixel(cell.x as u32, cell.y as u32, color);
        }
    };
    for cell in route {
        paint(cell, PATH_COLOR);
    }
    for cell in route.first().into_iter().chain(route.last()) {
        paint(cell, ENDPOINT_COLOR);
    }
    Ok(image)
}

pub fn write_map_png(path: &Path, grid: &ElevationGrid, route: &[Cell]) -> Result<()> {
    render_map(grid, route)?
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfp_core::GridGeometry;

    #[test]
    fn palette_spans_the_elevation_range() {
        assert_eq!(terrain_color(0.0), Rgb([0, 102, 43]));
        assert_eq!(terrain_color(1.0), Rgb([180, 180, 180]));
        assert_eq!(terrain_color(0.1), Rgb([26, 153, 22]));
        assert_eq!(terrain_color(-0.1), BACKGROUND);
        assert_eq!(terrain_color(1.5), BACKGROUND);
        assert_eq!(terrain_color(f64::NAN), BACKGROUND);
    }

    #[test]
    fn route_and_removed_cells_are_painted() {
        let mut grid =
            ElevationGrid::filled(4, 3, GridGeometry::new(10.0, (0.0, 30.0)), 1000.0, 0.0)
                .unwrap();
        grid.invalidate(3, 2);
        let route = vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 1)];

        let image = render_map(&grid, &route).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(*image.get_pixel(0, 0), ENDPOINT_COLOR);
        assert_eq!(*image.get_pixel(1, 1), PATH_COLOR);
        assert_eq!(*image.get_pixel(2, 1), ENDPOINT_COLOR);
        assert_eq!(*image.get_pixel(3, 2), BACKGROUND);
        assert_eq!(*image.get_pixel(0, 2), Rgb([0, 102, 43]));
    }
}
