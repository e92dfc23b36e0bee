//! Spherical Pseudo-Mercator (EPSG:3857) <-> WGS84 degrees.

use std::f64::consts::FRAC_PI_4;

/// Sphere radius of EPSG:3857 in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Projected metres to `(lon, lat)` degrees.
pub fn mercator_to_lonlat(x_m: f64, y_m: f64) -> (f64, f64) {
    let lon = (x_m / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y_m / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
    (lon, lat)
}

/// `(lon, lat)` degrees to projected metres.
pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon.to_radians() * EARTH_RADIUS_M;
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn origin_maps_to_null_island() {
        let (lon, lat) = mercator_to_lonlat(0.0, 0.0);
        assert_abs_diff_eq!(lon, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lat, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn austrian_grid_corner() {
        // upper-left corner of the Austria grid
        let (lon, lat) = mercator_to_lonlat(1_060_000.0, 6_280_000.0);
        assert_abs_diff_eq!(lon, 9.5222, epsilon = 1e-3);
        assert_abs_diff_eq!(lat, 49.0, epsilon = 0.1);

        let (x, y) = lonlat_to_mercator(lon, lat);
        assert_abs_diff_eq!(x, 1_060_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 6_280_000.0, epsilon = 1e-6);
    }
}
