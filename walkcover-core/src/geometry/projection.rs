//! Spherical Web Mercator projection

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo::{Coord, MapCoords};

/// Sphere radius used by EPSG:3857
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the projection becomes a square
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Convert a lon/lat coordinate to Web Mercator meters
pub fn project_coord(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Coord {
        x: coord.x.to_radians() * EARTH_RADIUS,
        y: (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS,
    }
}

/// Convert Web Mercator meters to a lon/lat coordinate
pub fn unproject_coord(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
    }
}

/// Reproject any geographic geometry into the planar frame
pub fn to_planar<G>(geometry: &G) -> G
where
    G: MapCoords<f64, f64, Output = G>,
{
    geometry.map_coords(project_coord)
}

/// Reproject any planar geometry back to lon/lat
pub fn to_geographic<G>(geometry: &G) -> G
where
    G: MapCoords<f64, f64, Output = G>,
{
    geometry.map_coords(unproject_coord)
}
