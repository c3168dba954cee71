//! Area of interest around the sites under consideration

use geo::{BooleanOps, Buffer, MultiPoint, MultiPolygon, Point};
use log::debug;

use crate::Error;
use crate::geometry::{to_geographic, to_planar};

/// Region the walk network must cover
///
/// Every site is buffered by `radius_m` in the planar frame, the buffers
/// are dissolved and the result is intersected with the study boundary.
/// The radius should comfortably exceed the walkable distance so that no
/// isochrone reaches the edge of the network.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when no sites are given, the radius is
/// not positive, or no site lies near the study boundary.
pub fn area_of_interest(
    sites: &[Point<f64>],
    study_boundary: Option<&MultiPolygon<f64>>,
    radius_m: f64,
) -> Result<MultiPolygon<f64>, Error> {
    if sites.is_empty() {
        return Err(Error::InvalidInput(
            "at least one site is required to bound the area of interest".to_string(),
        ));
    }
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "area of interest radius must be positive, got {radius_m}"
        )));
    }

    let planar_sites = to_planar(&MultiPoint::new(sites.to_vec()));
    let mut planar_aoi = planar_sites.buffer(radius_m);

    if let Some(boundary) = study_boundary {
        planar_aoi = planar_aoi.intersection(&to_planar(boundary));
    }

    if planar_aoi.0.is_empty() {
        return Err(Error::InvalidInput(
            "no site lies within reach of the study boundary".to_string(),
        ));
    }

    debug!(
        "Area of interest: {} part(s) around {} site(s), radius {radius_m:.0} m",
        planar_aoi.0.len(),
        sites.len()
    );

    Ok(to_geographic(&planar_aoi))
}
