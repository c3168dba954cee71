//! Existing and candidate sites from a point layer

use std::path::Path;

use geo::{Centroid, Geometry};
use hashbrown::HashSet;
use log::info;

use super::features::{
    SITE_ID_FIELD, SITE_NAME_FIELD, feature_geometry, read_features, text_property,
};
use crate::Error;
use crate::model::{Site, SiteKind};

/// Load sites from a GeoJSON layer of points
///
/// Identifiers come from the first matching id column, falling back to the
/// feature position. Polygon footprints are reduced to their centroid.
pub fn load_sites(path: &Path, kind: SiteKind) -> Result<Vec<Site>, Error> {
    let features = read_features(path)?;
    if features.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{}: no sites found",
            path.display()
        )));
    }

    let id_key = SITE_ID_FIELD.resolve(&features);
    let name_key = SITE_NAME_FIELD.resolve(&features);

    let mut seen = HashSet::with_capacity(features.len());
    let mut sites = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        let id = id_key
            .and_then(|key| text_property(feature, key))
            .unwrap_or_else(|| idx.to_string());
        if !seen.insert(id.clone()) {
            return Err(Error::InvalidInput(format!(
                "{}: duplicate site identifier '{id}'",
                path.display()
            )));
        }

        let location = match feature_geometry(feature)? {
            Some(Geometry::Point(point)) => point,
            Some(other) => other.centroid().ok_or_else(|| {
                Error::InvalidInput(format!("{}: site '{id}' has empty geometry", path.display()))
            })?,
            None => {
                return Err(Error::InvalidInput(format!(
                    "{}: site '{id}' has no geometry",
                    path.display()
                )));
            }
        };

        let mut site = Site::new(id, location, kind);
        site.name = name_key.and_then(|key| text_property(feature, key));
        sites.push(site);
    }

    info!("Loaded {} {:?} sites from {}", sites.len(), kind, path.display());
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;

    fn write_layer(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("sites.geojson");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn ids_fall_back_to_feature_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.001, 0.002]},
                 "properties": {"site_name": "Central Library"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.003, 0.004]},
                 "properties": {}}
            ]}"#,
        );

        let sites = load_sites(&path, SiteKind::Candidate).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].id, "0");
        assert_eq!(sites[0].name.as_deref(), Some("Central Library"));
        assert_eq!(sites[0].geometry, Point::new(0.001, 0.002));
        assert_eq!(sites[0].kind, SiteKind::Candidate);
        assert_eq!(sites[1].id, "1");
        assert_eq!(sites[1].name, None);
    }

    #[test]
    fn explicit_ids_and_polygon_centroids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]]},
                 "properties": {"site_id": "rec-7", "NAME": "Rec Center"}}
            ]}"#,
        );

        let sites = load_sites(&path, SiteKind::Existing).unwrap();
        assert_eq!(sites[0].id, "rec-7");
        assert_eq!(sites[0].name.as_deref(), Some("Rec Center"));
        assert!((sites[0].geometry.x() - 1.0).abs() < 1e-12);
        assert!((sites[0].geometry.y() - 1.0).abs() < 1e-12);
        assert_eq!(sites[0].kind, SiteKind::Existing);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]},
                 "properties": {"id": 5}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 1]},
                 "properties": {"id": 5}}
            ]}"#,
        );
        let err = load_sites(&path, SiteKind::Candidate).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn empty_layer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(&dir, r#"{"type": "FeatureCollection", "features": []}"#);
        let err = load_sites(&path, SiteKind::Candidate).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("no sites")));
    }

    #[test]
    fn missing_geometry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": null, "properties": {"id": "a"}}
            ]}"#,
        );
        assert!(matches!(
            load_sites(&path, SiteKind::Candidate),
            Err(Error::InvalidInput(_))
        ));
    }
}
