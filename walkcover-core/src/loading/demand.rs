//! Demand units from a boundary layer

use std::path::Path;

use geo::{Centroid, Geometry, MultiPolygon};
use hashbrown::{HashMap, HashSet};
use log::{info, warn};

use super::features::{
    ID_FIELD, RISK_FIELD, VULNERABILITY_FIELD, feature_geometry, number_property, read_features,
    text_property,
};
use crate::geometry::{to_geographic, to_planar};
use crate::model::DemandPoint;
use crate::Error;

/// Load demand points from a GeoJSON layer of (multi)polygons
///
/// The representative location of each unit is its planar centroid. Point
/// features are accepted as-is and carry no boundary.
///
/// # Errors
///
/// Missing identifier column, missing geometry or duplicate identifiers
/// are input errors.
pub fn load_demand(path: &Path) -> Result<Vec<DemandPoint>, Error> {
    let features = read_features(path)?;
    if features.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{}: demand layer has no features",
            path.display()
        )));
    }

    let id_key = ID_FIELD.require(&features, path)?;
    let vulnerability_key = VULNERABILITY_FIELD.resolve(&features);
    let risk_key = RISK_FIELD.resolve(&features);
    if vulnerability_key.is_none() {
        warn!(
            "{}: no vulnerability column, weights fall back to the neutral baseline",
            path.display()
        );
    }

    let mut seen = HashSet::with_capacity(features.len());
    let mut demand = Vec::with_capacity(features.len());

    for (idx, feature) in features.iter().enumerate() {
        let id = text_property(feature, id_key).ok_or_else(|| {
            Error::InvalidInput(format!(
                "{}: feature #{idx} has no value for '{id_key}'",
                path.display()
            ))
        })?;
        if !seen.insert(id.clone()) {
            return Err(Error::InvalidInput(format!(
                "{}: duplicate demand identifier '{id}'",
                path.display()
            )));
        }

        let geometry = feature_geometry(feature)?.ok_or_else(|| {
            Error::InvalidInput(format!("{}: demand '{id}' has no geometry", path.display()))
        })?;
        let mut point = demand_from_geometry(&id, geometry)?;

        point.vulnerability = vulnerability_key.and_then(|key| number_property(feature, key));
        point.risk = risk_key.and_then(|key| number_property(feature, key));
        demand.push(point);
    }

    info!("Loaded {} demand units from {}", demand.len(), path.display());
    Ok(demand)
}

/// Build a demand point from its geometry
pub fn demand_from_geometry(id: &str, geometry: Geometry<f64>) -> Result<DemandPoint, Error> {
    let boundary = match geometry {
        Geometry::Point(point) => return Ok(DemandPoint::new(id, point)),
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(multi) => multi,
        other => {
            return Err(Error::InvalidInput(format!(
                "demand '{id}' must be a polygon or point, got {}",
                geometry_name(&other)
            )));
        }
    };

    let centroid = to_planar(&boundary)
        .centroid()
        .map(|c| to_geographic(&c))
        .ok_or_else(|| Error::InvalidInput(format!("demand '{id}' has an empty boundary")))?;

    Ok(DemandPoint::new(id, centroid).with_boundary(boundary))
}

/// Fill the risk index from a separate layer keyed by the same identifiers
///
/// Units absent from the layer keep their current value.
pub fn join_risk_layer(demand: &mut [DemandPoint], path: &Path) -> Result<usize, Error> {
    let features = read_features(path)?;
    let id_key = ID_FIELD.require(&features, path)?;
    let risk_key = RISK_FIELD.require(&features, path)?;

    let risk: HashMap<String, f64> = features
        .iter()
        .filter_map(|f| Some((text_property(f, id_key)?, number_property(f, risk_key)?)))
        .collect();

    let mut joined = 0;
    for point in demand.iter_mut() {
        if let Some(value) = risk.get(&point.id) {
            point.risk = Some(*value);
            joined += 1;
        }
    }

    info!(
        "Joined risk values for {joined} of {} demand units from {}",
        demand.len(),
        path.display()
    );
    Ok(joined)
}

/// Dissolved study region covered by all demand boundaries
pub fn study_boundary(demand: &[DemandPoint]) -> Option<MultiPolygon<f64>> {
    let boundaries: Vec<&MultiPolygon<f64>> =
        demand.iter().filter_map(|d| d.boundary.as_ref()).collect();
    if boundaries.is_empty() {
        return None;
    }
    Some(geo::unary_union(boundaries))
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use geo::{Area, Point, line_string, polygon};

    use super::*;

    #[test]
    fn centroid_of_square_boundary() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.01, y: 0.0),
            (x: 0.01, y: 0.01),
            (x: 0.0, y: 0.01),
        ];
        let point = demand_from_geometry("a", Geometry::Polygon(square)).unwrap();
        assert!((point.location.x() - 0.005).abs() < 1e-9);
        assert!((point.location.y() - 0.005).abs() < 1e-6);
        assert!(point.boundary.is_some());
    }

    #[test]
    fn point_geometry_has_no_boundary() {
        let point = demand_from_geometry("p", Geometry::Point(Point::new(1.0, 1.0))).unwrap();
        assert_eq!(point.location, Point::new(1.0, 1.0));
        assert!(point.boundary.is_none());
    }

    #[test]
    fn line_geometry_is_rejected() {
        let line = geo::line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        let err = demand_from_geometry("l", Geometry::LineString(line)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn study_boundary_dissolves_neighbors() {
        let left = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let right = polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)];
        let demand = vec![
            demand_from_geometry("l", Geometry::Polygon(left)).unwrap(),
            demand_from_geometry("r", Geometry::Polygon(right)).unwrap(),
        ];
        let boundary = study_boundary(&demand).unwrap();
        assert_eq!(boundary.0.len(), 1);
        assert!((boundary.unsigned_area() - 2.0).abs() < 1e-9);
    }

    fn write_layer(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    const TRACTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0.01, 0], [0.01, 0.01], [0, 0.01], [0, 0]]]},
             "properties": {"GEOID": "001", "HVI": 0.4, "RISK": 0.2}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [0.02, 0.005]},
             "properties": {"GEOID": "002", "HVI": "0.7"}}
        ]
    }"#;

    #[test]
    fn loads_tracts_with_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(&dir, "tracts.geojson", TRACTS);

        let demand = load_demand(&path).unwrap();
        assert_eq!(demand.len(), 2);
        assert_eq!(demand[0].id, "001");
        assert_eq!(demand[0].vulnerability, Some(0.4));
        assert_eq!(demand[0].risk, Some(0.2));
        assert!(demand[0].boundary.is_some());
        assert_eq!(demand[1].vulnerability, Some(0.7));
        assert_eq!(demand[1].risk, None);
        assert_eq!(demand[1].location, Point::new(0.02, 0.005));
    }

    #[test]
    fn missing_id_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            "tracts.geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]},
                 "properties": {"name": "a", "HVI": 0.5}}
            ]}"#,
        );
        let err = load_demand(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("identifier")));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            "tracts.geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]},
                 "properties": {"GEOID": "001"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 1]},
                 "properties": {"GEOID": "001"}}
            ]}"#,
        );
        let err = load_demand(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn empty_layer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(
            &dir,
            "tracts.geojson",
            r#"{"type": "FeatureCollection", "features": []}"#,
        );
        assert!(matches!(load_demand(&path), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn risk_join_keeps_unmatched_values() {
        let dir = tempfile::tempdir().unwrap();
        let tracts = write_layer(&dir, "tracts.geojson", TRACTS);
        let risk = write_layer(
            &dir,
            "risk.geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": null, "properties": {"geoid": "002", "risk": 0.9}},
                {"type": "Feature", "geometry": null, "properties": {"geoid": "999", "risk": 0.1}}
            ]}"#,
        );

        let mut demand = load_demand(&tracts).unwrap();
        let joined = join_risk_layer(&mut demand, &risk).unwrap();
        assert_eq!(joined, 1);
        assert_eq!(demand[0].risk, Some(0.2));
        assert_eq!(demand[1].risk, Some(0.9));
    }

    #[test]
    fn risk_layer_without_risk_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tracts = write_layer(&dir, "tracts.geojson", TRACTS);
        let risk = write_layer(
            &dir,
            "risk.geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": null, "properties": {"GEOID": "001", "score": 3}}
            ]}"#,
        );

        let mut demand = load_demand(&tracts).unwrap();
        let err = join_risk_layer(&mut demand, &risk).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(demand[0].risk, Some(0.2));
    }
}
