use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::ScenarioKey;
use crate::algo::coverage::CoverageSummary;
use crate::algo::greedy::SelectionResult;
use crate::model::Site;
use crate::Error;

/// Dissolved coverage region as a single-feature collection
pub fn coverage_layer(
    region: &MultiPolygon<f64>,
    key: ScenarioKey,
    summary: &CoverageSummary,
) -> Result<FeatureCollection, Error> {
    let geometry = Geometry::new(GeoJsonValue::from(region));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "minutes": key.minutes,
            "k": key.k,
            "demand_count": summary.demand_count,
            "covered_count": summary.covered_count,
            "pct_covered": summary.pct_covered,
            "weighted_pct": summary.weighted_pct,
            "skipped_sites": summary.skipped.len(),
        }
    });

    let feature = serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))?;

    Ok(FeatureCollection {
        features: vec![feature],
        bbox: None,
        foreign_members: None,
    })
}

/// Selected candidates as points in pick order
///
/// `candidates` must be the site list the selection ran over.
pub fn selected_sites_layer(
    candidates: &[Site],
    selection: &SelectionResult,
) -> Result<FeatureCollection, Error> {
    let cumulative = selection.cumulative_gains();
    let mut features = Vec::with_capacity(selection.picks.len());

    for (rank, (pick, cumulative_gain)) in selection.picks.iter().zip(cumulative).enumerate() {
        let site = candidates.get(pick.candidate).ok_or_else(|| {
            Error::InvalidInput(format!(
                "selected candidate {} is not among {} candidates",
                pick.candidate,
                candidates.len()
            ))
        })?;

        let value = json!({
            "type": "Feature",
            "geometry": Geometry::new(GeoJsonValue::from(&site.geometry)),
            "properties": {
                "rank": rank + 1,
                "candidate_index": pick.candidate,
                "site_id": site.id,
                "name": site.name,
                "marginal_gain": pick.marginal_gain,
                "cumulative_gain": cumulative_gain,
                "newly_covered": pick.newly_covered,
            }
        });

        features.push(serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))?);
    }

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}
