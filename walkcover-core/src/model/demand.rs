//! Demand points: spatial units that consume coverage

use geo::{MultiPolygon, Point};

/// One spatial unit (e.g. a census tract) and the indicators its weight
/// is derived from
#[derive(Debug, Clone, PartialEq)]
pub struct DemandPoint {
    /// Stable identifier, unique within a demand set
    pub id: String,
    /// Representative location (lon/lat), usually the unit's centroid
    pub location: Point<f64>,
    /// Unit boundary (lon/lat), used for the study region and output layers
    pub boundary: Option<MultiPolygon<f64>>,
    /// Primary heat vulnerability index in [0, 1]
    pub vulnerability: Option<f64>,
    /// Secondary modeled-risk index in [0, 1]
    pub risk: Option<f64>,
}

impl DemandPoint {
    pub fn new(id: impl Into<String>, location: Point<f64>) -> Self {
        Self {
            id: id.into(),
            location,
            boundary: None,
            vulnerability: None,
            risk: None,
        }
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: MultiPolygon<f64>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    #[must_use]
    pub fn with_vulnerability(mut self, value: f64) -> Self {
        self.vulnerability = Some(value);
        self
    }

    #[must_use]
    pub fn with_risk(mut self, value: f64) -> Self {
        self.risk = Some(value);
        self
    }
}

/// Representative locations in demand order
pub fn demand_locations(demand: &[DemandPoint]) -> Vec<Point<f64>> {
    demand.iter().map(|d| d.location).collect()
}
