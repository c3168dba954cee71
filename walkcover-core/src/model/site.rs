//! Existing facilities and candidate locations

use geo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Fixed infrastructure contributing to the baseline
    Existing,
    /// Decision variable for selection
    Candidate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: String,
    /// Site location (lon/lat)
    pub geometry: Point<f64>,
    /// Display name
    pub name: Option<String>,
    pub kind: SiteKind,
}

impl Site {
    pub fn new(id: impl Into<String>, geometry: Point<f64>, kind: SiteKind) -> Self {
        Self {
            id: id.into(),
            geometry,
            name: None,
            kind,
        }
    }

    pub fn candidate(id: impl Into<String>, geometry: Point<f64>) -> Self {
        Self::new(id, geometry, SiteKind::Candidate)
    }

    pub fn existing(id: impl Into<String>, geometry: Point<f64>) -> Self {
        Self::new(id, geometry, SiteKind::Existing)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
