//! Coverage analysis algorithms

pub mod aoi;
pub mod coverage;
pub mod greedy;
pub mod isochrone;
pub mod weights;
