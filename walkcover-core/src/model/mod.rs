//! Data model for walk-time coverage analysis
//!
//! Contains the pedestrian network, demand points and sites.

pub mod demand;
pub mod site;
pub mod streets;

pub use demand::DemandPoint;
pub use site::{Site, SiteKind};
pub use streets::{IndexedPoint, StreetEdge, StreetGraph, StreetGraphBuilder, StreetNode};
