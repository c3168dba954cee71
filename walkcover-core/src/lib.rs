//! Walking-time coverage analysis for facility siting.
//!
//! Builds a pedestrian network around a set of sites, derives a walk-time
//! isochrone per site, tests weighted demand points against those regions
//! and greedily picks the candidate sites that add the most weighted coverage.

pub mod algo;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod output;
pub mod prelude;
pub mod routing;
pub mod scenario;

pub use error::{Error, SiteFailure, UnreachableReason};

/// Walking time in milliseconds
pub type WalkingTime = u32;

/// Index of a node in the street graph
pub type StreetNodeId = petgraph::graph::NodeIndex;

// Re-export key components
pub use crate::algo::aoi::area_of_interest;
pub use crate::algo::coverage::{CoverageMatrix, CoverageSummary, coverage_region};
pub use crate::algo::greedy::{
    DegenerateObjective, DegenerateReason, GreedySelector, Pick, SelectionResult,
};
pub use crate::algo::isochrone::{Isochrone, bulk_isochrones, calculate_isochrone};
pub use crate::algo::weights::{WeightBuilder, WeightOrigin, WeightSource, WeightVector};
pub use crate::loading::{
    AnalysisConfig, IsochroneConfig, NetworkConfig, NetworkSource, OsmPbfSource, RawNetwork,
    create_street_graph,
};
pub use crate::model::{DemandPoint, Site, SiteKind, StreetGraph, StreetGraphBuilder};
pub use crate::output::{ArtifactWriter, ScenarioKey};
pub use crate::scenario::{
    CoverageOutcome, CoverageScenario, CoverageState, OptimizationOutcome, OptimizationScenario,
};
