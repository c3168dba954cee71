pub use crate::Error;

// Re-export key components
pub use crate::algo::coverage::{CoverageMatrix, CoverageSummary, coverage_region};
pub use crate::algo::greedy::{GreedySelector, SelectionResult};
pub use crate::algo::isochrone::{Isochrone, bulk_isochrones, calculate_isochrone};
pub use crate::algo::weights::{WeightBuilder, WeightSource, WeightVector};
pub use crate::loading::{
    AnalysisConfig, NetworkSource, OsmPbfSource, RawNetwork, create_street_graph,
};
pub use crate::model::{DemandPoint, Site, SiteKind, StreetGraph};
pub use crate::scenario::{CoverageScenario, OptimizationScenario};

// Core types for the street network
pub use crate::StreetNodeId;
pub use crate::WalkingTime; // milliseconds
