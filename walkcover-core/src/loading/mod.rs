//! This module is responsible for loading data from various sources
//! (OSM extracts, GeoJSON layers, CSV tables) and building the walk network.

mod builder;
mod config;
pub mod demand;
pub mod equity;
pub mod features;
pub mod osm;
pub mod sites;

pub use builder::{NetworkSource, RawEdge, RawNetwork, RawNode, create_street_graph};
pub use config::{AnalysisConfig, IsochroneConfig, NetworkConfig};
pub use demand::{join_risk_layer, load_demand, study_boundary};
pub use equity::load_equity_flags;
pub use osm::OsmPbfSource;
pub use sites::load_sites;
