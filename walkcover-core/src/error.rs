use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Street network for the area of interest has no usable edges ({nodes} nodes, {edges} edges)")]
    NetworkEmpty { nodes: usize, edges: usize },
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("OSM error: {0}")]
    OsmError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Isochrone error: {0}")]
    IsochroneError(String),
}

/// Why a single site produced no isochrone. The run continues without it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnreachableReason {
    #[error("street network has no nodes")]
    EmptyNetwork,
    #[error("nearest street node is {distance_m:.0} m away (limit {limit_m:.0} m)")]
    TooFarFromNetwork { distance_m: f64, limit_m: f64 },
    #[error("isochrone failed: {0}")]
    IsochroneFailed(String),
}

/// Per-site failure recorded during an isochrone sweep
#[derive(Error, Debug, Clone, PartialEq)]
#[error("site {site_id} (#{site_index}) skipped: {reason}")]
pub struct SiteFailure {
    pub site_index: usize,
    pub site_id: String,
    pub reason: UnreachableReason,
}
