//! Reference frames used by the analysis
//!
//! Every geometry that crosses a module boundary is in geographic lon/lat
//! (EPSG:4326). Buffering, centroids and snapping distances are computed in
//! the planar Web Mercator frame (EPSG:3857) and converted back.

pub mod projection;

pub use projection::{to_geographic, to_planar};
