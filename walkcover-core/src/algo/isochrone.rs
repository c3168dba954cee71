//! Calculation of walking isochrones with a buffer over reached nodes.
//!
//! Street nodes mark segment endpoints rather than area, so every node
//! reached within the budget is grown by a small disc and the discs are
//! dissolved into one region.

use geo::{Buffer, MultiPoint, MultiPolygon, Point};
use log::{debug, info, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::geometry::{to_geographic, to_planar};
use crate::loading::IsochroneConfig;
use crate::model::{Site, StreetGraph};
use crate::routing::reachable_nodes;
use crate::{Error, SiteFailure, UnreachableReason};

/// Reachable region of one site
#[derive(Debug, Clone)]
pub struct Isochrone {
    /// Position of the site in the swept site list
    pub site_index: usize,
    /// Street node the site was snapped to
    pub source: NodeIndex,
    /// Distance between the site and its street node, in meters
    pub snap_distance_m: f64,
    /// Number of street nodes within the budget
    pub reached_nodes: usize,
    /// Dissolved region (lon/lat)
    pub geometry: MultiPolygon<f64>,
}

/// Reachable region from `source` within the configured walking budget
///
/// An isolated source yields a single disc around itself.
///
/// # Errors
///
/// Returns [`Error::InvalidNodeIndex`] when `source` is not in the graph.
pub fn calculate_isochrone(
    graph: &StreetGraph,
    source: NodeIndex,
    config: &IsochroneConfig,
) -> Result<MultiPolygon<f64>, Error> {
    reached_region(graph, source, config).map(|(region, _)| region)
}

fn reached_region(
    graph: &StreetGraph,
    source: NodeIndex,
    config: &IsochroneConfig,
) -> Result<(MultiPolygon<f64>, usize), Error> {
    if graph.node(source).is_none() {
        return Err(Error::InvalidNodeIndex);
    }

    let reached = reachable_nodes(graph, source, config.cutoff_ms());
    let points: Vec<Point<f64>> = reached
        .iter()
        .filter_map(|idx| graph.node(*idx).map(|node| node.geometry))
        .collect();

    let planar = to_planar(&MultiPoint::new(points)).buffer(config.node_buffer_m);
    if planar.0.is_empty() {
        return Err(Error::IsochroneError(format!(
            "buffer of {} reached nodes is empty",
            reached.len()
        )));
    }

    Ok((to_geographic(&planar), reached.len()))
}

/// Snap a site to the network and compute its isochrone
///
/// Failures are returned per site rather than aborting a sweep.
pub fn site_isochrone(
    graph: &StreetGraph,
    site_index: usize,
    site: &Site,
    config: &IsochroneConfig,
) -> Result<Isochrone, SiteFailure> {
    let failure = |reason| SiteFailure {
        site_index,
        site_id: site.id.clone(),
        reason,
    };

    let (source, snap_distance_m) = graph
        .nearest_node(&site.geometry)
        .ok_or_else(|| failure(UnreachableReason::EmptyNetwork))?;

    if snap_distance_m > config.max_snap_distance_m {
        return Err(failure(UnreachableReason::TooFarFromNetwork {
            distance_m: snap_distance_m,
            limit_m: config.max_snap_distance_m,
        }));
    }

    let (geometry, reached_nodes) = reached_region(graph, source, config)
        .map_err(|e| failure(UnreachableReason::IsochroneFailed(e.to_string())))?;

    debug!(
        "Site {} snapped {snap_distance_m:.0} m to node {}, {reached_nodes} nodes within {} min",
        site.id,
        source.index(),
        config.minutes
    );

    Ok(Isochrone {
        site_index,
        source,
        snap_distance_m,
        reached_nodes,
        geometry,
    })
}

/// Isochrones for every site, computed in parallel over the shared graph
///
/// The result has one entry per site, in input order.
pub fn bulk_isochrones(
    graph: &StreetGraph,
    sites: &[Site],
    config: &IsochroneConfig,
) -> Vec<Result<Isochrone, SiteFailure>> {
    let results: Vec<Result<Isochrone, SiteFailure>> = sites
        .par_iter()
        .enumerate()
        .map(|(idx, site)| site_isochrone(graph, idx, site, config))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        warn!("{failure}");
    }
    info!(
        "Computed {} of {} isochrones ({} min)",
        results.len() - failed,
        results.len(),
        config.minutes
    );

    results
}

/// Regions of a sweep aligned to the site list, `None` for skipped sites
pub fn regions(results: &[Result<Isochrone, SiteFailure>]) -> Vec<Option<&MultiPolygon<f64>>> {
    results
        .iter()
        .map(|r| r.as_ref().ok().map(|iso| &iso.geometry))
        .collect()
}

/// Failures of a sweep
pub fn failures(results: &[Result<Isochrone, SiteFailure>]) -> Vec<SiteFailure> {
    results
        .iter()
        .filter_map(|r| r.as_ref().err().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::{Area, Contains, Intersects};

    use super::*;
    use crate::model::StreetGraphBuilder;

    /// Three nodes on a line 0.001 deg (~111 m) apart plus a far isolated node
    fn line_graph() -> (StreetGraph, [NodeIndex; 4]) {
        let mut b = StreetGraphBuilder::new(80.0);
        let a = b.add_node(1, Point::new(0.000, 0.0));
        let m = b.add_node(2, Point::new(0.001, 0.0));
        let z = b.add_node(3, Point::new(0.002, 0.0));
        let lone = b.add_node(4, Point::new(0.050, 0.0));
        // 4 minutes per segment
        b.add_street(a, m, 320.0);
        b.add_street(m, z, 320.0);
        (b.build(), [a, m, z, lone])
    }

    fn config(minutes: u32) -> IsochroneConfig {
        IsochroneConfig {
            minutes,
            ..IsochroneConfig::default()
        }
    }

    #[test]
    fn region_grows_with_budget() {
        let (graph, [a, ..]) = line_graph();
        let z = Point::new(0.002, 0.0);

        let short = calculate_isochrone(&graph, a, &config(5)).unwrap();
        let long = calculate_isochrone(&graph, a, &config(8)).unwrap();

        assert!(short.contains(&Point::new(0.001, 0.0)));
        assert!(!short.intersects(&z));
        assert!(long.contains(&z));
        assert!(to_planar(&long).unsigned_area() > to_planar(&short).unsigned_area());
    }

    #[test]
    fn isolated_node_gives_single_disc() {
        let (graph, [.., lone]) = line_graph();
        let region = calculate_isochrone(&graph, lone, &config(15)).unwrap();

        assert_eq!(region.0.len(), 1);
        let area = to_planar(&region).unsigned_area();
        let disc = std::f64::consts::PI * 35.0 * 35.0;
        assert!(area > 0.95 * disc && area < 1.01 * disc, "area {area}");
    }

    #[test]
    fn unknown_source_is_an_error() {
        let (graph, _) = line_graph();
        let err = calculate_isochrone(&graph, NodeIndex::new(42), &config(15)).unwrap_err();
        assert!(matches!(err, Error::InvalidNodeIndex));
    }

    #[test]
    fn far_site_is_skipped_not_fatal() {
        let (graph, _) = line_graph();
        let sites = vec![
            Site::candidate("near", Point::new(0.0001, 0.0)),
            Site::candidate("far", Point::new(0.0, 1.0)),
        ];
        let results = bulk_isochrones(&graph, &sites, &config(15));

        assert_eq!(results.len(), 2);
        let near = results[0].as_ref().unwrap();
        assert_eq!(near.site_index, 0);
        assert_eq!(near.reached_nodes, 3);

        let far = results[1].as_ref().unwrap_err();
        assert_eq!(far.site_id, "far");
        assert!(matches!(
            far.reason,
            UnreachableReason::TooFarFromNetwork { .. }
        ));

        assert_eq!(regions(&results).iter().filter(|r| r.is_some()).count(), 1);
        assert_eq!(failures(&results).len(), 1);
    }

    #[test]
    fn empty_network_skips_every_site() {
        let graph = StreetGraphBuilder::new(80.0).build();
        let sites = vec![Site::candidate("a", Point::new(0.0, 0.0))];
        let results = bulk_isochrones(&graph, &sites, &config(15));
        assert_eq!(
            results[0].as_ref().unwrap_err().reason,
            UnreachableReason::EmptyNetwork
        );
    }
}
