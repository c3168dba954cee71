use std::path::Path;

use geo::{BoundingRect, Distance, Haversine, Intersects, MultiPolygon, Point};
use hashbrown::{HashMap, HashSet};
use log::{debug, info, warn};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use super::config::NetworkConfig;
use crate::model::streets::components::travel_time;
use crate::model::{StreetEdge, StreetGraph, StreetNode};
use crate::Error;

/// Provider of walkable street geometry for an area of interest
///
/// Implementations fetch or extract the raw network; travel times are
/// derived afterwards by [`create_street_graph`].
pub trait NetworkSource {
    /// Walkable nodes and segments inside `aoi` (lon/lat)
    fn walk_network(&self, aoi: &MultiPolygon<f64>) -> Result<RawNetwork, Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
}

impl RawNode {
    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: i64,
    pub target: i64,
    /// Segment length in meters, great-circle distance between the
    /// endpoints when absent
    #[serde(default)]
    pub length_m: Option<f64>,
}

/// Street network exchange format between a source and the graph builder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNetwork {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl RawNetwork {
    /// Read a network previously exported as JSON
    pub fn from_json_path(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::InvalidData(format!("{}: {e}", path.display())))
    }

    /// Subnetwork of nodes inside `aoi` and the edges between them
    pub fn clip(&self, aoi: &MultiPolygon<f64>) -> RawNetwork {
        let nodes: Vec<RawNode> = self
            .nodes
            .iter()
            .filter(|node| aoi.intersects(&node.point()))
            .cloned()
            .collect();
        let kept: HashSet<i64> = nodes.iter().map(|n| n.id).collect();
        let edges = self
            .edges
            .iter()
            .filter(|edge| kept.contains(&edge.source) && kept.contains(&edge.target))
            .cloned()
            .collect();

        RawNetwork { nodes, edges }
    }
}

impl NetworkSource for RawNetwork {
    fn walk_network(&self, aoi: &MultiPolygon<f64>) -> Result<RawNetwork, Error> {
        Ok(self.clip(aoi))
    }
}

/// Build the pedestrian graph for an area of interest
///
/// # Errors
///
/// Returns [`Error::NetworkEmpty`] when the source yields no usable edge,
/// and propagates source failures unchanged.
pub fn create_street_graph(
    source: &dyn NetworkSource,
    aoi: &MultiPolygon<f64>,
    config: &NetworkConfig,
) -> Result<StreetGraph, Error> {
    if !config.walking_speed_m_per_min.is_finite() || config.walking_speed_m_per_min <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "walking speed must be positive, got {}",
            config.walking_speed_m_per_min
        )));
    }

    let raw = source.walk_network(aoi)?;
    info!(
        "Street source returned {} nodes and {} edges",
        raw.nodes.len(),
        raw.edges.len()
    );

    let graph = graph_from_raw(&raw, config);
    drop(raw);
    if config.trim_memory {
        trim_heap();
    }

    if graph.edge_count() == 0 {
        return Err(Error::NetworkEmpty {
            nodes: graph.node_count(),
            edges: 0,
        });
    }

    let graph = if config.retain_all {
        graph
    } else {
        prune_components(&graph, aoi)
    };

    info!(
        "Walk network ready: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(StreetGraph::new(graph))
}

fn graph_from_raw(raw: &RawNetwork, config: &NetworkConfig) -> UnGraph<StreetNode, StreetEdge> {
    let mut graph = UnGraph::with_capacity(raw.nodes.len(), raw.edges.len());
    let mut id_map: HashMap<i64, NodeIndex> = HashMap::with_capacity(raw.nodes.len());

    for node in &raw.nodes {
        id_map.entry(node.id).or_insert_with(|| {
            graph.add_node(StreetNode {
                id: node.id,
                geometry: node.point(),
            })
        });
    }

    let mut rejected = 0usize;
    for edge in &raw.edges {
        let (Some(&a), Some(&b)) = (id_map.get(&edge.source), id_map.get(&edge.target)) else {
            rejected += 1;
            continue;
        };
        if a == b {
            continue;
        }

        let length_m = edge
            .length_m
            .unwrap_or_else(|| Haversine.distance(graph[a].geometry, graph[b].geometry));
        if !length_m.is_finite() || length_m < 0.0 {
            rejected += 1;
            continue;
        }

        graph.add_edge(
            a,
            b,
            StreetEdge {
                weight: travel_time(length_m, config.walking_speed_m_per_min),
                length_m,
            },
        );
    }

    if rejected > 0 {
        warn!("Dropped {rejected} street segments with unknown endpoints or invalid length");
    }

    graph
}

/// Return memory freed after source parsing to the system.
///
/// Parsing an OSM extract allocates large temporary maps that glibc keeps in
/// the heap after they are dropped.
fn trim_heap() {
    // # Safety
    //
    // This call is safe to use on linux with glibc implementation
    // which is checked by the cfg attribute in compile time.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            log::debug!("Memory trimming released nothing");
        } else {
            log::debug!("Successfully trimmed unused heap memory");
        }
    }
}

/// Keep the largest connected component within each part of `aoi`
///
/// Disjoint study areas each get their own street network; stray
/// fragments inside a part are dropped. Falls back to the overall largest
/// component when no node lies inside any part.
fn prune_components(
    graph: &UnGraph<StreetNode, StreetEdge>,
    aoi: &MultiPolygon<f64>,
) -> UnGraph<StreetNode, StreetEdge> {
    let mut components = UnionFind::new(graph.node_count());
    for edge in graph.edge_references() {
        components.union(edge.source().index(), edge.target().index());
    }
    let labels = components.into_labeling();

    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for label in &labels {
        *sizes.entry(*label).or_default() += 1;
    }

    let parts: Vec<_> = aoi
        .iter()
        .map(|part| (part, part.bounding_rect()))
        .collect();
    let mut touching: Vec<HashSet<usize>> = vec![HashSet::new(); parts.len()];
    for idx in graph.node_indices() {
        let point = graph[idx].geometry;
        for (slot, (part, bounds)) in parts.iter().enumerate() {
            if bounds.is_some_and(|rect| rect.intersects(&point.0)) && part.intersects(&point.0) {
                touching[slot].insert(labels[idx.index()]);
            }
        }
    }

    let mut keep: HashSet<usize> = touching
        .iter()
        .filter_map(|found| largest_label(&sizes, found.iter().copied()))
        .collect();
    if keep.is_empty() {
        keep.extend(largest_label(&sizes, sizes.keys().copied()));
    }
    if keep.is_empty() {
        return graph.clone();
    }

    debug!(
        "Keeping {} of {} connected components across {} AOI parts",
        keep.len(),
        sizes.len(),
        parts.len()
    );

    graph.filter_map(
        |idx, node| keep.contains(&labels[idx.index()]).then(|| node.clone()),
        |_, edge| Some(edge.clone()),
    )
}

/// Component with the most nodes, lowest label on ties
fn largest_label(
    sizes: &HashMap<usize, usize>,
    candidates: impl Iterator<Item = usize>,
) -> Option<usize> {
    candidates
        .map(|label| (label, sizes.get(&label).copied().unwrap_or(0)))
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(label, _)| label)
}
