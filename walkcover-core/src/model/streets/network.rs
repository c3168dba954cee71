//! Undirected street graph with a spatial index for snapping

use std::fmt;

use geo::Point;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::components::{StreetEdge, StreetNode, travel_time};
use crate::WalkingTime;
use crate::geometry::projection::project_coord;

/// R-tree entry: a street node position in planar meters
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    pub geometry: [f64; 2],
    pub data: NodeIndex,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.geometry)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.geometry[0] - point[0];
        let dy = self.geometry[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Pedestrian network for one analysis run
///
/// Read-only once built, so it can be shared across isochrone workers.
pub struct StreetGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    rtree: RTree<IndexedPoint>,
}

impl StreetGraph {
    pub fn new(graph: UnGraph<StreetNode, StreetEdge>) -> Self {
        let entries = graph
            .node_indices()
            .map(|idx| {
                let planar = project_coord(graph[idx].geometry.0);
                IndexedPoint {
                    geometry: [planar.x, planar.y],
                    data: idx,
                }
            })
            .collect();

        Self {
            rtree: RTree::bulk_load(entries),
            graph,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&StreetNode> {
        self.graph.node_weight(idx)
    }

    /// Adjacent nodes with the walking time of the connecting edge
    pub fn neighbors_with_time(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, WalkingTime)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight().walking_time())
        })
    }

    /// Nearest street node to a lon/lat point and its planar distance in meters
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        let planar = project_coord(point.0);
        let query = [planar.x, planar.y];
        self.rtree
            .nearest_neighbor(&query)
            .map(|entry| (entry.data, entry.distance_2(&query).sqrt()))
    }
}

impl fmt::Debug for StreetGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreetGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}

/// Incremental construction of a [`StreetGraph`]
///
/// Edge crossing times are derived from segment length and the walking
/// speed given at construction.
pub struct StreetGraphBuilder {
    graph: UnGraph<StreetNode, StreetEdge>,
    walking_speed_m_per_min: f64,
}

impl StreetGraphBuilder {
    pub fn new(walking_speed_m_per_min: f64) -> Self {
        Self {
            graph: UnGraph::default(),
            walking_speed_m_per_min,
        }
    }

    pub fn with_capacity(walking_speed_m_per_min: f64, nodes: usize, edges: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(nodes, edges),
            walking_speed_m_per_min,
        }
    }

    pub fn add_node(&mut self, id: i64, geometry: Point<f64>) -> NodeIndex {
        self.graph.add_node(StreetNode { id, geometry })
    }

    /// Add a street segment walkable in both directions
    pub fn add_street(&mut self, a: NodeIndex, b: NodeIndex, length_m: f64) -> EdgeIndex {
        let weight = travel_time(length_m, self.walking_speed_m_per_min);
        self.graph.add_edge(a, b, StreetEdge { weight, length_m })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn build(self) -> StreetGraph {
        StreetGraph::new(self.graph)
    }
}
