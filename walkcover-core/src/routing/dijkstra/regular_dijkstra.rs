use std::collections::BinaryHeap;

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use super::state::State;
use crate::WalkingTime;
use crate::model::StreetGraph;

/// Dijkstra's algorithm over the walking network
///
/// Returns a map of every settled node to its walking time in milliseconds from
/// `start`. With `max_cost`, nodes farther than the budget are never
/// recorded, so the map is exactly the set reachable within it.
pub fn dijkstra_path_weights(
    graph: &StreetGraph,
    start: NodeIndex,
    max_cost: Option<WalkingTime>,
) -> HashMap<NodeIndex, WalkingTime> {
    let mut distances: HashMap<NodeIndex, WalkingTime> = HashMap::new();
    let mut heap = BinaryHeap::new();

    if graph.node(start).is_none() {
        return distances;
    }

    // Start node has distance 0
    heap.push(State {
        cost: 0,
        node: start,
    });
    distances.insert(start, 0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        // Examine neighbors
        for (next, walking_time) in graph.neighbors_with_time(node) {
            let next_cost = cost.saturating_add(walking_time);

            if let Some(max) = max_cost
                && next_cost > max
            {
                continue;
            }

            // Add or update distance if better using Entry API
            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    distances
}

/// Nodes reachable from `start` within `cutoff` milliseconds, in index order
///
/// Equivalent to the node set of an ego graph with travel time as distance.
pub fn reachable_nodes(
    graph: &StreetGraph,
    start: NodeIndex,
    cutoff: WalkingTime,
) -> Vec<NodeIndex> {
    let mut nodes: Vec<NodeIndex> = dijkstra_path_weights(graph, start, Some(cutoff))
        .into_keys()
        .collect();
    nodes.sort_unstable();
    nodes
}
