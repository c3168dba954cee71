//! Shortest-path traversals over the walk network

pub mod dijkstra;

pub use dijkstra::{dijkstra_path_weights, reachable_nodes};
