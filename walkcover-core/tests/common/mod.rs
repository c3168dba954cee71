#![allow(dead_code)]

use geo::{MultiPolygon, Point, polygon};
use walkcover_core::loading::{RawEdge, RawNetwork, RawNode};
use walkcover_core::{DemandPoint, StreetGraph, StreetGraphBuilder};

/// Side of one grid cell in degrees (~1.1 km at the equator)
pub const CELL_DEG: f64 = 0.01;

/// Declared street length between neighbouring cell centers.
/// At 80 m/min one hop takes 750 s, so a 15 minute budget reaches
/// exactly the four direct neighbours.
pub const HOP_M: f64 = 1000.0;

pub fn cell_center(row: usize, col: usize) -> Point<f64> {
    Point::new(
        CELL_DEG * (col as f64 + 0.5),
        CELL_DEG * (row as f64 + 0.5),
    )
}

pub fn cell_boundary(row: usize, col: usize) -> MultiPolygon<f64> {
    let x0 = CELL_DEG * col as f64;
    let y0 = CELL_DEG * row as f64;
    MultiPolygon::new(vec![polygon![
        (x: x0, y: y0),
        (x: x0 + CELL_DEG, y: y0),
        (x: x0 + CELL_DEG, y: y0 + CELL_DEG),
        (x: x0, y: y0 + CELL_DEG),
        (x: x0, y: y0),
    ]])
}

pub fn cell_id(row: usize, col: usize) -> String {
    format!("r{row}c{col}")
}

/// Square tracts in row-major order, weights given row-major
pub fn grid_tracts(size: usize, vulnerability: &[f64]) -> Vec<DemandPoint> {
    let mut tracts = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            tracts.push(
                DemandPoint::new(cell_id(row, col), cell_center(row, col))
                    .with_boundary(cell_boundary(row, col))
                    .with_vulnerability(vulnerability[row * size + col]),
            );
        }
    }
    tracts
}

/// Street node at every cell center, streets to the four neighbours
pub fn grid_network(size: usize) -> RawNetwork {
    let id = |row: usize, col: usize| (row * size + col) as i64;
    let mut network = RawNetwork::default();
    for row in 0..size {
        for col in 0..size {
            let center = cell_center(row, col);
            network.nodes.push(RawNode {
                id: id(row, col),
                lon: center.x(),
                lat: center.y(),
            });
            if col + 1 < size {
                network.edges.push(RawEdge {
                    source: id(row, col),
                    target: id(row, col + 1),
                    length_m: Some(HOP_M),
                });
            }
            if row + 1 < size {
                network.edges.push(RawEdge {
                    source: id(row, col),
                    target: id(row + 1, col),
                    length_m: Some(HOP_M),
                });
            }
        }
    }
    network
}

/// Same grid as [`grid_network`], built directly as a street graph
pub fn grid_graph(size: usize) -> StreetGraph {
    let mut builder = StreetGraphBuilder::new(80.0);
    let mut nodes = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            nodes.push(builder.add_node((row * size + col) as i64, cell_center(row, col)));
        }
    }
    for row in 0..size {
        for col in 0..size {
            let here = nodes[row * size + col];
            if col + 1 < size {
                builder.add_street(here, nodes[row * size + col + 1], HOP_M);
            }
            if row + 1 < size {
                builder.add_street(here, nodes[(row + 1) * size + col], HOP_M);
            }
        }
    }
    builder.build()
}
