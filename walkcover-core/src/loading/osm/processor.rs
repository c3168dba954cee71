use std::path::PathBuf;

use geo::{BoundingRect, Distance, Haversine, Intersects, MultiPolygon, Point, Rect};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use log::{debug, info};
use osmpbf::{Element, ElementReader};

use crate::Error;
use crate::loading::builder::{NetworkSource, RawEdge, RawNetwork, RawNode};

/// Walk network extracted from an OpenStreetMap PBF file
#[derive(Debug, Clone)]
pub struct OsmPbfSource {
    path: PathBuf,
}

impl OsmPbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct WalkWay {
    refs: Vec<i64>,
}

impl NetworkSource for OsmPbfSource {
    fn walk_network(&self, aoi: &MultiPolygon<f64>) -> Result<RawNetwork, Error> {
        if !self.path.exists() {
            return Err(Error::InvalidInput(format!(
                "OSM file not found: {}",
                self.path.display()
            )));
        }

        let bounds = aoi
            .bounding_rect()
            .ok_or_else(|| Error::InvalidInput("area of interest is empty".to_string()))?;

        info!("Reading walkable ways from {}", self.path.display());
        let reader = ElementReader::from_path(&self.path)
            .map_err(|e| Error::OsmError(e.to_string()))?;

        let mut positions: HashMap<i64, Point<f64>> = HashMap::new();
        let mut ways: Vec<WalkWay> = Vec::new();

        reader
            .for_each(|element| match element {
                Element::Node(n) => {
                    let point = Point::new(n.lon(), n.lat());
                    if inside(&bounds, aoi, &point) {
                        positions.insert(n.id(), point);
                    }
                }
                Element::DenseNode(n) => {
                    let point = Point::new(n.lon(), n.lat());
                    if inside(&bounds, aoi, &point) {
                        positions.insert(n.id(), point);
                    }
                }
                Element::Way(w) => {
                    let tags: Vec<(&str, &str)> = w.tags().collect();
                    if is_walkable(&tags) {
                        ways.push(WalkWay {
                            refs: w.refs().collect(),
                        });
                    }
                }
                _ => {}
            })
            .map_err(|e| Error::OsmError(e.to_string()))?;

        debug!(
            "{} nodes inside the area of interest, {} walkable ways",
            positions.len(),
            ways.len()
        );

        Ok(split_ways(&positions, &ways))
    }
}

fn inside(bounds: &Rect<f64>, aoi: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    bounds.intersects(point) && aoi.intersects(point)
}

/// Break ways into node-to-node segments, dropping any segment with an
/// endpoint outside the area of interest
fn split_ways(positions: &HashMap<i64, Point<f64>>, ways: &[WalkWay]) -> RawNetwork {
    let mut used: HashSet<i64> = HashSet::new();
    let mut edges = Vec::new();

    for way in ways {
        for (a, b) in way.refs.iter().copied().tuple_windows() {
            if let (Some(pa), Some(pb)) = (positions.get(&a), positions.get(&b)) {
                edges.push(RawEdge {
                    source: a,
                    target: b,
                    length_m: Some(Haversine.distance(*pa, *pb)),
                });
                used.insert(a);
                used.insert(b);
            }
        }
    }

    let mut nodes: Vec<RawNode> = used
        .into_iter()
        .filter_map(|id| {
            positions.get(&id).map(|p| RawNode {
                id,
                lon: p.x(),
                lat: p.y(),
            })
        })
        .collect();
    nodes.sort_unstable_by_key(|n| n.id);

    RawNetwork { nodes, edges }
}

/// Whether a way with these tags is open to pedestrians
pub(crate) fn is_walkable(tags: &[(&str, &str)]) -> bool {
    let tag = |key: &str| tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

    let Some(highway) = tag("highway") else {
        return false;
    };

    let excluded_class = matches!(
        highway,
        "abandoned"
            | "bus_guideway"
            | "construction"
            | "cycleway"
            | "motor"
            | "motorway"
            | "motorway_link"
            | "no"
            | "planned"
            | "platform"
            | "proposed"
            | "raceway"
            | "razed"
    );
    if excluded_class || tag("area") == Some("yes") {
        return false;
    }

    match tag("foot") {
        Some("no") => false,
        Some("yes" | "designated" | "permissive") => true,
        _ => !matches!(tag("access"), Some("no" | "private"))
            && tag("service") != Some("private"),
    }
}
