use crate::geometry_utils::Extent;
use crate::graph::Graph;
use crate::osm_types::{Node, NodeId, Tags, Way, WayId};
use ahash::{AHashMap, AHashSet};
use geo::Coord;
use log::{debug, info, warn};
use osmpbfreader::{OsmObj, OsmPbfReader};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode PBF: {0}")]
    Pbf(#[from] osmpbfreader::Error),
}

fn convert_tags(tags: &osmpbfreader::Tags) -> Tags {
    tags.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn is_highway(tags: &osmpbfreader::Tags) -> bool {
    tags.get("highway").is_some_and(|v| v.as_str() != "no")
}

fn open(path: &Path) -> Result<OsmPbfReader<BufReader<File>>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(OsmPbfReader::new(BufReader::new(file)))
}

/// Highway ways and their nodes as read from an extract, plus the other
/// ways that share a node with them.
#[derive(Debug, Default)]
pub struct Extract {
    pub nodes: AHashMap<NodeId, Node>,
    pub highways: Vec<Way>,
    /// Non-highway ways that touch a highway node, with only those nodes kept
    pub references: Vec<(WayId, Vec<NodeId>)>,
}

/// Loads every highway way and the nodes it references from a PBF extract.
///
/// With a `bbox`, only ways that have at least one node inside it are kept.
/// Every way in the extract still counts towards a node's parent ways.
pub fn load_highways(path: &Path, bbox: Option<Extent>) -> Result<Graph, LoadError> {
    info!("Loading highways from {:?}", path);

    // Pass 1: highway ways and the nodes they reference
    let mut way_ids = AHashSet::new();
    let mut node_ids = AHashSet::new();
    for obj in open(path)?.iter() {
        if let OsmObj::Way(way) = obj? {
            if is_highway(&way.tags) {
                way_ids.insert(WayId(way.id.0));
                node_ids.extend(way.nodes.iter().map(|n| NodeId(n.0)));
            }
        }
    }
    info!(
        "Pass 1 complete: {} highway ways, {} referenced nodes",
        way_ids.len(),
        node_ids.len()
    );

    // Pass 2: node coordinates and tags, way details, shared nodes of other ways
    let mut extract = Extract {
        nodes: AHashMap::with_capacity(node_ids.len()),
        highways: Vec::with_capacity(way_ids.len()),
        references: Vec::new(),
    };
    for obj in open(path)?.iter() {
        match obj? {
            OsmObj::Node(node) => {
                let id = NodeId(node.id.0);
                if node_ids.contains(&id) {
                    let entity = Node::new(id, node.lon(), node.lat())
                        .with_tags(convert_tags(&node.tags));
                    extract.nodes.insert(id, entity);
                }
            }
            OsmObj::Way(way) => {
                let id = WayId(way.id.0);
                let way_nodes = way.nodes.iter().map(|n| NodeId(n.0));
                if way_ids.contains(&id) {
                    extract.highways.push(
                        Way::new(id, way_nodes.collect()).with_tags(convert_tags(&way.tags)),
                    );
                } else {
                    let shared: Vec<NodeId> =
                        way_nodes.filter(|n| node_ids.contains(n)).collect();
                    if !shared.is_empty() {
                        extract.references.push((id, shared));
                    }
                }
            }
            OsmObj::Relation(_) => {}
        }
    }
    info!(
        "Pass 2 complete: {} nodes loaded, {} ways loaded, {} other ways share nodes",
        extract.nodes.len(),
        extract.highways.len(),
        extract.references.len()
    );

    Ok(build_graph(extract, bbox))
}

/// Turns an extract into a graph.
///
/// Highways with a node missing from the extract, and highways outside
/// `bbox`, are not kept as ways. Their nodes, like those of `references`,
/// still count as shared.
pub fn build_graph(extract: Extract, bbox: Option<Extent>) -> Graph {
    let Extract {
        nodes,
        highways,
        mut references,
    } = extract;

    let (complete, incomplete): (Vec<Way>, Vec<Way>) = highways
        .into_iter()
        .partition(|way| way.nodes.iter().all(|id| nodes.contains_key(id)));
    if !incomplete.is_empty() {
        warn!(
            "Dropping {} ways with nodes missing from the extract",
            incomplete.len()
        );
    }
    references.extend(incomplete.into_iter().map(|way| (way.id, way.nodes)));

    let ways = match bbox {
        Some(bbox) => {
            let before = complete.len();
            let (inside, outside): (Vec<Way>, Vec<Way>) = complete
                .into_iter()
                .partition(|way| way_touches(way, &nodes, &bbox));
            debug!("Bounding box kept {} of {} ways", inside.len(), before);
            references.extend(outside.into_iter().map(|way| (way.id, way.nodes)));
            inside
        }
        None => complete,
    };

    let mut graph = Graph::from_entities(nodes.into_iter().map(|(_, node)| node), ways);
    for (way_id, way_nodes) in &references {
        graph.insert_way_reference(*way_id, way_nodes);
    }
    graph
}

fn way_touches(way: &Way, nodes: &AHashMap<NodeId, Node>, bbox: &Extent) -> bool {
    way.nodes
        .iter()
        .filter_map(|id| nodes.get(id))
        .any(|node| bbox.contains(node.loc))
}

/// Parses `min_lon,min_lat,max_lon,max_lat`.
pub fn parse_bbox(text: &str) -> Option<Extent> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] => Some(Extent::new(
            Coord {
                x: *min_lon,
                y: *min_lat,
            },
            Coord {
                x: *max_lon,
                y: *max_lat,
            },
        )),
        _ => None,
    }
}
