// ===========================================================================
// Highway Almost-Junction
// ===========================================================================
//
// Looks for highways whose dangling end stops just short of another highway.
// The last segment at each free end is extended straight ahead by a fixed
// distance; if the extension crosses another highway, the two were probably
// meant to be joined.
//
// - Closed ways and ends that already join another way are never checked.
// - Ends tagged noexit=yes are intentional dead ends.
// - The first crossing way in index order wins. There is no nearest-match
//   ranking.
// ===========================================================================

use super::{Changes, Fix, FixKind, Issue, IssueKind, Severity, Validation};
use crate::geometry_utils::{Extent, segment_intersection, spherical_distance, vec_interp};
use crate::graph::{Graph, GraphError};
use crate::osm_types::{NodeId, Way, WayId, tags_from};
use crate::spatial_index::SpatialIndex;
use geo::Line;
use log::debug;

/// How far past its tip a dangling end is extended, in meters
pub const EXTEND_THRESHOLD_METERS: f64 = 5.0;

pub const TOOLTIP_KEY: &str = "issues.highway_almost_junction.tooltip";

/// A free end of an edited way, and the way its extension runs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub node: NodeId,
    pub matched_way: WayId,
}

pub struct HighwayAlmostJunction;

impl Validation for HighwayAlmostJunction {
    fn id(&self) -> &'static str {
        "highway_almost_junction"
    }

    fn validate(
        &self,
        changes: &Changes,
        graph: &Graph,
        index: &dyn SpatialIndex,
    ) -> Result<Vec<Issue>, GraphError> {
        detect(changes, graph, index)
    }
}

/// Issues for every edited highway end that could reach another highway
/// with a short extension.
pub fn detect(
    changes: &Changes,
    graph: &Graph,
    index: &dyn SpatialIndex,
) -> Result<Vec<Issue>, GraphError> {
    let mut issues = Vec::new();
    for way_id in changes.edited() {
        let way = graph.way(way_id)?;
        if !way.is_highway() {
            continue;
        }
        for candidate in connectable_end_nodes(way, graph, index)? {
            debug!(
                "{} end {} almost meets {}",
                way.id, candidate.node, candidate.matched_way
            );
            issues.push(build_issue(way, candidate, graph)?);
        }
    }
    Ok(issues)
}

/// Free ends of `way` whose extension crosses another highway.
pub fn connectable_end_nodes(
    way: &Way,
    graph: &Graph,
    index: &dyn SpatialIndex,
) -> Result<Vec<Candidate>, GraphError> {
    let mut results = Vec::new();
    let (Some(first), Some(last)) = (way.first(), way.last()) else {
        return Ok(results);
    };
    if first == last {
        return Ok(results);
    }

    for (endpoint_index, node_id) in [(0, first), (way.nodes.len() - 1, last)] {
        let node = graph.node(node_id)?;
        if node.is_noexit() || graph.parent_ways(node_id).len() != 1 {
            continue;
        }
        if let Some(matched_way) = can_extend(way, endpoint_index, graph, index)? {
            results.push(Candidate {
                node: node_id,
                matched_way,
            });
        }
    }
    Ok(results)
}

/// Extends the end segment at `endpoint_index` by [`EXTEND_THRESHOLD_METERS`]
/// and returns the first other highway the extension crosses.
pub fn can_extend(
    way: &Way,
    endpoint_index: usize,
    graph: &Graph,
    index: &dyn SpatialIndex,
) -> Result<Option<WayId>, GraphError> {
    let (Some(&tip_id), Some(mid_id)) = (
        way.nodes.get(endpoint_index),
        way.endpoint_neighbor(endpoint_index),
    ) else {
        return Ok(None);
    };
    let tip = graph.node(tip_id)?.loc;
    let mid = graph.node(mid_id)?.loc;

    let edge_len = spherical_distance(mid, tip);
    if edge_len <= 0.0 {
        return Ok(None);
    }

    // lon/lat are treated as locally linear over a few meters
    let t = EXTEND_THRESHOLD_METERS / edge_len + 1.0;
    let extended_tip = vec_interp(mid, tip, t);
    let extension = Line::new(tip, extended_tip);

    let mut query = Extent::around(tip, EXTEND_THRESHOLD_METERS / 2.0);
    query.extend_coord(extended_tip);

    for other_id in index.intersects(&query) {
        if other_id == way.id {
            continue;
        }
        let other = graph.way(other_id)?;
        if !other.is_highway() {
            continue;
        }
        for pair in other.nodes.windows(2) {
            let a = graph.node(pair[0])?.loc;
            let b = graph.node(pair[1])?.loc;
            if segment_intersection(extension, Line::new(a, b)).is_some() {
                return Ok(Some(other_id));
            }
        }
    }
    Ok(None)
}

fn build_issue(way: &Way, candidate: Candidate, graph: &Graph) -> Result<Issue, GraphError> {
    let node = graph.node(candidate.node)?;
    let other = graph.way(candidate.matched_way)?;

    // never offer to retag a node the user already tagged
    let fixes = if node.tags.is_empty() {
        vec![Fix {
            kind: FixKind::TagAsDisconnected,
            title: "Tag as disconnected".to_string(),
            target: node.id,
            set_tags: tags_from([("noexit", "yes")]),
            annotation: "Tagged very close features as disconnected.".to_string(),
        }]
    } else {
        Vec::new()
    };

    Ok(Issue {
        kind: IssueKind::HighwayAlmostJunction,
        severity: Severity::Warning,
        message: format!(
            "{} is very close but not connected to {}.",
            way.display_label(),
            other.display_label()
        ),
        tooltip: TOOLTIP_KEY,
        entities: vec![way.id.into(), node.id.into(), other.id.into()],
        coordinates: node.loc,
        fixes,
    })
}
