use crate::geometry_utils::Extent;
use crate::graph::{Graph, GraphError};
use crate::osm_types::WayId;
use log::debug;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

/// Range queries over way bounding boxes.
///
/// Result order must be stable for a given snapshot: callers take the first
/// match they find.
pub trait SpatialIndex {
    fn intersects(&self, extent: &Extent) -> Vec<WayId>;
}

type WayEnvelope = GeomWithData<Rectangle<[f64; 2]>, WayId>;

/// R-tree over the bounding boxes of every way in a graph
pub struct WayTree {
    tree: RTree<WayEnvelope>,
}

impl WayTree {
    /// Bulk-loads the tree. Ways are sorted by id first, since the graph's
    /// hash map iterates in an arbitrary order and bulk loading is
    /// order-sensitive.
    pub fn build(graph: &Graph) -> Result<Self, GraphError> {
        let mut ways: Vec<_> = graph.ways().collect();
        ways.sort_unstable_by_key(|way| way.id);

        let mut items = Vec::with_capacity(ways.len());
        for way in ways {
            let extent = graph.way_extent(way)?;
            if extent.is_empty() {
                continue;
            }
            items.push(GeomWithData::new(
                Rectangle::from_corners(
                    [extent.min.x, extent.min.y],
                    [extent.max.x, extent.max.y],
                ),
                way.id,
            ));
        }

        debug!("Bulk loading way tree with {} envelopes", items.len());
        Ok(Self {
            tree: RTree::bulk_load(items),
        })
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }
}

impl SpatialIndex for WayTree {
    fn intersects(&self, extent: &Extent) -> Vec<WayId> {
        if extent.is_empty() {
            return Vec::new();
        }
        let envelope = AABB::from_corners([extent.min.x, extent.min.y], [extent.max.x, extent.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|item| item.data)
            .collect()
    }
}

/// Fixed-order index for tests and callers that already hold a candidate
/// list. Filters by way extent but keeps insertion order.
pub struct ListIndex {
    entries: Vec<(Extent, WayId)>,
}

impl ListIndex {
    pub fn new(graph: &Graph, order: &[WayId]) -> Result<Self, GraphError> {
        let entries = order
            .iter()
            .map(|id| Ok((graph.way_extent(graph.way(*id)?)?, *id)))
            .collect::<Result<Vec<_>, GraphError>>()?;
        Ok(Self { entries })
    }
}

impl SpatialIndex for ListIndex {
    fn intersects(&self, extent: &Extent) -> Vec<WayId> {
        self.entries
            .iter()
            .filter(|(way_extent, _)| way_extent.intersects(extent))
            .map(|(_, id)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm_types::{Node, NodeId, Way};
    use geo::Coord;

    fn graph() -> Graph {
        Graph::from_entities(
            [
                Node::new(NodeId(1), 0.0, 0.0),
                Node::new(NodeId(2), 1.0, 1.0),
                Node::new(NodeId(3), 5.0, 5.0),
                Node::new(NodeId(4), 6.0, 6.0),
            ],
            [
                Way::new(WayId(1), vec![NodeId(1), NodeId(2)]),
                Way::new(WayId(2), vec![NodeId(3), NodeId(4)]),
                Way::new(WayId(3), vec![NodeId(2), NodeId(3)]),
            ],
        )
    }

    fn query(index: &impl SpatialIndex, a: (f64, f64), b: (f64, f64)) -> Vec<WayId> {
        let mut found = index.intersects(&Extent::new(
            Coord { x: a.0, y: a.1 },
            Coord { x: b.0, y: b.1 },
        ));
        found.sort();
        found
    }

    #[test]
    fn test_way_tree_query() {
        let tree = WayTree::build(&graph()).unwrap();
        assert_eq!(tree.size(), 3);
        assert_eq!(query(&tree, (0.4, 0.4), (0.6, 0.6)), vec![WayId(1)]);
        assert_eq!(query(&tree, (0.9, 0.9), (1.1, 1.1)), vec![WayId(1), WayId(3)]);
        assert!(query(&tree, (10.0, 10.0), (11.0, 11.0)).is_empty());
        assert!(tree.intersects(&Extent::default()).is_empty());
    }

    #[test]
    fn test_way_tree_order_is_stable() {
        let g = graph();
        let a = WayTree::build(&g).unwrap();
        let b = WayTree::build(&g).unwrap();
        let ext = Extent::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 7.0, y: 7.0 });
        assert_eq!(a.intersects(&ext), b.intersects(&ext));
    }

    #[test]
    fn test_list_index_keeps_order() {
        let g = graph();
        let index = ListIndex::new(&g, &[WayId(3), WayId(1)]).unwrap();
        let ext = Extent::new(Coord { x: 0.9, y: 0.9 }, Coord { x: 1.1, y: 1.1 });
        assert_eq!(index.intersects(&ext), vec![WayId(3), WayId(1)]);
        assert!(ListIndex::new(&g, &[WayId(9)]).is_err());
    }
}
