use crate::geometry_utils::Extent;
use crate::osm_types::{EntityId, Node, NodeId, Tags, Way, WayId};
use ahash::AHashMap;
use geo::Coord;
use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} is not in the graph")]
    MissingNode(NodeId),
    #[error("way {0} is not in the graph")]
    MissingWay(WayId),
}

/// Snapshot of the edit graph. Entities are looked up by id; ways refer to
/// nodes by id only, so there are no cyclic references.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: AHashMap<NodeId, Node>,
    ways: AHashMap<WayId, Way>,
    /// node -> ways that reference it, in insertion order
    parent_ways: AHashMap<NodeId, Vec<WayId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(
        nodes: impl IntoIterator<Item = Node>,
        ways: impl IntoIterator<Item = Way>,
    ) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert_node(node);
        }
        for way in ways {
            graph.insert_way(way);
        }
        graph
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Inserts or replaces a way, keeping the parent index in step.
    pub fn insert_way(&mut self, way: Way) {
        if let Some(previous) = self.ways.remove(&way.id) {
            self.unlink(&previous);
        }
        for node_id in &way.nodes {
            let parents = self.parent_ways.entry(*node_id).or_default();
            // a closed way lists its first node twice
            if !parents.contains(&way.id) {
                parents.push(way.id);
            }
        }
        self.ways.insert(way.id, way);
    }

    /// Records that `way` references `nodes` without storing the way itself.
    /// Used for ways the graph does not keep (other features, ways outside
    /// the loaded area) so that their nodes still count as shared.
    pub fn insert_way_reference(&mut self, way: WayId, nodes: &[NodeId]) {
        if self.ways.contains_key(&way) {
            return;
        }
        for node_id in nodes {
            let parents = self.parent_ways.entry(*node_id).or_default();
            if !parents.contains(&way) {
                parents.push(way);
            }
        }
    }

    fn unlink(&mut self, way: &Way) {
        for node_id in &way.nodes {
            if let Some(parents) = self.parent_ways.get_mut(node_id) {
                parents.retain(|id| *id != way.id);
                if parents.is_empty() {
                    self.parent_ways.remove(node_id);
                }
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::MissingNode(id))
    }

    pub fn way(&self, id: WayId) -> Result<&Way, GraphError> {
        self.ways.get(&id).ok_or(GraphError::MissingWay(id))
    }

    pub fn has_entity(&self, id: EntityId) -> bool {
        match id {
            EntityId::Node(id) => self.nodes.contains_key(&id),
            EntityId::Way(id) => self.ways.contains_key(&id),
        }
    }

    /// Ways that reference `node`, anywhere along their node list.
    pub fn parent_ways(&self, node: NodeId) -> &[WayId] {
        self.parent_ways
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    /// Resolved coordinates of a way, in node order.
    pub fn way_coords(&self, way: &Way) -> Result<Vec<Coord<f64>>, GraphError> {
        way.nodes
            .iter()
            .map(|id| self.node(*id).map(|n| n.loc))
            .collect()
    }

    pub fn way_extent(&self, way: &Way) -> Result<Extent, GraphError> {
        Ok(Extent::from_coords(&self.way_coords(way)?))
    }

    pub fn entity_extent(&self, id: EntityId) -> Result<Extent, GraphError> {
        match id {
            EntityId::Node(id) => {
                let loc = self.node(id)?.loc;
                Ok(Extent::new(loc, loc))
            }
            EntityId::Way(id) => self.way_extent(self.way(id)?),
        }
    }
}

/// Applies a tag change to a node as a single edit. Implementors that keep
/// an undo history record `annotation` against the edit.
pub trait TagMutator {
    fn change_tags(&mut self, node: NodeId, tags: Tags, annotation: &str)
    -> Result<(), GraphError>;
}

impl TagMutator for Graph {
    fn change_tags(
        &mut self,
        node: NodeId,
        tags: Tags,
        annotation: &str,
    ) -> Result<(), GraphError> {
        let entity = self.nodes.get_mut(&node).ok_or(GraphError::MissingNode(node))?;
        debug!("{annotation}: {node} tags {:?} -> {:?}", entity.tags, tags);
        entity.tags = tags;
        Ok(())
    }
}
