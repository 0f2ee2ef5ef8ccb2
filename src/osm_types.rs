use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Typed wrapper for OSM node IDs. Negative values are entities created
/// locally that have not been uploaded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Typed wrapper for OSM way IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WayId(pub i64);

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Reference to either kind of entity, used where an issue or a selection
/// mixes nodes and ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Node(NodeId),
    Way(WayId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Node(id) => id.fmt(f),
            EntityId::Way(id) => id.fmt(f),
        }
    }
}

impl From<NodeId> for EntityId {
    fn from(id: NodeId) -> Self {
        EntityId::Node(id)
    }
}

impl From<WayId> for EntityId {
    fn from(id: WayId) -> Self {
        EntityId::Way(id)
    }
}

/// Key/value tags. Ordered so that serialized output is stable.
pub type Tags = BTreeMap<String, String>;

/// Builds a tag map from string pairs.
pub fn tags_from<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Tags {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Keys that make a closed way an area
const AREA_KEYS: [&str; 16] = [
    "aeroway",
    "amenity",
    "building",
    "building:part",
    "craft",
    "historic",
    "landuse",
    "leisure",
    "man_made",
    "military",
    "natural",
    "office",
    "place",
    "shop",
    "sport",
    "tourism",
];

/// Values of those keys that still describe a line
const LINEAR_VALUES: [(&str, &str); 8] = [
    ("aeroway", "taxiway"),
    ("leisure", "slipway"),
    ("leisure", "track"),
    ("man_made", "embankment"),
    ("man_made", "cutline"),
    ("natural", "cliff"),
    ("natural", "coastline"),
    ("natural", "tree_row"),
];

/// A point entity. `loc` is (lon, lat) in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub loc: Coord<f64>,
    #[serde(default)]
    pub tags: Tags,
}

impl Node {
    pub fn new(id: NodeId, lon: f64, lat: f64) -> Self {
        Self {
            id,
            loc: Coord { x: lon, y: lat },
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// `noexit=yes` marks an intentional dead end
    pub fn is_noexit(&self) -> bool {
        self.tags.get("noexit").is_some_and(|v| v == "yes")
    }
}

/// An ordered polyline (or ring, when closed) over shared nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub tags: Tags,
}

impl Way {
    pub fn new(id: WayId, nodes: Vec<NodeId>) -> Self {
        Self {
            id,
            nodes,
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.first() == self.last()
    }

    /// A way with fewer than two distinct nodes (three for a ring) has no
    /// usable geometry.
    pub fn is_degenerate(&self) -> bool {
        let mut distinct = self.nodes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len() < if self.is_closed() { 3 } else { 2 }
    }

    /// Has a `highway` tag with any value but `no`
    pub fn is_highway(&self) -> bool {
        self.tags.get("highway").is_some_and(|v| v != "no")
    }

    /// A closed way is an area when tagged `area=yes`, or when it carries a
    /// key that implies an area and `area` is not `no`.
    pub fn is_area(&self) -> bool {
        if !self.is_closed() {
            return false;
        }
        if let Some(area) = self.tags.get("area") {
            return area == "yes";
        }
        self.tags.iter().any(|(key, value)| {
            AREA_KEYS.contains(&key.as_str())
                && !LINEAR_VALUES.contains(&(key.as_str(), value.as_str()))
        })
    }

    /// The node adjacent to the endpoint at `endpoint_index` (which must be
    /// `0` or `nodes.len() - 1`).
    pub fn endpoint_neighbor(&self, endpoint_index: usize) -> Option<NodeId> {
        if self.nodes.len() < 2 {
            return None;
        }
        if endpoint_index == 0 {
            self.nodes.get(1).copied()
        } else {
            self.nodes.get(self.nodes.len() - 2).copied()
        }
    }

    /// Human-readable label: `name`, then `ref`, then the highway type and id.
    pub fn display_label(&self) -> String {
        if let Some(name) = self.tags.get("name") {
            return name.clone();
        }
        if let Some(r) = self.tags.get("ref") {
            return r.clone();
        }
        match self.tags.get("highway") {
            Some(kind) => {
                let kind = kind.replace('_', " ");
                let mut chars = kind.chars();
                let kind = match chars.next() {
                    Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                    None => kind,
                };
                format!("{} {}", kind, self.id)
            }
            None => self.id.to_string(),
        }
    }
}
