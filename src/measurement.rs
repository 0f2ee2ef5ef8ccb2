use crate::geometry_utils::{Extent, spherical_distance, spherical_length};
use crate::graph::{Graph, GraphError};
use crate::osm_types::{EntityId, NodeId, Way};
use crate::units::{decimal_coordinate_pair, display_area, display_length, dms_coordinate_pair};
use ahash::AHashSet;
use geo::{Centroid, ChamberlainDuquetteArea, Coord, LineString, Polygon};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    /// Standalone node
    Point,
    /// Node that belongs to a way
    Vertex,
    Line,
    Area,
}

impl GeometryKind {
    fn label(&self, closed: bool) -> &'static str {
        match (self, closed) {
            (GeometryKind::Point, _) => "point",
            (GeometryKind::Vertex, _) => "vertex",
            (GeometryKind::Line, false) => "line",
            (GeometryKind::Line, true) => "closed line",
            (GeometryKind::Area, false) => "area",
            (GeometryKind::Area, true) => "closed area",
        }
    }
}

/// Measurements of the current selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Measurement {
    pub heading: Option<String>,
    /// Only set for a single selected entity
    pub geometry: Option<GeometryKind>,
    pub closed: Option<bool>,
    pub node_count: Option<usize>,
    /// Total length (perimeter for closed ways), meters
    pub length_m: f64,
    /// Total area of closed ways, square meters
    pub area_m2: f64,
    /// Between exactly two selected nodes, meters
    pub distance_m: Option<f64>,
    pub location: Option<Coord<f64>>,
    pub centroid: Option<Coord<f64>>,
    pub center: Option<Coord<f64>>,
}

fn node_geometry(graph: &Graph, id: NodeId) -> GeometryKind {
    if graph.parent_ways(id).is_empty() {
        GeometryKind::Point
    } else {
        GeometryKind::Vertex
    }
}

fn way_centroid(coords: &[Coord<f64>], area: bool) -> Option<Coord<f64>> {
    let line = LineString::from(coords.to_vec());
    let centroid = if area {
        Polygon::new(line, vec![]).centroid()
    } else {
        line.centroid()
    };
    centroid.map(|p| p.0)
}

fn ring_area(coords: &[Coord<f64>]) -> f64 {
    Polygon::new(LineString::from(coords.to_vec()), vec![]).chamberlain_duquette_unsigned_area()
}

fn collect_nodes(graph: &Graph, id: EntityId, out: &mut AHashSet<NodeId>) -> Result<(), GraphError> {
    match id {
        EntityId::Node(id) => {
            out.insert(id);
        }
        EntityId::Way(id) => out.extend(graph.way(id)?.nodes.iter().copied()),
    }
    Ok(())
}

/// Summarizes `selection`. Ids that are not in the graph are ignored.
pub fn measure(graph: &Graph, selection: &[EntityId]) -> Result<Measurement, GraphError> {
    let selected: Vec<EntityId> = selection
        .iter()
        .copied()
        .filter(|id| graph.has_entity(*id))
        .collect();

    let mut m = Measurement::default();
    if selected.is_empty() {
        return Ok(m);
    }

    m.heading = Some(match selected.as_slice() {
        [only] => only.to_string(),
        many => format!("{} features", many.len()),
    });

    let mut extent = Extent::default();
    for id in &selected {
        extent.extend(&graph.entity_extent(*id)?);
        match *id {
            EntityId::Node(node_id) => m.geometry = Some(node_geometry(graph, node_id)),
            EntityId::Way(way_id) => {
                let way = graph.way(way_id)?;
                measure_way(graph, way, &mut m)?;
            }
        }
    }

    if selected.len() > 1 {
        m.geometry = None;
        m.closed = None;
        m.centroid = None;
    }

    if let [EntityId::Node(a), EntityId::Node(b)] = selected.as_slice() {
        m.distance_m = Some(spherical_distance(graph.node(*a)?.loc, graph.node(*b)?.loc));
    }

    if let [EntityId::Node(only)] = selected.as_slice() {
        m.location = Some(graph.node(*only)?.loc);
    } else {
        let mut nodes = AHashSet::new();
        for id in &selected {
            collect_nodes(graph, *id, &mut nodes)?;
        }
        m.node_count = Some(nodes.len());
    }

    if m.location.is_none() && m.centroid.is_none() {
        m.center = extent.center();
    }
    Ok(m)
}

fn measure_way(graph: &Graph, way: &Way, m: &mut Measurement) -> Result<(), GraphError> {
    let coords = graph.way_coords(way)?;
    let area = way.is_area();
    let closed = way.is_closed() && !way.is_degenerate();

    m.geometry = Some(if area { GeometryKind::Area } else { GeometryKind::Line });
    m.closed = Some(closed);
    m.length_m += spherical_length(&coords);
    m.centroid = way_centroid(&coords, area);
    if closed {
        m.area_m2 += ring_area(&coords);
    }
    Ok(())
}

impl Measurement {
    /// Label/value rows in the order an info panel lists them.
    pub fn rows(&self, imperial: bool) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        let closed = self.closed.unwrap_or(false);

        if let Some(geometry) = self.geometry {
            rows.push(("Geometry", geometry.label(closed).to_string()));
        }
        if let Some(count) = self.node_count.filter(|c| *c > 0) {
            rows.push(("Number of nodes", count.to_string()));
        }
        if self.area_m2 > 0.0 {
            rows.push(("Area", display_area(self.area_m2, imperial)));
        }
        if self.length_m > 0.0 {
            let label = if closed { "Perimeter" } else { "Length" };
            rows.push((label, display_length(self.length_m, imperial)));
        }
        if let Some(distance) = self.distance_m {
            rows.push(("Distance", display_length(distance, imperial)));
        }
        for (label, coord) in [
            ("Location", self.location),
            ("Centroid", self.centroid),
            ("Center", self.center),
        ] {
            if let Some(c) = coord {
                let text = format!(
                    "{} / {}",
                    dms_coordinate_pair(c),
                    decimal_coordinate_pair(c)
                );
                rows.push((label, text));
            }
        }
        rows
    }
}
