use super::almost_junction::*;
use super::*;
use crate::osm_types::{Node, Way, tags_from};
use crate::spatial_index::{ListIndex, WayTree};

const ROAD: [(&str, &str); 1] = [("highway", "residential")];

fn road(id: i64, nodes: &[i64]) -> Way {
    Way::new(WayId(id), nodes.iter().map(|n| NodeId(*n)).collect()).with_tags(tags_from(ROAD))
}

fn node(id: i64, lon: f64, lat: f64) -> Node {
    Node::new(NodeId(id), lon, lat)
}

/// A = n1 (0,0) -> n2 (0,0.00003), B = n3 (0,0.00006) -> n4 (0,0.0001).
/// The gap between A's end and B's start is about 3.3m.
fn collinear_pair() -> Graph {
    Graph::from_entities(
        [
            node(1, 0.0, 0.0),
            node(2, 0.0, 0.00003),
            node(3, 0.0, 0.00006),
            node(4, 0.0, 0.0001),
        ],
        [road(100, &[1, 2]), road(200, &[3, 4])],
    )
}

fn modified(ids: &[i64]) -> Changes {
    Changes {
        created: Vec::new(),
        modified: ids.iter().map(|id| WayId(*id)).collect(),
    }
}

fn run(graph: &Graph, changes: &Changes) -> Vec<Issue> {
    let tree = WayTree::build(graph).unwrap();
    detect(changes, graph, &tree).unwrap()
}

#[test]
fn test_collinear_gap_is_flagged() {
    let graph = collinear_pair();
    let issues = run(&graph, &modified(&[100]));

    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    assert_eq!(issue.kind, IssueKind::HighwayAlmostJunction);
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(
        issue.entities,
        vec![
            EntityId::Way(WayId(100)),
            EntityId::Node(NodeId(2)),
            EntityId::Way(WayId(200)),
        ]
    );
    assert_eq!(issue.coordinates, graph.node(NodeId(2)).unwrap().loc);
    assert_eq!(issue.tooltip, TOOLTIP_KEY);
    assert_eq!(
        issue.message,
        "Residential w100 is very close but not connected to Residential w200."
    );
}

#[test]
fn test_untagged_end_gets_one_fix() {
    let graph = collinear_pair();
    let issues = run(&graph, &modified(&[100]));
    assert_eq!(issues[0].fixes.len(), 1);

    let fix = &issues[0].fixes[0];
    assert_eq!(fix.kind, FixKind::TagAsDisconnected);
    assert_eq!(fix.target, NodeId(2));
    assert_eq!(fix.set_tags, tags_from([("noexit", "yes")]));
}

#[test]
fn test_tagged_end_gets_no_fix() {
    let mut graph = collinear_pair();
    graph.insert_node(node(2, 0.0, 0.00003).with_tags(tags_from([("barrier", "yes")])));

    let issues = run(&graph, &modified(&[100]));
    assert_eq!(issues.len(), 1);
    assert!(issues[0].fixes.is_empty());
}

#[test]
fn test_noexit_end_is_skipped() {
    let mut graph = collinear_pair();
    graph.insert_node(node(2, 0.0, 0.00003).with_tags(tags_from([("noexit", "yes")])));
    assert!(run(&graph, &modified(&[100])).is_empty());
}

#[test]
fn test_shared_end_is_skipped() {
    let mut graph = collinear_pair();
    graph.insert_node(node(5, 0.0001, 0.00003));
    graph.insert_way(road(300, &[2, 5]));
    assert!(run(&graph, &modified(&[100])).is_empty());
}

#[test]
fn test_end_shared_with_non_highway_is_skipped() {
    let mut graph = collinear_pair();
    graph.insert_node(node(20, 0.0001, 0.00003));
    graph.insert_way(
        Way::new(WayId(800), vec![NodeId(2), NodeId(20)])
            .with_tags(tags_from([("amenity", "parking")])),
    );
    assert!(run(&graph, &modified(&[100])).is_empty());

    // same when only the reference is known
    let mut graph = collinear_pair();
    graph.insert_way_reference(WayId(800), &[NodeId(2)]);
    assert!(run(&graph, &modified(&[100])).is_empty());
}

#[test]
fn test_closed_ring_is_skipped() {
    // ring whose first segment points straight at B
    let mut graph = collinear_pair();
    graph.insert_node(node(6, 0.00002, 0.0));
    graph.insert_way(road(100, &[2, 1, 6, 2]));

    let issues = run(&graph, &modified(&[100]));
    assert!(issues.is_empty());
}

#[test]
fn test_isolated_way_has_no_issue() {
    let graph = Graph::from_entities(
        [node(1, 0.0, 0.0), node(2, 0.0, 0.00003), node(3, 0.0, 0.00015), node(4, 0.0, 0.0002)],
        [road(100, &[1, 2]), road(200, &[3, 4])],
    );
    assert!(run(&graph, &modified(&[100])).is_empty());
}

#[test]
fn test_perpendicular_road_is_flagged() {
    let graph = Graph::from_entities(
        [
            node(1, 0.0, 0.0),
            node(2, 0.0, 0.00003),
            node(3, -0.0001, 0.00005),
            node(4, 0.0001, 0.00005),
        ],
        [road(100, &[1, 2]), road(200, &[3, 4])],
    );
    let tree = WayTree::build(&graph).unwrap();
    let way = graph.way(WayId(100)).unwrap();

    assert_eq!(can_extend(way, 1, &graph, &tree).unwrap(), Some(WayId(200)));
    assert_eq!(can_extend(way, 0, &graph, &tree).unwrap(), None);
}

#[test]
fn test_non_highways_are_ignored() {
    let mut graph = collinear_pair();
    graph.insert_way(
        Way::new(WayId(200), vec![NodeId(3), NodeId(4)]).with_tags(tags_from([("highway", "no")])),
    );
    assert!(run(&graph, &modified(&[100])).is_empty());

    graph.insert_way(
        Way::new(WayId(200), vec![NodeId(3), NodeId(4)]).with_tags(tags_from([("waterway", "ditch")])),
    );
    assert!(run(&graph, &modified(&[100])).is_empty());

    // the edited way itself must be a highway
    graph.insert_way(road(200, &[3, 4]));
    graph.insert_way(Way::new(WayId(100), vec![NodeId(1), NodeId(2)]));
    assert!(run(&graph, &modified(&[100])).is_empty());
}

#[test]
fn test_both_edited_ways_report() {
    let graph = collinear_pair();
    let changes = Changes {
        created: vec![WayId(200)],
        modified: vec![WayId(100)],
    };
    let issues = run(&graph, &changes);
    assert_eq!(issues.len(), 2);
    // created ways come first
    assert_eq!(issues[0].entities[0], EntityId::Way(WayId(200)));
    assert_eq!(issues[0].entities[1], EntityId::Node(NodeId(3)));
    assert_eq!(issues[1].entities[0], EntityId::Way(WayId(100)));
}

#[test]
fn test_degenerate_ways_yield_nothing() {
    let mut graph = collinear_pair();
    graph.insert_way(road(500, &[1]));
    graph.insert_way(road(501, &[]));
    assert!(run(&graph, &modified(&[500, 501])).is_empty());
}

#[test]
fn test_zero_length_end_segment_yields_nothing() {
    let mut graph = collinear_pair();
    graph.insert_node(node(7, 0.0, 0.00003));
    graph.insert_way(road(100, &[1, 2, 7]));
    let way = graph.way(WayId(100)).unwrap();
    let tree = WayTree::build(&graph).unwrap();
    assert_eq!(can_extend(way, 2, &graph, &tree).unwrap(), None);
}

#[test]
fn test_first_match_follows_index_order() {
    // two roads crossing the extension, at ~1.1m and ~2.2m past the tip
    let graph = Graph::from_entities(
        [
            node(1, 0.0, 0.0),
            node(2, 0.0, 0.00003),
            node(3, -0.0001, 0.00004),
            node(4, 0.0001, 0.00004),
            node(5, -0.0001, 0.00005),
            node(6, 0.0001, 0.00005),
        ],
        [road(100, &[1, 2]), road(200, &[3, 4]), road(300, &[5, 6])],
    );
    let changes = modified(&[100]);

    let far_first = ListIndex::new(&graph, &[WayId(300), WayId(200), WayId(100)]).unwrap();
    let issues = detect(&changes, &graph, &far_first).unwrap();
    assert_eq!(issues[0].entities[2], EntityId::Way(WayId(300)));

    let near_first = ListIndex::new(&graph, &[WayId(200), WayId(300), WayId(100)]).unwrap();
    let issues = detect(&changes, &graph, &near_first).unwrap();
    assert_eq!(issues[0].entities[2], EntityId::Way(WayId(200)));

    // same snapshot, same tree, same answer
    assert_eq!(run(&graph, &changes), run(&graph, &changes));
}

#[test]
fn test_missing_node_is_an_error() {
    let mut graph = collinear_pair();
    graph.insert_way(road(600, &[1, 99]));
    let tree = WayTree::build(&collinear_pair()).unwrap();
    let err = detect(&modified(&[600]), &graph, &tree).unwrap_err();
    assert_eq!(err, GraphError::MissingNode(NodeId(99)));
}

struct AlwaysFails;

impl Validation for AlwaysFails {
    fn id(&self) -> &'static str {
        "always_fails"
    }

    fn validate(
        &self,
        _changes: &Changes,
        _graph: &Graph,
        _index: &dyn SpatialIndex,
    ) -> Result<Vec<Issue>, GraphError> {
        Err(GraphError::MissingWay(WayId(0)))
    }
}

#[test]
fn test_failing_rule_does_not_stop_others() {
    let graph = collinear_pair();
    let tree = WayTree::build(&graph).unwrap();
    let rules: [&dyn Validation; 2] = [&AlwaysFails, &HighwayAlmostJunction];
    let issues = run_validations(&rules, &modified(&[100]), &graph, &tree);
    assert_eq!(issues.len(), 1);
}

#[derive(Default)]
struct Recorder {
    edits: Vec<(NodeId, Tags, String)>,
}

impl TagMutator for Recorder {
    fn change_tags(
        &mut self,
        node: NodeId,
        tags: Tags,
        annotation: &str,
    ) -> Result<(), GraphError> {
        self.edits.push((node, tags, annotation.to_string()));
        Ok(())
    }
}

#[test]
fn test_fix_is_one_edit() {
    let graph = collinear_pair();
    let issues = run(&graph, &modified(&[100]));
    let mut recorder = Recorder::default();
    let current = &graph.node(NodeId(2)).unwrap().tags;
    issues[0].fixes[0].apply(current, &mut recorder).unwrap();

    assert_eq!(recorder.edits.len(), 1);
    let (target, tags, annotation) = &recorder.edits[0];
    assert_eq!(*target, NodeId(2));
    assert_eq!(*tags, tags_from([("noexit", "yes")]));
    assert!(!annotation.is_empty());
}

#[test]
fn test_fix_keeps_existing_tags() {
    let graph = collinear_pair();
    let issues = run(&graph, &modified(&[100]));
    let current = tags_from([("created_by", "editor")]);
    let merged = issues[0].fixes[0].merged_tags(&current);
    assert_eq!(merged, tags_from([("created_by", "editor"), ("noexit", "yes")]));
}

#[test]
fn test_applied_fix_clears_issue() {
    let mut graph = collinear_pair();
    let issues = run(&graph, &modified(&[100]));
    let fix = issues[0].fixes[0].clone();
    let current = graph.node(NodeId(2)).unwrap().tags.clone();
    fix.apply(&current, &mut graph).unwrap();

    assert!(graph.node(NodeId(2)).unwrap().is_noexit());
    assert!(run(&graph, &modified(&[100])).is_empty());
}
