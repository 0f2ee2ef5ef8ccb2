//! Validation rules over an edit batch, and the issue records they emit.

pub mod almost_junction;

#[cfg(test)]
mod almost_junction_tests;

use crate::graph::{Graph, GraphError, TagMutator};
use crate::osm_types::{EntityId, NodeId, Tags, WayId};
use crate::spatial_index::SpatialIndex;
use geo::Coord;
use log::{info, warn};
use serde::Serialize;

/// Ways touched by the current edit batch.
#[derive(Debug, Clone, Default)]
pub struct Changes {
    pub created: Vec<WayId>,
    pub modified: Vec<WayId>,
}

impl Changes {
    /// Created ways first, then modified ones.
    pub fn edited(&self) -> impl Iterator<Item = WayId> + '_ {
        self.created.iter().chain(self.modified.iter()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    HighwayAlmostJunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    TagAsDisconnected,
}

/// A suggested fix, described as data. Nothing is changed until it is
/// handed to a [`TagMutator`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fix {
    pub kind: FixKind,
    pub title: String,
    pub target: NodeId,
    /// Tags to set on `target`, on top of whatever it already carries
    pub set_tags: Tags,
    /// Undo/redo annotation for the edit
    pub annotation: String,
}

impl Fix {
    /// Tags the target ends up with when the fix lands on top of `current`.
    pub fn merged_tags(&self, current: &Tags) -> Tags {
        let mut tags = current.clone();
        tags.extend(self.set_tags.clone());
        tags
    }

    /// Applies the fix as one tag edit. `current` is the target's tag set
    /// before the edit.
    pub fn apply<M: TagMutator>(&self, current: &Tags, mutator: &mut M) -> Result<(), GraphError> {
        mutator.change_tags(self.target, self.merged_tags(current), &self.annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub tooltip: &'static str,
    pub entities: Vec<EntityId>,
    /// Representative location, (lon, lat)
    pub coordinates: Coord<f64>,
    pub fixes: Vec<Fix>,
}

/// A rule run over every edit batch.
pub trait Validation {
    fn id(&self) -> &'static str;

    fn validate(
        &self,
        changes: &Changes,
        graph: &Graph,
        index: &dyn SpatialIndex,
    ) -> Result<Vec<Issue>, GraphError>;
}

/// Runs every rule. A rule that fails is logged and skipped so the rest
/// still report.
pub fn run_validations(
    rules: &[&dyn Validation],
    changes: &Changes,
    graph: &Graph,
    index: &dyn SpatialIndex,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    for rule in rules {
        match rule.validate(changes, graph, index) {
            Ok(found) => {
                info!("{}: {} issues", rule.id(), found.len());
                issues.extend(found);
            }
            Err(e) => warn!("{} failed: {}", rule.id(), e),
        }
    }
    issues
}
