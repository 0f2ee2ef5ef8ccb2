use crate::config::OutputFormat;
use crate::validations::{Fix, Issue};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;
use std::io::Write;

#[derive(Serialize)]
pub struct Report<'a> {
    pub issues: &'a [Issue],
    /// Fixes that were applied to the loaded graph, if any
    pub applied_fixes: &'a [Fix],
}

pub fn write_json<W: Write>(writer: W, report: &Report<'_>) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, report)
}

fn issue_feature(issue: &Issue) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!(issue.kind));
    properties.insert("severity".to_string(), json!(issue.severity));
    properties.insert("message".to_string(), json!(issue.message));
    properties.insert("tooltip".to_string(), json!(issue.tooltip));
    properties.insert(
        "entities".to_string(),
        json!(issue.entities.iter().map(|e| e.to_string()).collect::<Vec<_>>()),
    );
    properties.insert(
        "fixes".to_string(),
        json!(issue.fixes.iter().map(|f| f.title.as_str()).collect::<Vec<_>>()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            issue.coordinates.x,
            issue.coordinates.y,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// One point feature per issue, at the issue's coordinates.
pub fn issues_to_geojson(issues: &[Issue]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: issues.iter().map(issue_feature).collect(),
        foreign_members: None,
    }
}

pub fn write_geojson<W: Write>(writer: W, issues: &[Issue]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &issues_to_geojson(issues))
}

/// Writes the report in `format` and flushes, so a buffered writer reports
/// write errors instead of dropping them.
pub fn write_report<W: Write>(
    mut writer: W,
    format: OutputFormat,
    report: &Report<'_>,
) -> serde_json::Result<()> {
    match format {
        OutputFormat::Json => write_json(&mut writer, report)?,
        OutputFormat::Geojson => write_geojson(&mut writer, report.issues)?,
    }
    writer.flush().map_err(serde_json::Error::io)
}
