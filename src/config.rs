use crate::geometry_utils::Extent;
use geo::Coord;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Bounding box in the format (min_lon, min_lat, max_lon, max_lat)
pub type BBox = (f64, f64, f64, f64);

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Geojson,
}

/// Settings for a validation run, read from a RON file. Command-line flags
/// override individual fields.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Only ways with a node inside this box are loaded
    pub bbox: Option<BBox>,
    pub format: OutputFormat,
    /// Apply every suggested fix to the loaded graph and report them
    pub apply_fixes: bool,
    /// Show measurements in feet and miles
    pub imperial: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            bbox: None,
            format: OutputFormat::Json,
            apply_fixes: false,
            imperial: false,
        }
    }
}

impl ValidatorConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn bbox_extent(&self) -> Option<Extent> {
        self.bbox.map(|(min_lon, min_lat, max_lon, max_lat)| {
            Extent::new(
                Coord {
                    x: min_lon,
                    y: min_lat,
                },
                Coord {
                    x: max_lon,
                    y: max_lat,
                },
            )
        })
    }
}
