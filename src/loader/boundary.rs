//! Optional municipal boundary layer (GeoJSON) for the violence map.

use std::path::Path;

use crate::loader::{read_bytes, LoadError, Origin, SourceReport};
use crate::models::columns::BOUNDARY_NAME_PROPERTY;

/// A GeoJSON FeatureCollection keyed by municipality name.
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    pub geojson: serde_json::Value,
    pub names: Vec<String>,
}

impl BoundaryLayer {
    /// Parse a FeatureCollection, collecting the municipality name of each feature.
    pub fn from_slice(data: &[u8]) -> Result<Self, LoadError> {
        let geojson: serde_json::Value = serde_json::from_slice(data)?;
        if geojson["type"] != "FeatureCollection" {
            return Err(LoadError::NotFeatureCollection);
        }
        let features = geojson["features"]
            .as_array()
            .ok_or(LoadError::NotFeatureCollection)?;
        let names = features
            .iter()
            .filter_map(|f| f["properties"][BOUNDARY_NAME_PROPERTY].as_str())
            .map(str::to_string)
            .collect();
        Ok(Self { geojson, names })
    }

    pub fn contains(&self, municipality: &str) -> bool {
        self.names.iter().any(|n| n == municipality)
    }

    /// Path of the feature key as the front-end expects it.
    pub fn feature_key() -> String {
        format!("properties.{BOUNDARY_NAME_PROPERTY}")
    }
}

pub fn load(path: &Path) -> Result<BoundaryLayer, LoadError> {
    let data = read_bytes(path)?;
    BoundaryLayer::from_slice(&data)
}

/// Load the layer if present. A missing file is expected and logged at info.
pub fn load_optional(path: &Path) -> (Option<BoundaryLayer>, SourceReport) {
    let path_text = path.display().to_string();
    match load(path) {
        Ok(layer) => {
            tracing::info!(features = layer.names.len(), "Loaded municipal boundaries");
            let report = SourceReport {
                source: "límites municipales".to_string(),
                path: path_text,
                origin: Origin::File,
                rows: layer.names.len(),
                parse_failures: 0,
            };
            (Some(layer), report)
        }
        Err(err) => {
            if err.is_not_found() {
                tracing::info!(path = %path_text, "No boundary file, violence map falls back to heat bar");
            } else {
                tracing::warn!(path = %path_text, error = %err, "Ignoring unreadable boundary file");
            }
            let report = SourceReport {
                source: "límites municipales".to_string(),
                path: path_text,
                origin: Origin::Placeholder {
                    reason: err.to_string(),
                },
                rows: 0,
                parse_failures: 0,
            };
            (None, report)
        }
    }
}
