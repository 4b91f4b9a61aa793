//! Where administrative datasets come from.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::Dataset;
use crate::models::AdminFeature;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON for ADM{level}: {source}")]
    Json {
        level: u8,
        #[source]
        source: serde_json::Error,
    },

    #[error("ADM{0} dataset is not a FeatureCollection")]
    NotFeatureCollection(u8),
}

/// Supplies the feature collection of an administrative level.
pub trait DatasetSource: Send + Sync {
    /// `Ok(None)` when no dataset exists for `level`.
    fn load(&self, level: u8) -> Result<Option<Dataset>, DatasetError>;

    /// Human-readable hint on how to provision missing datasets.
    fn describe(&self) -> String;
}

/// Reads `<prefix>_adm<level>.geojson` files from a directory.
#[derive(Debug, Clone)]
pub struct GeoJsonDirSource {
    dir: PathBuf,
    prefix: String,
}

impl GeoJsonDirSource {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, level: u8) -> PathBuf {
        self.dir
            .join(format!("{}_adm{}.geojson", self.prefix, level))
    }
}

impl DatasetSource for GeoJsonDirSource {
    fn load(&self, level: u8) -> Result<Option<Dataset>, DatasetError> {
        let path = self.path_for(level);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DatasetError::Io { path, source }),
        };
        parse_dataset(level, &content).map(Some)
    }

    fn describe(&self) -> String {
        format!(
            "Put {}_adm1.geojson & {}_adm2.geojson in {}",
            self.prefix,
            self.prefix,
            self.dir.display()
        )
    }
}

/// GeoJSON documents held in memory, keyed by level.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: HashMap<u8, String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: u8, geojson: impl Into<String>) -> Self {
        self.documents.insert(level, geojson.into());
        self
    }
}

impl DatasetSource for StaticSource {
    fn load(&self, level: u8) -> Result<Option<Dataset>, DatasetError> {
        self.documents
            .get(&level)
            .map(|content| parse_dataset(level, content))
            .transpose()
    }

    fn describe(&self) -> String {
        "Register a GeoJSON document for the requested levels".to_string()
    }
}

/// Parse a GeoJSON FeatureCollection into a dataset for `level`.
///
/// Features are converted one by one; a feature that is not valid GeoJSON
/// is logged and skipped so the rest of the level stays usable.
pub fn parse_dataset(level: u8, content: &str) -> Result<Dataset, DatasetError> {
    let document: Value =
        serde_json::from_str(content).map_err(|source| DatasetError::Json { level, source })?;

    let features = match document {
        Value::Object(mut collection)
            if collection.get("type").and_then(Value::as_str) == Some("FeatureCollection") =>
        {
            match collection.remove("features") {
                Some(Value::Array(features)) => features,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => return Err(DatasetError::NotFeatureCollection(level)),
            }
        }
        _ => return Err(DatasetError::NotFeatureCollection(level)),
    };

    let total = features.len();
    let features: Vec<AdminFeature> = features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| match to_feature(feature) {
            Ok(feature) => Some(feature),
            Err(e) => {
                warn!(level, index, "Skipping malformed feature: {}", e);
                None
            }
        })
        .collect();

    if features.len() < total {
        warn!(
            "{} of {} ADM{} features skipped",
            total - features.len(),
            total,
            level
        );
    }

    Ok(Dataset::build(level, features))
}

fn to_feature(mut value: Value) -> Result<AdminFeature, geojson::Error> {
    // A null id is as good as no id
    if let Value::Object(object) = &mut value {
        if object.get("id").is_some_and(Value::is_null) {
            object.remove("id");
        }
    }
    geojson::Feature::try_from(value).map(AdminFeature::from_geojson)
}
