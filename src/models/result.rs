//! Ranked overlap results returned to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How much of one administrative area the query polygon covers.
///
/// Areas are in `unit`; `percent` is computed from the native square-meter
/// areas before conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapResult {
    /// Feature id from the dataset, or the OSM relation id on the remote path.
    pub id: Option<Value>,
    pub name: String,
    /// `ADM1`/`ADM2` locally, the raw `admin_level` tag remotely.
    pub admin_level: String,
    pub label: String,
    pub area_of_admin: f64,
    pub overlap_area: f64,
    pub percent: f64,
    pub unit: String,
}

/// Response body of both analysis endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlapItems {
    pub items: Vec<OverlapResult>,
}
