//! Percent computation, unit conversion and top-N ranking.

use serde_json::Value;

use crate::models::{AreaUnit, OverlapResult};

/// Result cap of the local dataset path.
pub const LOCAL_RESULT_LIMIT: usize = 50;

/// Result cap of the Overpass path.
pub const REMOTE_RESULT_LIMIT: usize = 20;

/// An overlapping area before ranking, with areas in square meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: Option<Value>,
    pub name: String,
    pub admin_level: String,
    pub label: String,
    pub admin_area: f64,
    pub overlap_area: f64,
}

impl Candidate {
    pub fn percent(&self) -> f64 {
        self.overlap_area / self.admin_area * 100.0
    }
}

/// Sort candidates by overlap percent, highest first, and keep the top `limit`.
///
/// Candidates without a positive admin and overlap area are dropped.
pub fn rank(candidates: Vec<Candidate>, unit: AreaUnit, limit: usize) -> Vec<OverlapResult> {
    let mut results: Vec<OverlapResult> = candidates
        .into_iter()
        .filter(|c| c.admin_area > 0.0 && c.overlap_area > 0.0)
        .map(|c| OverlapResult {
            percent: c.percent(),
            area_of_admin: unit.convert(c.admin_area),
            overlap_area: unit.convert(c.overlap_area),
            id: c.id,
            name: c.name,
            admin_level: c.admin_level,
            label: c.label,
            unit: unit.label().to_string(),
        })
        .collect();

    results.sort_by(|a, b| b.percent.total_cmp(&a.percent));
    results.truncate(limit);
    results
}
