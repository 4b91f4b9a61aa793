//! Overlap ranking against the locally held ADM datasets.

use tracing::{debug, warn};

use super::{
    aggregate_overlap, rank, resolve_name, sample_keys, Candidate, FallbackPolicy,
    GeometryKernel, QueryGeometry, LOCAL_RESULT_LIMIT,
};
use crate::dataset::{Dataset, DatasetCache};
use crate::error::AnalysisError;
use crate::models::{
    adm_label, AdminCategory, AdminFeature, AreaUnit, LatLng, OverlapResult, QueryPolygon,
    SUPPORTED_LEVELS,
};

/// Ranks dataset features by how much of them a query polygon covers.
pub struct LocalAnalyzer<K> {
    kernel: K,
    datasets: DatasetCache,
    policy: FallbackPolicy,
}

impl<K: GeometryKernel> LocalAnalyzer<K> {
    pub fn new(kernel: K, datasets: DatasetCache, policy: FallbackPolicy) -> Self {
        Self {
            kernel,
            datasets,
            policy,
        }
    }

    pub fn datasets(&self) -> &DatasetCache {
        &self.datasets
    }

    /// Run the full local pipeline. An empty `levels` means every supported level.
    pub fn analyze(
        &self,
        points: &[LatLng],
        unit: AreaUnit,
        levels: &[u8],
    ) -> Result<Vec<OverlapResult>, AnalysisError> {
        let query = QueryPolygon::from_points(points)?;

        let levels = select_levels(levels);
        let datasets: Vec<&Dataset> = levels
            .iter()
            .filter_map(|level| self.datasets.get(*level))
            .collect();

        if datasets.is_empty() {
            return Err(AnalysisError::DatasetMissing {
                levels,
                hint: self.datasets.provisioning_hint(),
            });
        }

        let query = QueryGeometry::repaired(&self.kernel, &query);
        let Some(bbox) = query.bbox else {
            return Ok(Vec::new());
        };

        let mut candidates = Vec::new();
        let mut scanned = 0;
        for dataset in datasets {
            for feature in dataset.candidates(&bbox) {
                scanned += 1;
                if let Some(candidate) =
                    analyze_feature(&self.kernel, self.policy, &query, dataset.level(), feature)
                {
                    candidates.push(candidate);
                }
            }
        }

        debug!(
            "Local overlap: {} bbox candidates, {} overlapping",
            scanned,
            candidates.len()
        );

        Ok(rank(candidates, unit, LOCAL_RESULT_LIMIT))
    }
}

/// Score one feature. `None` when it has no positive admin or overlap area.
pub fn analyze_feature<K: GeometryKernel + ?Sized>(
    kernel: &K,
    policy: FallbackPolicy,
    query: &QueryGeometry,
    level: u8,
    feature: &AdminFeature,
) -> Option<Candidate> {
    let overlap = aggregate_overlap(kernel, policy, query, &feature.parts);
    if !overlap.is_positive() {
        return None;
    }

    let resolved = resolve_name(&feature.properties);
    if resolved.is_placeholder() {
        warn!(
            level,
            keys = %sample_keys(&feature.properties),
            id = ?feature.id,
            "NO_NAME_FEATURE"
        );
    }

    Some(Candidate {
        id: feature.id.clone(),
        name: resolved.name,
        admin_level: adm_label(level),
        label: AdminCategory::from_adm_level(level).label().to_string(),
        admin_area: overlap.admin_area,
        overlap_area: overlap.overlap_area,
    })
}

/// Requested levels restricted to supported ones, in supported order.
fn select_levels(requested: &[u8]) -> Vec<u8> {
    if requested.is_empty() {
        return SUPPORTED_LEVELS.to_vec();
    }
    SUPPORTED_LEVELS
        .iter()
        .copied()
        .filter(|level| requested.contains(level))
        .collect()
}
