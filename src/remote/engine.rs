//! Overlap ranking against administrative relations fetched from Overpass.

use geo::{LineString, MultiPolygon, Polygon};
use hashbrown::HashSet;
use serde_json::Value;
use tracing::debug;

use super::overpass::{OverpassClient, OverpassElement};
use super::rings::relation_ring;
use crate::error::AnalysisError;
use crate::models::{AdminCategory, AreaUnit, LatLng, OverlapResult, QueryPolygon};
use crate::overlap::{
    rank, BoundingBox, Candidate, GeometryKernel, QueryGeometry, NO_NAME, REMOTE_RESULT_LIMIT,
};

/// Ranks the administrative relations around the query polygon's centroid.
pub struct RemoteAnalyzer<K> {
    kernel: K,
    client: OverpassClient,
}

impl<K: GeometryKernel + Clone + 'static> RemoteAnalyzer<K> {
    pub fn new(kernel: K, client: OverpassClient) -> Self {
        Self { kernel, client }
    }

    pub fn client(&self) -> &OverpassClient {
        &self.client
    }

    pub async fn analyze(
        &self,
        points: &[LatLng],
        unit: AreaUnit,
    ) -> Result<Vec<OverlapResult>, AnalysisError> {
        let query = QueryPolygon::from_points(points)?;
        let query = QueryGeometry::repaired(&self.kernel, &query);

        let centroid = query
            .centroid
            .ok_or_else(|| AnalysisError::Internal("query polygon has no centroid".to_string()))?;

        let elements = self
            .client
            .relations_containing(centroid.y(), centroid.x())
            .await?;

        // Clipping country-sized relations is CPU-bound
        let kernel = self.kernel.clone();
        tokio::task::spawn_blocking(move || rank_relations(&kernel, &query, &elements, unit))
            .await
            .map_err(|e| AnalysisError::Internal(e.to_string()))
    }
}

/// Score and rank Overpass relations against the query. Pure; no network.
pub fn rank_relations<K: GeometryKernel + ?Sized>(
    kernel: &K,
    query: &QueryGeometry,
    elements: &[OverpassElement],
    unit: AreaUnit,
) -> Vec<OverlapResult> {
    let mut seen = HashSet::new();
    let candidates: Vec<Candidate> = elements
        .iter()
        .filter(|e| e.is_relation() && e.tags.is_some())
        .filter_map(|e| {
            let candidate = relation_candidate(kernel, query, e)?;
            seen.insert(e.id).then_some(candidate)
        })
        .collect();

    debug!(
        "Remote overlap: {} elements, {} overlapping relations",
        elements.len(),
        candidates.len()
    );

    rank(candidates, unit, REMOTE_RESULT_LIMIT)
}

fn relation_candidate<K: GeometryKernel + ?Sized>(
    kernel: &K,
    query: &QueryGeometry,
    relation: &OverpassElement,
) -> Option<Candidate> {
    let coords = relation_ring(relation)?;
    if coords.len() < 4 {
        return None;
    }

    let mut polygon = Polygon::new(LineString::new(coords.clone()), vec![]);
    if !kernel.is_valid(&polygon) {
        if let Some(hull) = kernel.convex_hull(&coords) {
            debug!(
                "Relation {} is not a valid polygon, approximating with its convex hull",
                relation.id
            );
            polygon = hull;
        }
    }
    let admin = MultiPolygon::new(vec![polygon]);

    if let (Some(q), Some(a)) = (query.bbox, BoundingBox::of_multi_polygon(&admin)) {
        if !q.intersects(&a) {
            return None;
        }
    }

    let clipped = match kernel.intersect(&query.polygon, &admin) {
        Ok(Some(clipped)) => clipped,
        Ok(None) => return None,
        Err(e) => {
            debug!("Intersection with relation {} failed: {}", relation.id, e);
            return None;
        }
    };

    let admin_level = relation.tag("admin_level").unwrap_or_default();
    Some(Candidate {
        id: Some(Value::from(relation.id)),
        name: relation_name(relation),
        admin_level: admin_level.to_string(),
        label: AdminCategory::from_osm_tag(admin_level).label().to_string(),
        admin_area: kernel.area(&admin),
        overlap_area: kernel.area(&clipped),
    })
}

fn relation_name(relation: &OverpassElement) -> String {
    ["name", "name:en", "name:local"]
        .iter()
        .filter_map(|key| relation.tag(key))
        .find(|name| !name.is_empty())
        .unwrap_or(NO_NAME)
        .to_string()
}
