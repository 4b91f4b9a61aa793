//! Per-feature admin and overlap area aggregation over polygon parts.

use geo::{LineString, MultiPolygon, Point, Polygon};
use tracing::debug;

use super::{BoundingBox, GeometryKernel};
use crate::models::QueryPolygon;

/// What to do with a part whose intersection with the query cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// If the query centroid lies in the part, count the whole query area as
    /// overlap (taking the max with the running total, not adding). Can exceed
    /// the part's own area.
    #[default]
    CentroidUpperBound,
    /// Leave the running overlap untouched.
    Disabled,
}

/// The query polygon with everything the aggregator reuses across features.
#[derive(Debug, Clone)]
pub struct QueryGeometry {
    pub polygon: MultiPolygon<f64>,
    pub area: f64,
    pub centroid: Option<Point<f64>>,
    pub bbox: Option<BoundingBox>,
}

impl QueryGeometry {
    /// Repaired query geometry. Falls back to the raw ring when repair fails.
    pub fn repaired<K: GeometryKernel + ?Sized>(kernel: &K, query: &QueryPolygon) -> Self {
        let polygon = kernel.repair(query.ring()).unwrap_or_else(|e| {
            debug!("Query polygon repair failed, using it as drawn: {}", e);
            raw(query.ring().clone())
        });
        Self::from_polygon(kernel, polygon)
    }

    fn from_polygon<K: GeometryKernel + ?Sized>(kernel: &K, polygon: MultiPolygon<f64>) -> Self {
        Self {
            area: kernel.area(&polygon),
            centroid: kernel.centroid(&polygon),
            bbox: BoundingBox::of_multi_polygon(&polygon),
            polygon,
        }
    }
}

fn raw(ring: LineString<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![Polygon::new(ring, vec![])])
}

/// Aggregated areas of one feature, in square meters, plus part bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlap {
    pub admin_area: f64,
    pub overlap_area: f64,
    /// Parts that repaired and contributed admin area.
    pub parts_used: usize,
    /// Parts dropped because repair failed.
    pub parts_skipped: usize,
    /// Parts whose intersection failed and went through the fallback policy.
    pub intersection_failures: usize,
}

impl Overlap {
    /// Whether the feature should be ranked at all.
    pub fn is_positive(&self) -> bool {
        self.admin_area > 0.0 && self.overlap_area > 0.0
    }
}

/// Sum admin and overlap area of `parts` against the query.
///
/// Stateless: depends only on its arguments, so features can be processed
/// in any order or on any thread.
pub fn aggregate_overlap<K: GeometryKernel + ?Sized>(
    kernel: &K,
    policy: FallbackPolicy,
    query: &QueryGeometry,
    parts: &[LineString<f64>],
) -> Overlap {
    let mut overlap = Overlap::default();

    for ring in parts {
        let part = match kernel.repair(ring) {
            Ok(part) => part,
            Err(e) => {
                debug!("Skipping part: {}", e);
                overlap.parts_skipped += 1;
                continue;
            }
        };

        overlap.admin_area += kernel.area(&part);
        overlap.parts_used += 1;

        match kernel.intersect(&query.polygon, &part) {
            Ok(Some(clipped)) => overlap.overlap_area += kernel.area(&clipped),
            Ok(None) => {}
            Err(e) => {
                overlap.intersection_failures += 1;
                debug!("Intersection failed ({}), applying {:?}", e, policy);
                if policy == FallbackPolicy::CentroidUpperBound {
                    let inside = query
                        .centroid
                        .map(|c| kernel.contains_point(&part, &c))
                        .unwrap_or(false);
                    if inside {
                        overlap.overlap_area = overlap.overlap_area.max(query.area);
                    }
                }
            }
        }
    }

    overlap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLng;
    use crate::overlap::kernel::tests::{square, FailingIntersect};
    use crate::overlap::GeoKernel;

    fn query_square(min_lng: f64, min_lat: f64, size: f64) -> QueryPolygon {
        QueryPolygon::from_points(&[
            LatLng::new(min_lat, min_lng),
            LatLng::new(min_lat, min_lng + size),
            LatLng::new(min_lat + size, min_lng + size),
            LatLng::new(min_lat + size, min_lng),
        ])
        .unwrap()
    }

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() <= b.abs() * 1e-6
    }

    #[test]
    fn test_query_inside_single_part() {
        let query = QueryGeometry::repaired(&GeoKernel, &query_square(102.2, 18.2, 0.1));
        let parts = vec![square(102.0, 18.0, 1.0)];
        let overlap = aggregate_overlap(&GeoKernel, FallbackPolicy::default(), &query, &parts);

        assert!(close_to(overlap.overlap_area, query.area));
        assert!(overlap.overlap_area <= overlap.admin_area);
        assert_eq!(overlap.parts_used, 1);
        assert_eq!(overlap.intersection_failures, 0);
    }

    #[test]
    fn test_multipolygon_admin_area_is_sum_of_parts() {
        let query = QueryGeometry::repaired(&GeoKernel, &query_square(102.1, 18.1, 0.2));
        let a = square(102.0, 18.0, 0.5);
        let b = square(104.0, 19.0, 0.25);
        let expected = GeoKernel.area(&GeoKernel.repair(&a).unwrap())
            + GeoKernel.area(&GeoKernel.repair(&b).unwrap());

        let overlap = aggregate_overlap(&GeoKernel, FallbackPolicy::default(), &query, &[a, b]);

        assert_eq!(overlap.parts_used, 2);
        assert!(close_to(overlap.admin_area, expected));
        // Only the first part overlaps
        assert!(close_to(overlap.overlap_area, query.area));
    }

    #[test]
    fn test_overlap_bounded_without_fallback() {
        // Query straddles the part's east edge
        let query = QueryGeometry::repaired(&GeoKernel, &query_square(102.8, 18.4, 0.4));
        let parts = vec![square(102.0, 18.0, 1.0)];
        let overlap = aggregate_overlap(&GeoKernel, FallbackPolicy::default(), &query, &parts);

        assert!(overlap.is_positive());
        assert!(overlap.overlap_area <= query.area.min(overlap.admin_area));
        assert!(overlap.overlap_area < query.area * 0.6);
    }

    #[test]
    fn test_unrepairable_part_is_skipped() {
        let query = QueryGeometry::repaired(&GeoKernel, &query_square(102.2, 18.2, 0.1));
        let broken = LineString::from(vec![(102.0, 18.0), (103.0, 18.0), (102.0, 18.0)]);
        let good = square(102.0, 18.0, 1.0);
        let overlap = aggregate_overlap(
            &GeoKernel,
            FallbackPolicy::default(),
            &query,
            &[broken, good.clone()],
        );

        assert_eq!(overlap.parts_skipped, 1);
        assert_eq!(overlap.parts_used, 1);
        assert!(close_to(
            overlap.admin_area,
            GeoKernel.area(&GeoKernel.repair(&good).unwrap())
        ));
    }

    #[test]
    fn test_all_parts_broken_is_not_positive() {
        let query = QueryGeometry::repaired(&GeoKernel, &query_square(102.2, 18.2, 0.1));
        let broken = LineString::from(vec![(102.0, 18.0), (103.0, 18.0), (104.0, 18.0), (102.0, 18.0)]);
        let overlap = aggregate_overlap(&GeoKernel, FallbackPolicy::default(), &query, &[broken]);
        assert!(!overlap.is_positive());
        assert_eq!(overlap.admin_area, 0.0);
    }

    #[test]
    fn test_centroid_fallback_counts_whole_query() {
        let kernel = FailingIntersect;
        let query = QueryGeometry::repaired(&kernel, &query_square(102.2, 18.2, 0.1));
        let parts = vec![square(102.0, 18.0, 1.0)];
        let overlap = aggregate_overlap(&kernel, FallbackPolicy::CentroidUpperBound, &query, &parts);

        assert_eq!(overlap.intersection_failures, 1);
        assert_eq!(overlap.overlap_area, query.area);
    }

    #[test]
    fn test_centroid_fallback_can_exceed_admin_area() {
        // A small part holding the centroid of a much larger query
        let kernel = FailingIntersect;
        let query = QueryGeometry::repaired(&kernel, &query_square(102.0, 18.0, 1.0));
        let parts = vec![square(102.45, 18.45, 0.1)];
        let overlap = aggregate_overlap(&kernel, FallbackPolicy::CentroidUpperBound, &query, &parts);

        assert!(overlap.overlap_area > overlap.admin_area);
        assert!(overlap.overlap_area / overlap.admin_area * 100.0 > 100.0);
    }

    #[test]
    fn test_centroid_fallback_is_max_not_sum() {
        let kernel = FailingIntersect;
        let query = QueryGeometry::repaired(&kernel, &query_square(102.2, 18.2, 0.1));
        // Both parts contain the query centroid
        let parts = vec![square(102.0, 18.0, 1.0), square(102.1, 18.1, 0.5)];
        let overlap = aggregate_overlap(&kernel, FallbackPolicy::CentroidUpperBound, &query, &parts);

        assert_eq!(overlap.intersection_failures, 2);
        assert_eq!(overlap.overlap_area, query.area);
    }

    #[test]
    fn test_fallback_uses_vertex_mean_of_concave_query() {
        // L-shaped query whose vertex mean (3.67, 3.67) falls outside the L
        let kernel = FailingIntersect;
        let points = [(0.0, 0.0), (10.0, 0.0), (10.0, 1.0), (1.0, 1.0), (1.0, 10.0), (0.0, 10.0)]
            .iter()
            .map(|(x, y)| LatLng::new(*y, *x))
            .collect::<Vec<_>>();
        let query = QueryGeometry::repaired(&kernel, &QueryPolygon::from_points(&points).unwrap());

        let centroid = query.centroid.unwrap();
        assert!(close_to(centroid.x(), 22.0 / 6.0));
        assert!(close_to(centroid.y(), 22.0 / 6.0));

        // Holds the vertex mean but not the area centroid (2.868, 2.868)
        let parts = vec![square(3.5, 3.5, 0.5)];
        let overlap = aggregate_overlap(&kernel, FallbackPolicy::CentroidUpperBound, &query, &parts);
        assert_eq!(overlap.overlap_area, query.area);
    }

    #[test]
    fn test_fallback_needs_centroid_inside() {
        let kernel = FailingIntersect;
        let query = QueryGeometry::repaired(&kernel, &query_square(102.2, 18.2, 0.1));
        let parts = vec![square(105.0, 18.0, 1.0)];
        let overlap = aggregate_overlap(&kernel, FallbackPolicy::CentroidUpperBound, &query, &parts);
        assert_eq!(overlap.overlap_area, 0.0);
        assert!(!overlap.is_positive());
    }

    #[test]
    fn test_disabled_fallback() {
        let kernel = FailingIntersect;
        let query = QueryGeometry::repaired(&kernel, &query_square(102.2, 18.2, 0.1));
        let parts = vec![square(102.0, 18.0, 1.0)];
        let overlap = aggregate_overlap(&kernel, FallbackPolicy::Disabled, &query, &parts);

        assert_eq!(overlap.intersection_failures, 1);
        assert_eq!(overlap.overlap_area, 0.0);
        assert!(overlap.admin_area > 0.0);
        assert!(!overlap.is_positive());
    }

    #[test]
    fn test_deterministic() {
        let query = QueryGeometry::repaired(&GeoKernel, &query_square(102.8, 18.4, 0.4));
        let parts = vec![square(102.0, 18.0, 1.0), square(103.1, 18.5, 0.3)];
        let first = aggregate_overlap(&GeoKernel, FallbackPolicy::default(), &query, &parts);
        let second = aggregate_overlap(&GeoKernel, FallbackPolicy::default(), &query, &parts);
        assert_eq!(first, second);
    }
}
