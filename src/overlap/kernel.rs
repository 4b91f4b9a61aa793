//! Geometry primitives used by the overlap engines.
//!
//! All coordinates are (lon, lat) degrees. Areas are spherical square meters
//! (Chamberlain & Duquette on the WGS84 equatorial radius).

use std::panic::{self, AssertUnwindSafe};

use geo::{
    BooleanOps, ChamberlainDuquetteArea, ConvexHull, Coord, Intersects, LineString,
    MultiPoint, MultiPolygon, Point, Polygon, RemoveRepeatedPoints, Validation,
};
use thiserror::Error;

/// Failure of a single geometry operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("ring has a non-finite coordinate")]
    NonFinite,

    #[error("ring has {0} coordinates after cleaning, at least 4 are required")]
    TooFewVertices(usize),

    #[error("repair produced an empty geometry")]
    Empty,

    #[error("{0} failed")]
    Aborted(&'static str),

    #[error("{0} produced a non-finite area")]
    NonFiniteArea(&'static str),
}

/// The operations the aggregator and the remote engine need.
///
/// `GeoKernel` is the production implementation; tests wrap it to inject failures.
pub trait GeometryKernel: Send + Sync {
    /// Remove repeated vertices and resolve self-intersections of a ring.
    fn repair(&self, ring: &LineString<f64>) -> Result<MultiPolygon<f64>, GeometryError>;

    fn area(&self, geometry: &MultiPolygon<f64>) -> f64;

    /// `Ok(None)` when the inputs do not overlap.
    fn intersect(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<Option<MultiPolygon<f64>>, GeometryError>;

    /// Mean of the ring vertices, each ring's closing vertex excluded.
    /// `None` when there are no vertices.
    fn centroid(&self, geometry: &MultiPolygon<f64>) -> Option<Point<f64>>;

    /// Boundary points count as inside.
    fn contains_point(&self, geometry: &MultiPolygon<f64>, point: &Point<f64>) -> bool;

    fn is_valid(&self, polygon: &Polygon<f64>) -> bool;

    /// `None` when there are fewer than 3 points.
    fn convex_hull(&self, coords: &[Coord<f64>]) -> Option<Polygon<f64>>;
}

/// Kernel backed by the `geo` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoKernel;

impl GeometryKernel for GeoKernel {
    fn repair(&self, ring: &LineString<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GeometryError::NonFinite);
        }

        let mut cleaned = ring.remove_repeated_points();
        cleaned.close();
        if cleaned.0.len() < 4 {
            return Err(GeometryError::TooFewVertices(cleaned.0.len()));
        }

        // Union with itself rebuilds the ring under the fill rule, which
        // splits bow-ties and drops zero-area spikes.
        let polygon = Polygon::new(cleaned, vec![]);
        let repaired = guarded("repair", || polygon.union(&polygon))?;

        if repaired.0.is_empty() {
            return Err(GeometryError::Empty);
        }
        Ok(repaired)
    }

    fn area(&self, geometry: &MultiPolygon<f64>) -> f64 {
        geometry.chamberlain_duquette_unsigned_area()
    }

    fn intersect(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<Option<MultiPolygon<f64>>, GeometryError> {
        let clipped = guarded("intersection", || a.intersection(b))?;

        if clipped.0.is_empty() {
            return Ok(None);
        }
        if !self.area(&clipped).is_finite() {
            return Err(GeometryError::NonFiniteArea("intersection"));
        }
        Ok(Some(clipped))
    }

    fn centroid(&self, geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
        let mut sum = Coord { x: 0.0, y: 0.0 };
        let mut count = 0usize;

        let rings = geometry
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
        for ring in rings {
            let coords = &ring.0;
            let open = match coords.len() {
                n if n > 1 && ring.is_closed() => &coords[..n - 1],
                _ => &coords[..],
            };
            for c in open {
                sum = sum + *c;
                count += 1;
            }
        }

        (count > 0).then(|| Point::from(sum / count as f64))
    }

    fn contains_point(&self, geometry: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
        geometry.intersects(point)
    }

    fn is_valid(&self, polygon: &Polygon<f64>) -> bool {
        polygon.is_valid()
    }

    fn convex_hull(&self, coords: &[Coord<f64>]) -> Option<Polygon<f64>> {
        if coords.len() < 3 {
            return None;
        }
        let points: MultiPoint<f64> = coords.iter().map(|c| Point::from(*c)).collect();
        Some(points.convex_hull())
    }
}

/// Run a clipping operation, turning a panic inside the boolean-ops backend into an error.
fn guarded<T>(op: &'static str, f: impl FnOnce() -> T) -> Result<T, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| GeometryError::Aborted(op))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn square(min_x: f64, min_y: f64, size: f64) -> LineString<f64> {
        LineString::from(vec![
            (min_x, min_y),
            (min_x + size, min_y),
            (min_x + size, min_y + size),
            (min_x, min_y + size),
            (min_x, min_y),
        ])
    }

    /// Delegates to `GeoKernel` but fails every intersection.
    pub(crate) struct FailingIntersect;

    impl GeometryKernel for FailingIntersect {
        fn repair(&self, ring: &LineString<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
            GeoKernel.repair(ring)
        }

        fn area(&self, geometry: &MultiPolygon<f64>) -> f64 {
            GeoKernel.area(geometry)
        }

        fn intersect(
            &self,
            _a: &MultiPolygon<f64>,
            _b: &MultiPolygon<f64>,
        ) -> Result<Option<MultiPolygon<f64>>, GeometryError> {
            Err(GeometryError::Aborted("intersection"))
        }

        fn centroid(&self, geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
            GeoKernel.centroid(geometry)
        }

        fn contains_point(&self, geometry: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
            GeoKernel.contains_point(geometry, point)
        }

        fn is_valid(&self, polygon: &Polygon<f64>) -> bool {
            GeoKernel.is_valid(polygon)
        }

        fn convex_hull(&self, coords: &[Coord<f64>]) -> Option<Polygon<f64>> {
            GeoKernel.convex_hull(coords)
        }
    }

    #[test]
    fn test_repair_square() {
        let repaired = GeoKernel.repair(&square(102.0, 18.0, 0.1)).unwrap();
        assert_eq!(repaired.0.len(), 1);
        assert!(GeoKernel.area(&repaired) > 0.0);
    }

    #[test]
    fn test_repair_drops_repeated_vertices() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]);
        let repaired = GeoKernel.repair(&ring).unwrap();
        let plain = GeoKernel.repair(&square(0.0, 0.0, 1.0)).unwrap();
        let expected = GeoKernel.area(&plain);
        assert!((GeoKernel.area(&repaired) - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn test_repair_bow_tie() {
        // Self-intersecting figure-eight crossing at (1, 1)
        let ring = LineString::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]);
        let repaired = GeoKernel.repair(&ring).unwrap();
        assert!(GeoKernel.area(&repaired) > 0.0);
    }

    #[test]
    fn test_repair_degenerate() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(
            GeoKernel.repair(&line),
            Err(GeometryError::TooFewVertices(3))
        );

        let collinear = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]);
        assert!(GeoKernel.repair(&collinear).is_err());

        let nan = LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(GeoKernel.repair(&nan), Err(GeometryError::NonFinite));
    }

    #[test]
    fn test_intersect_disjoint_is_none() {
        let a = GeoKernel.repair(&square(0.0, 0.0, 1.0)).unwrap();
        let b = GeoKernel.repair(&square(5.0, 5.0, 1.0)).unwrap();
        assert_eq!(GeoKernel.intersect(&a, &b), Ok(None));
    }

    #[test]
    fn test_intersect_inner_square() {
        let outer = GeoKernel.repair(&square(102.0, 18.0, 1.0)).unwrap();
        let inner = GeoKernel.repair(&square(102.2, 18.2, 0.1)).unwrap();
        let clipped = GeoKernel.intersect(&inner, &outer).unwrap().unwrap();
        let expected = GeoKernel.area(&inner);
        assert!((GeoKernel.area(&clipped) - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn test_contains_point_and_centroid() {
        let poly = GeoKernel.repair(&square(0.0, 0.0, 2.0)).unwrap();
        let centroid = GeoKernel.centroid(&poly).unwrap();
        assert!((centroid.x() - 1.0).abs() < 1e-9);
        assert!((centroid.y() - 1.0).abs() < 1e-9);
        assert!(GeoKernel.contains_point(&poly, &centroid));
        assert!(!GeoKernel.contains_point(&poly, &Point::new(3.0, 3.0)));
    }

    #[test]
    fn test_centroid_is_vertex_mean_of_concave_ring() {
        // L-shape: the area centroid would be (2.868, 2.868)
        let l_shape = LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 1.0),
            (1.0, 1.0),
            (1.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]);
        let poly = GeoKernel.repair(&l_shape).unwrap();
        let centroid = GeoKernel.centroid(&poly).unwrap();
        assert!((centroid.x() - 22.0 / 6.0).abs() < 1e-9);
        assert!((centroid.y() - 22.0 / 6.0).abs() < 1e-9);
        assert!(!GeoKernel.contains_point(&poly, &centroid));
    }

    #[test]
    fn test_centroid_of_empty_geometry() {
        assert!(GeoKernel.centroid(&MultiPolygon::new(vec![])).is_none());
    }

    #[test]
    fn test_convex_hull() {
        let coords = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 1.0, y: 0.5 },
            Coord { x: 1.0, y: 2.0 },
        ];
        let hull = GeoKernel.convex_hull(&coords).unwrap();
        assert!(GeoKernel.is_valid(&hull));
        assert_eq!(GeoKernel.convex_hull(&coords[..2]), None);
    }
}
