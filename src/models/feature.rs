//! Administrative boundary features as loaded from a dataset.

use geo::{Coord, LineString};
use geojson::feature::Id;
use serde_json::Value;

use crate::overlap::BoundingBox;

/// Arbitrary feature properties, kept in the order they were parsed.
pub type PropertyBag = serde_json::Map<String, Value>;

/// One administrative boundary: optional id, property bag and its outer rings.
#[derive(Debug, Clone)]
pub struct AdminFeature {
    pub id: Option<Value>,
    pub properties: PropertyBag,
    /// Outer ring of every polygon part in (lon, lat). Holes are dropped.
    pub parts: Vec<LineString<f64>>,
    /// Extent of all part coordinates, `None` when there are no coordinates.
    pub bbox: Option<BoundingBox>,
}

impl AdminFeature {
    pub fn new(id: Option<Value>, properties: PropertyBag, parts: Vec<LineString<f64>>) -> Self {
        let bbox = BoundingBox::from_coords(parts.iter().flat_map(|ring| ring.coords().copied()));
        Self {
            id,
            properties,
            parts,
            bbox,
        }
    }

    /// Convert a GeoJSON feature. Geometries other than Polygon and MultiPolygon yield no parts.
    pub fn from_geojson(feature: geojson::Feature) -> Self {
        let id = feature.id.map(|id| match id {
            Id::String(s) => Value::String(s),
            Id::Number(n) => Value::Number(n),
        });

        let parts = match feature.geometry.map(|g| g.value) {
            Some(geojson::Value::Polygon(rings)) => {
                rings.first().map(|outer| vec![to_ring(outer)]).unwrap_or_default()
            }
            Some(geojson::Value::MultiPolygon(polygons)) => polygons
                .iter()
                .filter_map(|rings| rings.first())
                .map(|outer| to_ring(outer))
                .collect(),
            _ => Vec::new(),
        };

        Self::new(id, feature.properties.unwrap_or_default(), parts)
    }
}

fn to_ring(positions: &[geojson::Position]) -> LineString<f64> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect::<Vec<_>>()
        .into()
}
