//! User-drawn query polygons and area units.

use geo::{Coord, LineString};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single vertex of a user-drawn polygon, as sent by the map client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Reasons a point list cannot become a query polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PointsError {
    #[error("at least 3 points are required, got {0}")]
    TooFew(usize),

    #[error("point {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("at least 3 distinct points are required, got {0}")]
    NotEnoughDistinct(usize),

    #[error("malformed request body: {0}")]
    Malformed(String),
}

/// A validated, implicitly closed query ring in (lon, lat) order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPolygon {
    ring: LineString<f64>,
}

impl QueryPolygon {
    /// Validate the points and close the ring by re-appending the first point.
    pub fn from_points(points: &[LatLng]) -> Result<Self, PointsError> {
        if points.len() < 3 {
            return Err(PointsError::TooFew(points.len()));
        }

        if let Some(index) = points
            .iter()
            .position(|p| !p.lat.is_finite() || !p.lng.is_finite())
        {
            return Err(PointsError::NonFinite { index });
        }

        let mut coords: Vec<Coord<f64>> = points
            .iter()
            .map(|p| Coord { x: p.lng, y: p.lat })
            .collect();

        let distinct: HashSet<(u64, u64)> = coords
            .iter()
            .map(|c| (normalized_bits(c.x), normalized_bits(c.y)))
            .collect();
        if distinct.len() < 3 {
            return Err(PointsError::NotEnoughDistinct(distinct.len()));
        }

        coords.push(coords[0]);

        Ok(Self {
            ring: LineString::new(coords),
        })
    }

    /// The closed ring, first coordinate repeated at the end.
    pub fn ring(&self) -> &LineString<f64> {
        &self.ring
    }
}

/// Bit pattern for hashing, with `-0.0` folded into `0.0`.
fn normalized_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Output unit for reported areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AreaUnit {
    #[default]
    #[serde(rename = "m2")]
    SquareMeters,
    #[serde(rename = "km2")]
    SquareKilometers,
}

impl AreaUnit {
    /// Parse the request's `unit` field. Anything other than `km2` means square meters.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("km2") => AreaUnit::SquareKilometers,
            _ => AreaUnit::SquareMeters,
        }
    }

    /// Convert an area given in square meters into this unit.
    pub fn convert(self, square_meters: f64) -> f64 {
        match self {
            AreaUnit::SquareMeters => square_meters,
            AreaUnit::SquareKilometers => square_meters / 1_000_000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => "m²",
            AreaUnit::SquareKilometers => "km²",
        }
    }
}
