//! Rebuilding closed rings from Overpass relation geometry.

use geo::{Coord, LineString};

use super::overpass::{GeomPoint, OverpassElement};

/// Coordinates of a relation's boundary as a ring, closed if needed.
///
/// Uses the relation's inline `geometry` when present; otherwise stitches
/// its `outer` member ways and keeps the ring with the most vertices.
/// `None` when fewer than 3 points are available.
pub fn relation_ring(element: &OverpassElement) -> Option<Vec<Coord<f64>>> {
    let coords = match &element.geometry {
        Some(points) => to_coords(points),
        None => {
            let segments = element
                .members
                .iter()
                .filter(|m| m.member_type == "way" && (m.role == "outer" || m.role.is_empty()))
                .filter_map(|m| m.geometry.as_deref())
                .map(to_coords)
                .filter(|segment| segment.len() >= 2)
                .collect();
            stitch_rings(segments)
                .into_iter()
                .max_by_key(|ring| ring.0.len())
                .map(|ring| ring.0)?
        }
    };

    if coords.len() < 3 {
        return None;
    }
    Some(close(coords))
}

fn to_coords(points: &[GeomPoint]) -> Vec<Coord<f64>> {
    points.iter().map(|p| Coord { x: p.lon, y: p.lat }).collect()
}

fn close(mut coords: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    coords
}

/// Join way segments end to end into closed rings.
///
/// Segments are matched by shared endpoints in either direction. Chains that
/// cannot be closed are dropped.
pub fn stitch_rings(segments: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut rings = Vec::new();
    let mut pending = segments;

    while let Some(mut chain) = pending.pop() {
        while chain.first() != chain.last() {
            let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
                break;
            };

            let Some(i) = pending.iter().position(|s| {
                s.first() == Some(&tail)
                    || s.last() == Some(&tail)
                    || s.first() == Some(&head)
                    || s.last() == Some(&head)
            }) else {
                break;
            };

            let mut segment = pending.swap_remove(i);
            if segment.first() == Some(&tail) {
                chain.extend(segment.into_iter().skip(1));
            } else if segment.last() == Some(&tail) {
                segment.reverse();
                chain.extend(segment.into_iter().skip(1));
            } else if segment.last() == Some(&head) {
                segment.pop();
                segment.extend(chain);
                chain = segment;
            } else {
                segment.reverse();
                segment.pop();
                segment.extend(chain);
                chain = segment;
            }
        }

        if chain.len() >= 4 && chain.first() == chain.last() {
            rings.push(LineString::new(chain));
        }
    }

    rings
}
