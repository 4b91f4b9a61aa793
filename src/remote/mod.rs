//! Remote fallback engine backed by the Overpass API.

mod engine;
mod overpass;
mod rings;

pub use engine::{rank_relations, RemoteAnalyzer};
pub use overpass::{
    is_in_query, GeomPoint, OverpassClient, OverpassElement, OverpassError, OverpassMember,
    OverpassResponse, DEFAULT_OVERPASS_URL,
};
pub use rings::{relation_ring, stitch_rings};
