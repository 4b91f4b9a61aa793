//! Core data models for overlap analysis.

pub mod admin;
pub mod feature;
pub mod query;
pub mod result;

pub use admin::{adm_label, AdminCategory, SUPPORTED_LEVELS};
pub use feature::{AdminFeature, PropertyBag};
pub use query::{AreaUnit, LatLng, PointsError, QueryPolygon};
pub use result::{OverlapItems, OverlapResult};
