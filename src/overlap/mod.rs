//! Overlap ranking engine.
//!
//! Prefilters features by bounding box, aggregates admin and overlap area
//! over polygon parts, names each feature from its properties and ranks
//! the results by overlap percent.

mod aggregate;
mod bbox;
pub(crate) mod kernel;
mod local;
mod names;
mod rank;

pub use aggregate::{aggregate_overlap, FallbackPolicy, Overlap, QueryGeometry};
pub use bbox::BoundingBox;
pub use kernel::{GeoKernel, GeometryError, GeometryKernel};
pub use local::{analyze_feature, LocalAnalyzer};
pub use names::{resolve_name, sample_keys, NameSource, ResolvedName, NO_NAME};
pub use rank::{rank, Candidate, LOCAL_RESULT_LIMIT, REMOTE_RESULT_LIMIT};
