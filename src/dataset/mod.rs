//! Administrative boundary datasets, one per level.
//!
//! Datasets are GeoJSON feature collections loaded on first use and then
//! shared read-only for the lifetime of the process.

mod cache;
mod index;
mod source;

pub use cache::DatasetCache;
pub use index::Dataset;
pub use source::{parse_dataset, DatasetError, DatasetSource, GeoJsonDirSource, StaticSource};
