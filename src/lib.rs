//! Admin overlap - ranks administrative regions by how much of them a
//! drawn polygon covers.
//!
//! This library provides the analysis engines shared by the server binary:
//! a local engine over ADM1/ADM2 GeoJSON datasets and a remote engine over
//! OpenStreetMap boundaries fetched from Overpass.

pub mod dataset;
pub mod error;
pub mod models;
pub mod overlap;
pub mod remote;

pub use error::AnalysisError;
pub use models::{AreaUnit, LatLng, OverlapItems, OverlapResult};
pub use overlap::{FallbackPolicy, GeoKernel, LocalAnalyzer};
pub use remote::RemoteAnalyzer;
