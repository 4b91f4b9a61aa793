//! Request-level errors of the analysis engines.

use thiserror::Error;

use crate::models::PointsError;
use crate::remote::OverpassError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The point list cannot form a query polygon. Nothing was computed.
    #[error("Invalid polygon points: {0}")]
    InvalidPoints(#[from] PointsError),

    /// None of the requested levels has a usable dataset.
    #[error("no administrative dataset available for levels {levels:?}")]
    DatasetMissing { levels: Vec<u8>, hint: String },

    /// The boundary index answered with a non-success status.
    #[error("boundary index returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    Internal(String),
}

impl From<OverpassError> for AnalysisError {
    fn from(e: OverpassError) -> Self {
        match e {
            OverpassError::Status { status, body } => AnalysisError::Upstream { status, body },
            other => AnalysisError::Internal(other.to_string()),
        }
    }
}
