//! HTTP handlers for the overlap endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use admin_overlap::models::PointsError;
use admin_overlap::{
    AnalysisError, AreaUnit, GeoKernel, LatLng, LocalAnalyzer, OverlapItems, RemoteAnalyzer,
};

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub local: LocalAnalyzer<GeoKernel>,
    pub remote: RemoteAnalyzer<GeoKernel>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/analyze-overlap-local-lao", post(local_handler))
        .route("/analyze-overlap", post(remote_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct LocalRequest {
    #[serde(default)]
    points: Option<Vec<LatLng>>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    levels: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteRequest {
    #[serde(default)]
    points: Option<Vec<LatLng>>,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    ts: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Maps analysis failures onto status codes and `{error, detail}` bodies.
pub struct ApiError(AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AnalysisError::InvalidPoints(PointsError::Malformed(
            rejection.body_text(),
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self.0 {
            AnalysisError::InvalidPoints(e) => (
                StatusCode::BAD_REQUEST,
                "Invalid polygon points".to_string(),
                Some(e.to_string()),
            ),
            AnalysisError::DatasetMissing { levels, hint } => {
                error!("No dataset for levels {:?}", levels);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Datasets not found".to_string(),
                    Some(hint),
                )
            }
            AnalysisError::Upstream { status, body } => {
                error!("Overpass answered with status {}", status);
                (StatusCode::BAD_GATEWAY, "Overpass error".to_string(), Some(body))
            }
            AnalysisError::Internal(detail) => {
                error!("Analysis failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    Some(detail),
                )
            }
        };

        (status, Json(ErrorBody { error, detail })).into_response()
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ts: chrono::Utc::now().to_rfc3339(),
    })
}

/// Rank ADM1/ADM2 features of the local datasets
async fn local_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LocalRequest>, JsonRejection>,
) -> Result<Json<OverlapItems>, ApiError> {
    let Json(request) = payload?;

    let points = request.points.unwrap_or_default();
    let unit = AreaUnit::from_param(request.unit.as_deref());
    let levels: Vec<u8> = request
        .levels
        .unwrap_or_default()
        .into_iter()
        .filter_map(|level| u8::try_from(level).ok())
        .collect();

    let items =
        tokio::task::spawn_blocking(move || state.local.analyze(&points, unit, &levels))
            .await
            .map_err(|e| AnalysisError::Internal(e.to_string()))??;

    Ok(Json(OverlapItems { items }))
}

/// Rank OSM administrative relations around the polygon
async fn remote_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RemoteRequest>, JsonRejection>,
) -> Result<Json<OverlapItems>, ApiError> {
    let Json(request) = payload?;

    let points = request.points.unwrap_or_default();
    let unit = AreaUnit::from_param(request.unit.as_deref());
    let items = state.remote.analyze(&points, unit).await?;

    Ok(Json(OverlapItems { items }))
}
