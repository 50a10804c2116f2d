//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::domain::{Coordinate, StationId};
use crate::lookup::{FixedLocation, LookupError, NearbyLookup};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", get(list_stations))
        .route("/stations/:id", get(get_station))
        .route("/closest-stations", get(closest_stations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Every station in the directory.
async fn list_stations(State(state): State<AppState>) -> Json<StationListResponse> {
    let stations = state.directory.snapshot().await;
    Json(StationListResponse {
        stations: stations.iter().map(StationResult::from).collect(),
    })
}

/// One station by id.
async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StationResult>, AppError> {
    let id = StationId::new(id);
    match state.directory.get(&id).await {
        Some(station) => Ok(Json(StationResult::from(&station))),
        None => Err(AppError::NotFound {
            message: format!("no station with id {id}"),
        }),
    }
}

/// Stations nearest a coordinate, nearest first.
async fn closest_stations(
    State(state): State<AppState>,
    query: Result<Query<ClosestStationsRequest>, QueryRejection>,
) -> Result<Json<ClosestStationsResponse>, AppError> {
    let Query(req) = query.map_err(|e| AppError::BadRequest {
        message: e.body_text(),
    })?;

    let (Some(lat), Some(lon)) = (req.lat, req.lon) else {
        return Err(AppError::BadRequest {
            message: "both lat and lon are required".to_string(),
        });
    };
    let origin = Coordinate::new(lat, lon).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;

    let lookup = NearbyLookup::new(
        Arc::new(FixedLocation::new(origin)),
        Arc::clone(&state.source),
        state.cache.clone(),
        state.lookup.clone(),
    );
    let nearby = lookup.refresh().await?;

    debug!(
        %origin,
        source = state.source.kind(),
        count = nearby.stations.len(),
        cached = nearby.is_cached(),
        "answered closest stations"
    );
    Ok(Json(ClosestStationsResponse::from(&*nearby)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// 400: the query itself is wrong
    BadRequest { message: String },
    NotFound { message: String },
    /// 503: no station data to answer from
    Unavailable { message: String },
    /// 502: the upstream failed or answered nonsense
    BadGateway { message: String },
    Internal { message: String },
}

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        let message = e.to_string();
        match e {
            LookupError::EmptyStationSet => AppError::Unavailable { message },
            LookupError::NetworkError(_) | LookupError::MalformedResponse(_) => {
                AppError::BadGateway { message }
            }
            // The location arrives with the request, so these mean a bug.
            LookupError::PermissionDenied
            | LookupError::LocationUnavailable(_)
            | LookupError::Superseded => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "rejected request");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
