//! Session and stop-list handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use hydroroute_core::models::{LatLng, ResolvedPlace, StopListError};

use crate::resolve;
use crate::state::{AppState, SessionError};

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaceRequest {
    pub name: String,
    pub position: LatLng,
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.create_session();
    tracing::info!(session = %session.session_id, "created planning session");
    (StatusCode::CREATED, Json(session))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    state
        .get_session(&session_id)
        .map(Json)
        .ok_or_else(|| session_error(SessionError::UnknownSession))
}

pub async fn drop_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    if state.drop_session(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_error(SessionError::UnknownSession))
    }
}

pub async fn add_stop(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session = state.add_stop(&session_id).map_err(session_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn remove_stop(
    State(state): State<Arc<AppState>>,
    Path((session_id, stop_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session = state
        .remove_stop(&session_id, &stop_id)
        .map_err(session_error)?;
    Ok(Json(session))
}

pub async fn reorder_stops(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session = state
        .reorder_stops(&session_id, &req.order)
        .map_err(session_error)?;
    Ok(Json(session))
}

/// Update a stop's keyword. Resolution runs in the background; the response
/// carries the stop with its previous resolution already cleared.
pub async fn set_stop_keyword(
    State(state): State<Arc<AppState>>,
    Path((session_id, stop_id)): Path<(String, String)>,
    Json(req): Json<KeywordRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let (session, request) = state
        .set_stop_keyword(&session_id, &stop_id, &req.keyword)
        .map_err(session_error)?;
    if let Some(request) = request {
        resolve::spawn_resolution(state.clone(), request);
    }
    Ok(Json(session))
}

/// Apply a picked suggestion with a known position, skipping resolution.
pub async fn apply_place(
    State(state): State<Arc<AppState>>,
    Path((session_id, stop_id)): Path<(String, String)>,
    Json(req): Json<PlaceRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if !req.position.is_valid() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Coordinate out of range",
                "hint": "lat must be within [-90, 90], lng within [-180, 180]"
            })),
        ));
    }
    if req.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Place name must not be blank"
            })),
        ));
    }

    let place = ResolvedPlace {
        name: req.name.trim().to_string(),
        coords: req.position,
    };
    let session = state
        .apply_suggestion(&session_id, &stop_id, place)
        .map_err(session_error)?;
    Ok(Json(session))
}

/// Run the sequencer. Guard outcomes come back as 200 with the untouched
/// list, so the client renders the message instead of branching on status.
pub async fn optimize(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let route = state.optimize(&session_id).map_err(session_error)?;
    Ok(Json(serde_json::json!({
        "stops": route.stops,
        "outcome": route.outcome,
        "message": route.outcome.message(),
    })))
}

fn session_error(err: SessionError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        SessionError::UnknownSession => StatusCode::NOT_FOUND,
        SessionError::Stops(StopListError::UnknownStop(_)) => StatusCode::NOT_FOUND,
        SessionError::Stops(StopListError::Full) => StatusCode::CONFLICT,
        SessionError::Stops(StopListError::FixedStop)
        | SessionError::Stops(StopListError::InvalidOrder) => StatusCode::BAD_REQUEST,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}
