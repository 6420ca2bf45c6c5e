//! REST API routes.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::{sessions, stations};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // Session lifecycle
        .route("/v1/sessions", post(sessions::create_session))
        .route("/v1/sessions/:session_id", get(sessions::get_session))
        .route("/v1/sessions/:session_id", delete(sessions::drop_session))
        // Stop-list edits
        .route("/v1/sessions/:session_id/stops", post(sessions::add_stop))
        .route(
            "/v1/sessions/:session_id/stops/order",
            put(sessions::reorder_stops),
        )
        .route(
            "/v1/sessions/:session_id/stops/:stop_id",
            delete(sessions::remove_stop),
        )
        .route(
            "/v1/sessions/:session_id/stops/:stop_id/keyword",
            put(sessions::set_stop_keyword),
        )
        .route(
            "/v1/sessions/:session_id/stops/:stop_id/place",
            put(sessions::apply_place),
        )
        // Route sequencing
        .route("/v1/sessions/:session_id/optimize", post(sessions::optimize))
        // Station directory proxy
        .route("/v1/stations/search", get(stations::search))
        .route("/v1/stations/by-name", get(stations::by_name))
        .route("/v1/stations/suggestions", get(stations::suggestions))
        .route("/v1/stations/:code", get(stations::detail))
        // Reverse geocoding
        .route("/v1/geocode/reverse", get(stations::reverse_geocode))
}
