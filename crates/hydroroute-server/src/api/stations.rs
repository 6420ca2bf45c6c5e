//! Station directory proxy and reverse-geocoding handlers.
//!
//! Browsing endpoints degrade instead of failing: an unreachable upstream
//! comes back as an empty result set with a warning in the log, so a typing
//! user sees "no matches" rather than an error page.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 20;
const SUGGESTION_LIMIT: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeQuery {
    pub lat: f64,
    pub lng: f64,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let keyword = query.keyword.trim();
    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);

    if keyword.is_empty() {
        return (StatusCode::OK, Json(empty_page(page, size)));
    }

    match state.directory().search_stations(keyword, page, size).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "total": result.total,
                "page": result.page,
                "size": result.size,
                "stations": result.stations,
            })),
        ),
        Err(err) => {
            tracing::warn!(keyword, "station search failed: {err:#}");
            (StatusCode::BAD_GATEWAY, Json(empty_page(page, size)))
        }
    }
}

pub async fn by_name(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> impl IntoResponse {
    let keyword = query.keyword.trim().to_string();
    if keyword.is_empty() {
        return (
            StatusCode::OK,
            Json(serde_json::json!({ "keyword": keyword, "rows": [] })),
        );
    }

    match state.directory().stations_by_name(&keyword).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(serde_json::json!({ "keyword": keyword, "rows": rows })),
        ),
        Err(err) => {
            tracing::warn!(keyword, "stations by-name failed: {err:#}");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "keyword": keyword, "rows": [] })),
            )
        }
    }
}

pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> impl IntoResponse {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        return (
            StatusCode::OK,
            Json(serde_json::json!({ "suggestions": [] })),
        );
    }

    match state.directory().suggestions(keyword, SUGGESTION_LIMIT).await {
        Ok(suggestions) => (
            StatusCode::OK,
            Json(serde_json::json!({ "suggestions": suggestions })),
        ),
        Err(err) => {
            tracing::warn!(keyword, "suggestions fetch failed: {err:#}");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "suggestions": [] })),
            )
        }
    }
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.directory().station_detail(&code).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("Station {code} not found") })),
        ),
        Err(err) => {
            tracing::warn!(code, "station detail fetch failed: {err:#}");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "message": "Station directory unavailable" })),
            )
        }
    }
}

/// Address label for a coordinate. `null` when the provider has no answer or
/// no key is configured.
pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> impl IntoResponse {
    if !hydroroute_core::models::LatLng::new(query.lat, query.lng).is_valid() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Coordinate out of range",
                "hint": "lat must be within [-90, 90], lng within [-180, 180]"
            })),
        );
    }

    match state.directory().reverse_geocode(query.lat, query.lng).await {
        Ok(address) => (StatusCode::OK, Json(serde_json::json!({ "address": address }))),
        Err(err) => {
            tracing::warn!(lat = query.lat, lng = query.lng, "reverse geocode failed: {err:#}");
            (StatusCode::OK, Json(serde_json::json!({ "address": null })))
        }
    }
}

fn empty_page(page: u64, size: u64) -> serde_json::Value {
    serde_json::json!({
        "total": 0,
        "page": page,
        "size": size,
        "stations": [],
    })
}
