//! API routes for the route-planning server.

pub mod sessions;
pub mod stations;
mod routes;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}
