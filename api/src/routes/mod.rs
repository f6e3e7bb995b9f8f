//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe
//! - `/events/{event_id}` → gate codes, their rotation and live stats (admin screen)
//! - `/scanner` → the volunteer's scanning flow on this device

use crate::routes::{events::events_routes, health::health_routes, scanner::scanner_routes};
use crate::state::AppState;
use axum::Router;

pub mod common;
pub mod events;
pub mod health;
pub mod scanner;

/// Builds the router for every `/api` endpoint.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/events/{event_id}", events_routes(app_state.clone()))
        .nest("/scanner", scanner_routes(app_state.clone()))
        .with_state(app_state)
}
