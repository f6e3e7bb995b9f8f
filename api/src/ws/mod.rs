use axum::{Router, routing::get};

use crate::state::AppState;

pub mod access_code;

/// Websocket routes, mounted under `/ws`.
///
/// - `/events/{event_id}/access-code` → live countdown for the gate code
pub fn ws_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/access-code",
            get(access_code::access_code_ws_handler),
        )
        .with_state(app_state)
}
