//! `/api/events/{event_id}`: the admin side of the gate.
//!
//! - `GET    /access-code`           → current code (issued on demand)
//! - `POST   /access-code`           → issue a fresh code
//! - `POST   /access-code/refresh`   → manual rotation
//! - `POST   /access-code/rotation`  → start the one-second countdown task
//! - `DELETE /access-code/rotation`  → stop it
//! - `GET    /stats`                 → live dashboard numbers

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod common;
mod delete;
mod get;
mod post;

pub use common::{AccessCodeResponse, RotationResponse};
pub use delete::stop_rotation;
pub use get::{get_access_code, get_stats};
pub use post::{issue_access_code, refresh_access_code, start_rotation};

pub fn events_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/access-code",
            get(get_access_code).post(issue_access_code),
        )
        .route("/access-code/refresh", post(refresh_access_code))
        .route(
            "/access-code/rotation",
            post(start_rotation).delete(stop_rotation),
        )
        .route("/stats", get(get_stats))
        .with_state(app_state)
}
