use api::{routes::routes, state::AppState, ws::ws_routes};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use db::test_utils::setup_test_db;
use serde_json::Value;
use services::backend::LocalBackend;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tower::util::BoxCloneService;

pub const EVENT: &str = "hackathon-2025";
pub const CODE: &str = "472-910";

pub struct TestApp {
    pub app: BoxCloneService<Request<Body>, Response, Infallible>,
    pub state: AppState,
    pub backend: Arc<LocalBackend>,
}

/// Router over a fresh in-memory store and a local backend whose current
/// code for [`EVENT`] is [`CODE`].
pub async fn make_test_app() -> TestApp {
    let db = setup_test_db().await;
    let backend = Arc::new(LocalBackend::new(
        Duration::from_secs(300),
        chrono::Duration::hours(2),
        vec!["Main Entrance".into(), "Hall B".into()],
    ));
    backend.seed_access_code(EVENT, CODE).await;

    let state = AppState::new(db, backend.clone());
    let router = Router::new()
        .nest("/api", routes(state.clone()))
        .nest("/ws", ws_routes(state.clone()))
        .with_state(state.clone());

    TestApp {
        app: router.into_service().boxed_clone(),
        state,
        backend,
    }
}

/// Sends one request and returns the status with the decoded JSON body.
pub async fn send_json(
    app: &BoxCloneService<Request<Body>, Response, Infallible>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
