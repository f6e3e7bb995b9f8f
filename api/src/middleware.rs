use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

/// Logs method, path, peer address, user agent, status and latency of each
/// request. CORS preflight `OPTIONS` requests pass through unlogged.
///
/// ```ignore
/// use axum::{Router, middleware::from_fn};
/// use api::middleware::log_request;
///
/// let app = Router::new().layer(from_fn(log_request));
/// ```
pub async fn log_request(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    // Absent when the router is driven without a socket (tests).
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into());
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let started = Instant::now();
    let response = next.run(req).await;

    info!(
        method = ?method,
        path = %path,
        ip = %ip,
        user_agent = %user_agent,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}
