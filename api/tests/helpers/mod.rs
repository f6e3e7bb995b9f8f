pub mod app;
pub mod ws;

pub use app::{TestApp, make_test_app, send_json};
pub use ws::{connect_ws, spawn_server};
