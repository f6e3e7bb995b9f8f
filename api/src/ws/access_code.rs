//! Access-code countdown over websockets.
//!
//! Topic `access_code:{event_id}` carries two events:
//! - `access_code.tick` once per second while rotation runs;
//! - `access_code.rotated` whenever a new code takes over.

use axum::{
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use services::access_code::{AccessCode, Countdown};
use tokio::sync::watch;
use util::ws::{WebSocketManager, emit};

use crate::state::AppState;

pub const TICK: &str = "access_code.tick";
pub const ROTATED: &str = "access_code.rotated";

pub fn access_code_topic(event_id: &str) -> String {
    format!("access_code:{event_id}")
}

#[derive(Debug, Serialize)]
pub struct TickPayload<'a> {
    pub event_id: &'a str,
    pub code: &'a str,
    pub remaining_seconds: u64,
    pub expires_at: String,
}

impl<'a> From<&'a Countdown> for TickPayload<'a> {
    fn from(c: &'a Countdown) -> Self {
        Self {
            event_id: &c.event_id,
            code: &c.code,
            remaining_seconds: c.remaining_seconds,
            expires_at: c.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RotatedPayload<'a> {
    pub event_id: &'a str,
    pub code: &'a str,
    pub expires_at: String,
    /// `automatic`, `manual` or `issued`.
    pub reason: &'a str,
}

pub async fn emit_rotated(ws: &WebSocketManager, code: &AccessCode, reason: &str) {
    let payload = RotatedPayload {
        event_id: &code.event_id,
        code: &code.code,
        expires_at: code.expires_at.to_rfc3339(),
        reason,
    };
    emit(ws, &access_code_topic(&code.event_id), ROTATED, &payload).await;
}

/// Republishes a rotation countdown on its websocket topic until the rotation stops.
pub fn spawn_countdown_forwarder(ws: WebSocketManager, mut rx: watch::Receiver<Countdown>) {
    tokio::spawn(async move {
        let mut rotations = rx.borrow().rotations;

        while rx.changed().await.is_ok() {
            let countdown = rx.borrow_and_update().clone();
            let topic = access_code_topic(&countdown.event_id);

            if countdown.rotations != rotations {
                rotations = countdown.rotations;
                let payload = RotatedPayload {
                    event_id: &countdown.event_id,
                    code: &countdown.code,
                    expires_at: countdown.expires_at.to_rfc3339(),
                    reason: "automatic",
                };
                emit(&ws, &topic, ROTATED, &payload).await;
            }
            emit(&ws, &topic, TICK, &TickPayload::from(&countdown)).await;
        }
        tracing::debug!("access code countdown forwarder finished");
    });
}

/// GET /ws/events/{event_id}/access-code
pub async fn access_code_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_countdown(socket, state, event_id))
}

async fn serve_countdown(socket: WebSocket, state: AppState, event_id: String) {
    let topic = access_code_topic(&event_id);
    let mut rx = state.ws().subscribe(&topic).await;
    let (mut sink, mut stream) = socket.split();

    // Late joiners get the current countdown straight away.
    if let Some(countdown) = state.access_codes().countdown(&event_id).await {
        let snapshot = countdown.borrow().clone();
        let envelope = serde_json::json!({
            "type": "event",
            "event": TICK,
            "topic": topic,
            "payload": TickPayload::from(&snapshot),
            "ts": Utc::now().to_rfc3339(),
        });
        if sink
            .send(Message::Text(envelope.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Ok(msg) => {
                    if sink.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(%topic, skipped, "ws subscriber lagged");
                }
                Err(_) => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) if is_app_ping(text.as_str()) => {
                    let pong = serde_json::json!({
                        "event": "pong",
                        "topic": topic,
                        "payload": {},
                        "ts": Utc::now().to_rfc3339(),
                    });
                    if sink.send(Message::Text(pong.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if sink.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("WS session ended for topic '{topic}'");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}
