use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use super::{
    EventBackend, GrantedSession, IssuedCode, LiveEventStats, PersonAttendance, RecordedScan,
};
use crate::error::ScanError;
use crate::qr_payload::RegistrationPayload;

/// `{ success, data, message }` wrapper used by the event service.
#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: String,
}

/// Why a call did not produce data.
enum CallError {
    /// The service answered with a non-success status or `success: false`.
    Rejected(StatusCode, String),
    /// Transport problem, timeout or undecodable body.
    Transport(String),
}

impl From<CallError> for ScanError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Rejected(status, msg) => {
                ScanError::NetworkFailure(format!("backend returned {status}: {msg}"))
            }
            CallError::Transport(msg) => ScanError::NetworkFailure(msg),
        }
    }
}

#[derive(Serialize)]
struct ValidateBody<'a> {
    event_slug: &'a str,
    code: &'a str,
    volunteer_name: &'a str,
}

#[derive(Serialize)]
struct ScanBody<'a> {
    location: &'a str,
    registration: &'a RegistrationPayload,
}

/// [`EventBackend`] over HTTP + JSON.
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScanError> {
        let base = Url::parse(base_url)
            .map_err(|e| ScanError::Internal(format!("invalid BACKEND_URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ScanError::Internal(format!(
                "invalid BACKEND_URL '{base_url}'"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, CallError> {
        let resp = req
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let envelope = serde_json::from_str::<Envelope<T>>(&body);
        if !status.is_success() {
            let msg = envelope.map(|e| e.message).unwrap_or(body);
            return Err(CallError::Rejected(status, msg));
        }

        let envelope = envelope.map_err(|e| {
            CallError::Transport(format!("error decoding response body: {e}"))
        })?;
        match (envelope.success, envelope.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(CallError::Transport("response carried no data".into())),
            (false, _) => Err(CallError::Rejected(status, envelope.message)),
        }
    }
}

/// Statuses with which the service turns down a gate code. A `success: false`
/// body on a 2xx counts too; everything else is a failed call.
fn rejects_code(status: StatusCode) -> bool {
    status.is_success()
        || matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        )
}

#[async_trait]
impl EventBackend for HttpBackend {
    async fn issue_access_code(&self, event_id: &str) -> Result<IssuedCode, ScanError> {
        let url = self.url(&["events", event_id, "access-code"]);
        Ok(self.call(self.client.post(url)).await?)
    }

    async fn refresh_access_code(&self, event_id: &str) -> Result<IssuedCode, ScanError> {
        let url = self.url(&["events", event_id, "access-code", "refresh"]);
        Ok(self.call(self.client.post(url)).await?)
    }

    async fn validate_access_code(
        &self,
        event_slug: &str,
        code: &str,
        volunteer_name: &str,
    ) -> Result<GrantedSession, ScanError> {
        let url = self.url(&["volunteer", "sessions"]);
        let body = ValidateBody {
            event_slug,
            code,
            volunteer_name,
        };
        match self.call(self.client.post(url).json(&body)).await {
            Ok(granted) => Ok(granted),
            Err(CallError::Rejected(status, msg)) if rejects_code(status) => {
                tracing::info!(%event_slug, %status, %msg, "access code rejected by backend");
                Err(ScanError::InvalidCode)
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn record_attendance_scan(
        &self,
        session_id: &str,
        location: &str,
        payload: &RegistrationPayload,
    ) -> Result<RecordedScan, ScanError> {
        let url = self.url(&["volunteer", "sessions", session_id, "scans"]);
        let body = ScanBody {
            location,
            registration: payload,
        };
        Ok(self.call(self.client.post(url).json(&body)).await?)
    }

    async fn get_live_event_stats(&self, event_id: &str) -> Result<LiveEventStats, ScanError> {
        let url = self.url(&["events", event_id, "live-stats"]);
        Ok(self.call(self.client.get(url)).await?)
    }

    async fn fetch_registration_attendance(
        &self,
        event_id: &str,
        registration_id: &str,
    ) -> Result<Vec<PersonAttendance>, ScanError> {
        let url = self.url(&[
            "events",
            event_id,
            "registrations",
            registration_id,
            "attendance",
        ]);
        Ok(self.call(self.client.get(url)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr_payload::QrPayloadDecoder;
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode as AxumStatus,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    async fn spawn_fake_backend() -> String {
        let app = Router::new()
            .route(
                "/api/events/{event_id}/access-code",
                post(|Path(event_id): Path<String>| async move {
                    Json(json!({
                        "success": true,
                        "data": { "code": "472-910", "expires_at": "2030-01-01T00:05:00Z" },
                        "message": format!("issued for {event_id}")
                    }))
                }),
            )
            .route(
                "/api/events/{event_id}/access-code/refresh",
                post(|| async {
                    (
                        AxumStatus::INTERNAL_SERVER_ERROR,
                        Json(json!({ "success": false, "data": null, "message": "boom" })),
                    )
                }),
            )
            .route(
                "/api/volunteer/sessions",
                post(|Json(body): Json<Value>| async move {
                    if body["code"] == "472-910" {
                        (
                            AxumStatus::OK,
                            Json(json!({
                                "success": true,
                                "data": {
                                    "session_id": "sess-1",
                                    "expires_at": "2030-01-01T02:00:00Z",
                                    "venues": ["Main Entrance", "Hall B"]
                                },
                                "message": "ok"
                            })),
                        )
                    } else {
                        (
                            AxumStatus::UNAUTHORIZED,
                            Json(json!({ "success": false, "data": null, "message": "bad code" })),
                        )
                    }
                }),
            )
            .route(
                "/api/volunteer/sessions/{session_id}/scans",
                post(|Path(session_id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({
                        "success": true,
                        "data": {
                            "scan_id": format!("{session_id}-{}", body["registration"]["registration_id"].as_str().unwrap_or("")),
                            "timestamp": "2030-01-01T00:10:00Z"
                        },
                        "message": "recorded"
                    }))
                }),
            )
            .route(
                "/api/events/{event_id}/live-stats",
                get(|| async { "this is not json" }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    #[tokio::test]
    async fn issue_and_validate_round_trip() {
        let base = spawn_fake_backend().await;
        let backend = HttpBackend::new(&base, Duration::from_secs(2)).unwrap();

        let issued = backend.issue_access_code("hackathon-2025").await.unwrap();
        assert_eq!(issued.code, "472-910");

        let granted = backend
            .validate_access_code("hackathon-2025", "472-910", "Priya Shah")
            .await
            .unwrap();
        assert_eq!(granted.session_id, "sess-1");
        assert_eq!(granted.venues, vec!["Main Entrance", "Hall B"]);
        assert!(granted.event_id.is_none());
    }

    #[tokio::test]
    async fn rejected_code_maps_to_invalid_code() {
        let base = spawn_fake_backend().await;
        let backend = HttpBackend::new(&base, Duration::from_secs(2)).unwrap();
        let err = backend
            .validate_access_code("hackathon-2025", "111-222", "Priya Shah")
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidCode));
    }

    async fn spawn_validate_stub(status: u16) -> String {
        let app = Router::new().route(
            "/api/volunteer/sessions",
            post(move || async move {
                let status = AxumStatus::from_u16(status).unwrap();
                (
                    status,
                    Json(json!({ "success": false, "data": null, "message": status.to_string() })),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    #[tokio::test]
    async fn validation_status_mapping() {
        let cases = [
            (200, true),
            (400, true),
            (401, true),
            (403, true),
            (404, false),
            (408, false),
            (429, false),
            (500, false),
            (503, false),
        ];
        for (status, invalid_code) in cases {
            let base = spawn_validate_stub(status).await;
            let backend = HttpBackend::new(&base, Duration::from_secs(2)).unwrap();
            let err = backend
                .validate_access_code("hackathon-2025", "472-910", "Priya Shah")
                .await
                .unwrap_err();
            if invalid_code {
                assert!(matches!(err, ScanError::InvalidCode), "{status}: {err:?}");
            } else {
                assert!(matches!(err, ScanError::NetworkFailure(_)), "{status}: {err:?}");
            }
        }
    }

    #[tokio::test]
    async fn server_errors_and_garbage_are_network_failures() {
        let base = spawn_fake_backend().await;
        let backend = HttpBackend::new(&base, Duration::from_secs(2)).unwrap();

        let err = backend.refresh_access_code("hackathon-2025").await.unwrap_err();
        assert!(matches!(err, ScanError::NetworkFailure(ref m) if m.contains("boom")));

        let err = backend.get_live_event_stats("hackathon-2025").await.unwrap_err();
        assert!(matches!(err, ScanError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn record_scan_posts_payload() {
        let base = spawn_fake_backend().await;
        let backend = HttpBackend::new(&base, Duration::from_secs(2)).unwrap();
        let payload = QrPayloadDecoder::decode(
            r#"{"type":"individual","event_id":"e","registration_id":"REG-9","person":{"person_id":"P","name":"Ada"}}"#,
        )
        .unwrap();

        let recorded = backend
            .record_attendance_scan("sess-1", "Main Entrance", &payload)
            .await
            .unwrap();
        assert_eq!(recorded.scan_id, "sess-1-REG-9");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let backend = HttpBackend::new("http://127.0.0.1:9/api/", Duration::from_millis(500)).unwrap();
        let err = backend.issue_access_code("e").await.unwrap_err();
        assert!(matches!(err, ScanError::NetworkFailure(_)));
    }

    #[test]
    fn url_segments_are_encoded() {
        let backend = HttpBackend::new("http://backend.local/api", Duration::from_secs(1)).unwrap();
        let url = backend.url(&["events", "spring fair/2025", "live-stats"]);
        assert_eq!(
            url.as_str(),
            "http://backend.local/api/events/spring%20fair%2F2025/live-stats"
        );
    }
}
