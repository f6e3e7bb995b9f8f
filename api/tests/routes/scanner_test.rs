#[cfg(test)]
mod tests {
    use crate::helpers::app::{CODE, EVENT};
    use crate::helpers::{TestApp, make_test_app, send_json};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    fn team_qr() -> String {
        json!({
            "type": "team",
            "event_id": EVENT,
            "registration_id": "REG-42",
            "team_name": "Byte Me",
            "leader": { "person_id": "P-1", "name": "Lin Wei", "enrollment_id": "u21001", "department": "CS" },
            "members": [
                { "person_id": "P-2", "name": "Sam Okoro", "department": "EE" },
                { "person_id": "P-3", "name": "Ana Ruiz", "department": "ME" }
            ]
        })
        .to_string()
    }

    async fn begin(t: &TestApp) -> Value {
        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session",
            Some(json!({ "event_slug": EVENT, "code": CODE, "volunteer_name": "Priya Shah" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json
    }

    async fn begin_at(t: &TestApp, location: &str) {
        begin(t).await;
        let (status, json) = send_json(
            &t.app,
            "PUT",
            "/api/scanner/session/location",
            Some(json!({ "location": location })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
    }

    #[tokio::test]
    async fn team_check_in_end_to_end() {
        let t = make_test_app().await;

        let session = begin(&t).await;
        assert_eq!(session["data"]["phase"], "authenticated");
        assert_eq!(session["data"]["venues"], json!(["Main Entrance", "Hall B"]));

        let (_, located) = send_json(
            &t.app,
            "PUT",
            "/api/scanner/session/location",
            Some(json!({ "location": "Main Entrance" })),
        )
        .await;
        assert_eq!(located["data"]["phase"], "active");
        assert_eq!(located["data"]["selected_location"], "Main Entrance");

        let (status, scanned) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan",
            Some(json!({ "raw": team_qr() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{scanned}");
        assert_eq!(scanned["data"]["present_count"], 0);
        assert_eq!(scanned["data"]["total_count"], 3);
        assert_eq!(scanned["data"]["registration"]["type"], "team");

        for person in ["P-1", "P-2"] {
            let (status, _) = send_json(
                &t.app,
                "POST",
                "/api/scanner/scan/toggle",
                Some(json!({ "person_id": person })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, status_json) = send_json(&t.app, "GET", "/api/scanner/status", None).await;
        assert_eq!(status_json["data"]["current"]["present_count"], 2);
        assert_eq!(status_json["data"]["current"]["total_count"], 3);

        let (status, saved) = send_json(&t.app, "POST", "/api/scanner/scan/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["message"], "Attendance saved");
        let record = &saved["data"]["record"];
        assert_eq!(record["sync_status"], "synced");
        assert_eq!(record["location"], "Main Entrance");
        assert_eq!(record["present_count"], 2);
        assert_eq!(record["snapshot"]["leader"]["attendance_status"], "present");
        assert_eq!(record["snapshot"]["members"][0]["attendance_status"], "present");
        assert_eq!(record["snapshot"]["members"][1]["attendance_status"], "pending");
        assert_eq!(record["snapshot"]["leader"]["marked_by"], "Priya Shah");

        let (_, after) = send_json(&t.app, "GET", "/api/scanner/status", None).await;
        assert!(after["data"]["current"].is_null());

        let (_, history) = send_json(&t.app, "GET", "/api/scanner/history", None).await;
        assert_eq!(history["data"].as_array().unwrap().len(), 1);

        let (_, stats) = send_json(&t.app, "GET", &format!("/api/events/{EVENT}/stats"), None).await;
        assert_eq!(stats["data"]["checked_in"], 2);
        assert_eq!(stats["data"]["active_volunteers"], 1);
    }

    #[tokio::test]
    async fn wrong_code_and_blank_name_are_bad_requests() {
        let t = make_test_app().await;

        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session",
            Some(json!({ "event_slug": EVENT, "code": "111-222", "volunteer_name": "Priya Shah" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid or expired access code");

        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session",
            Some(json!({ "event_slug": EVENT, "code": CODE, "volunteer_name": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Volunteer name is required");

        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session",
            Some(json!({ "event_slug": EVENT, "code": "", "volunteer_name": "Priya Shah" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Access code is required");
    }

    #[tokio::test]
    async fn scanning_without_a_session_requires_code_entry() {
        let t = make_test_app().await;
        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan",
            Some(json!({ "raw": team_qr() })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "No volunteer session found");
    }

    #[tokio::test]
    async fn scanning_before_choosing_a_location_is_rejected() {
        let t = make_test_app().await;
        begin(&t).await;
        let (status, _) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan",
            Some(json!({ "raw": team_qr() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(
            &t.app,
            "PUT",
            "/api/scanner/session/location",
            Some(json!({ "location": "Rooftop" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_qr_keeps_the_flow_open() {
        let t = make_test_app().await;
        begin_at(&t, "Hall B").await;

        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan",
            Some(json!({ "raw": "{\"type\":\"group\"}" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().starts_with("Malformed QR payload"));

        let (status, _) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan",
            Some(json!({ "raw": team_qr() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn toggling_needs_a_current_scan_and_a_known_person() {
        let t = make_test_app().await;
        begin_at(&t, "Main Entrance").await;

        let (status, _) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan/toggle",
            Some(json!({ "person_id": "P-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send_json(&t.app, "POST", "/api/scanner/scan", Some(json!({ "raw": team_qr() }))).await;
        let (status, _) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan/toggle",
            Some(json!({ "person_id": "P-99" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, reset) = send_json(&t.app, "DELETE", "/api/scanner/scan", None).await;
        assert_eq!(reset["data"]["discarded"], true);
        let (_, reset) = send_json(&t.app, "DELETE", "/api/scanner/scan", None).await;
        assert_eq!(reset["data"]["discarded"], false);
    }

    #[tokio::test]
    async fn offline_save_is_kept_and_synced_later() {
        let t = make_test_app().await;
        begin_at(&t, "Main Entrance").await;
        t.backend.set_offline(true);

        let (_, scanned) = send_json(
            &t.app,
            "POST",
            "/api/scanner/scan",
            Some(json!({ "raw": team_qr() })),
        )
        .await;
        assert_eq!(scanned["data"]["live_status"], "unavailable");
        send_json(
            &t.app,
            "POST",
            "/api/scanner/scan/toggle",
            Some(json!({ "person_id": "P-3" })),
        )
        .await;

        let (status, saved) = send_json(&t.app, "POST", "/api/scanner/scan/save", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["data"]["record"]["sync_status"], "failed");
        assert!(saved["data"]["warning"].is_string());

        let (_, status_json) = send_json(&t.app, "GET", "/api/scanner/status", None).await;
        assert_eq!(status_json["data"]["unsynced"], 1);

        t.backend.set_offline(false);
        let (status, synced) = send_json(&t.app, "POST", "/api/scanner/history/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(synced["data"]["synced"], 1);
        assert_eq!(synced["data"]["failed"], 0);

        let (_, history) = send_json(&t.app, "GET", "/api/scanner/history", None).await;
        assert_eq!(history["data"][0]["sync_status"], "synced");
    }

    #[tokio::test]
    async fn ended_session_cannot_be_resumed() {
        let t = make_test_app().await;
        begin_at(&t, "Main Entrance").await;

        let (status, resumed) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session/resume",
            Some(json!({ "event_slug": EVENT })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resumed["data"]["selected_location"], "Main Entrance");

        let (status, _) = send_json(&t.app, "DELETE", "/api/scanner/session", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session/resume",
            Some(json!({ "event_slug": EVENT })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
    }
}
