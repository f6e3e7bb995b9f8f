#[cfg(test)]
mod tests {
    use crate::helpers::app::EVENT;
    use crate::helpers::{make_test_app, send_json};
    use axum::http::StatusCode;

    fn is_gate_code(v: &serde_json::Value) -> bool {
        let code = v.as_str().unwrap_or_default();
        let parts: Vec<&str> = code.split('-').collect();
        parts.len() == 2
            && parts
                .iter()
                .all(|p| p.len() == 3 && p.bytes().all(|b| b.is_ascii_digit()) && !p.starts_with('0'))
    }

    #[tokio::test]
    async fn current_code_is_stable_until_refreshed() {
        let t = make_test_app().await;
        let uri = "/api/events/robotics-expo/access-code";

        let (status, first) = send_json(&t.app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(is_gate_code(&first["data"]["code"]));
        assert_eq!(first["data"]["event_id"], "robotics-expo");
        let remaining = first["data"]["remaining_seconds"].as_i64().unwrap();
        assert!((298..=300).contains(&remaining));

        let (_, again) = send_json(&t.app, "GET", uri, None).await;
        assert_eq!(again["data"]["code"], first["data"]["code"]);

        let (status, refreshed) =
            send_json(&t.app, "POST", "/api/events/robotics-expo/access-code/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(is_gate_code(&refreshed["data"]["code"]));

        let (_, after) = send_json(&t.app, "GET", uri, None).await;
        assert_eq!(after["data"]["code"], refreshed["data"]["code"]);
    }

    #[tokio::test]
    async fn issue_falls_back_when_backend_is_down() {
        let t = make_test_app().await;
        t.backend.set_offline(true);

        let (status, json) =
            send_json(&t.app, "POST", "/api/events/robotics-expo/access-code", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert!(is_gate_code(&json["data"]["code"]));
    }

    #[tokio::test]
    async fn issued_code_grants_a_session() {
        let t = make_test_app().await;
        let (_, issued) =
            send_json(&t.app, "POST", "/api/events/robotics-expo/access-code", None).await;
        let code = issued["data"]["code"].as_str().unwrap().to_owned();

        let (status, json) = send_json(
            &t.app,
            "POST",
            "/api/scanner/session",
            Some(serde_json::json!({
                "event_slug": "robotics-expo",
                "code": code.replace('-', ""),
                "volunteer_name": "Priya Shah"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["event_slug"], "robotics-expo");
    }

    #[tokio::test]
    async fn rotation_can_be_started_and_stopped() {
        let t = make_test_app().await;
        let uri = "/api/events/robotics-expo/access-code/rotation";

        let (status, json) = send_json(&t.app, "POST", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["running"], true);
        assert_eq!(json["message"], "Rotation started");

        let (_, again) = send_json(&t.app, "POST", uri, None).await;
        assert_eq!(again["message"], "Rotation already running");
        assert_eq!(again["data"]["code"], json["data"]["code"]);

        let (status, _) = send_json(&t.app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send_json(&t.app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn stats_reflect_saved_scans_and_fail_when_offline() {
        let t = make_test_app().await;
        let stats_uri = format!("/api/events/{EVENT}/stats");

        let (status, json) = send_json(&t.app, "GET", &stats_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_registrations"], 0);

        t.backend.set_offline(true);
        let (status, json) = send_json(&t.app, "GET", &stats_uri, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["success"], false);
        assert_eq!(json["data"]["checked_in"], 0);
    }
}
