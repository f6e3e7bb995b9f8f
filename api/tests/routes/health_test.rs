#[cfg(test)]
mod tests {
    use crate::helpers::{make_test_app, send_json};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_is_public_and_ok() {
        let t = make_test_app().await;
        let (status, json) = send_json(&t.app, "GET", "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "OK");
    }
}
