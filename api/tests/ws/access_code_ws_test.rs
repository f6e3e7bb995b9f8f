#[cfg(test)]
mod tests {
    use crate::helpers::{connect_ws, make_test_app, send_json, spawn_server};
    use futures_util::StreamExt;
    use serde_json::Value;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::protocol::Message;

    async fn next_json<S>(ws: &mut S) -> Value
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for ws message")
                .expect("stream ended")
                .expect("ws error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn countdown_reaches_subscribers() {
        let t = make_test_app().await;
        let addr = spawn_server(t.app.clone()).await;

        let (status, started) = send_json(
            &t.app,
            "POST",
            "/api/events/robotics-expo/access-code/rotation",
            None,
        )
        .await;
        assert_eq!(status.as_u16(), 200);

        let (mut ws, _) = connect_ws(&addr.to_string(), "events/robotics-expo/access-code")
            .await
            .unwrap();

        let snapshot = next_json(&mut ws).await;
        assert_eq!(snapshot["event"], "access_code.tick");
        assert_eq!(snapshot["topic"], "access_code:robotics-expo");
        assert_eq!(snapshot["payload"]["code"], started["data"]["code"]);

        let tick = next_json(&mut ws).await;
        assert_eq!(tick["event"], "access_code.tick");
        assert!(tick["payload"]["remaining_seconds"].as_u64().unwrap() < 300);

        t.state.access_codes().stop_all().await;
    }

    #[tokio::test]
    async fn concurrent_starts_publish_each_tick_once() {
        let t = make_test_app().await;
        let addr = spawn_server(t.app.clone()).await;
        let uri = "/api/events/robotics-expo/access-code/rotation";

        let (a, b) = tokio::join!(
            send_json(&t.app, "POST", uri, None),
            send_json(&t.app, "POST", uri, None)
        );
        let mut messages = [a.1["message"].clone(), b.1["message"].clone()];
        messages.sort_by_key(|m| m.to_string());
        assert_eq!(messages, ["Rotation already running", "Rotation started"]);

        let (mut ws, _) = connect_ws(&addr.to_string(), "events/robotics-expo/access-code")
            .await
            .unwrap();
        let _snapshot = next_json(&mut ws).await;

        let mut seen = std::collections::HashMap::new();
        let deadline = tokio::time::Instant::now() + Duration::from_millis(2_500);
        while let Ok(event) = tokio::time::timeout_at(deadline, next_json(&mut ws)).await {
            if event["event"] == "access_code.tick" {
                let remaining = event["payload"]["remaining_seconds"].as_u64().unwrap();
                *seen.entry(remaining).or_insert(0u32) += 1;
            }
        }
        assert!(!seen.is_empty());
        assert!(seen.values().all(|&n| n == 1), "duplicate ticks: {seen:?}");

        t.state.access_codes().stop_all().await;
    }

    #[tokio::test]
    async fn manual_refresh_is_announced() {
        let t = make_test_app().await;
        let addr = spawn_server(t.app.clone()).await;

        let (mut ws, _) = connect_ws(&addr.to_string(), "events/robotics-expo/access-code")
            .await
            .unwrap();
        // Let the server subscribe before publishing.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let (_, refreshed) = send_json(
            &t.app,
            "POST",
            "/api/events/robotics-expo/access-code/refresh",
            None,
        )
        .await;

        let event = next_json(&mut ws).await;
        assert_eq!(event["event"], "access_code.rotated");
        assert_eq!(event["payload"]["reason"], "manual");
        assert_eq!(event["payload"]["code"], refreshed["data"]["code"]);
    }
}
