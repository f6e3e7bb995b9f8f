//! A thread-safe WebSocket manager for topic-based message broadcasting.
//!
//! Uses Tokio broadcast channels per topic. The station publishes access-code
//! countdown events on `access_code:{event_id}` topics; kiosks and admin
//! screens subscribe through the `/ws` routes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Type alias for topic name.
type Topic = String;

/// Sender for a topic's broadcast channel.
type Sender = broadcast::Sender<String>;

/// Receiver for a topic's broadcast channel.
type Receiver = broadcast::Receiver<String>;

/// Manages broadcast channels per topic to support real-time WebSocket communication.
///
/// - Lazily creates broadcast channels per topic on first subscription
/// - Removes topics when their subscriber count drops to zero after sending
#[derive(Clone, Default)]
pub struct WebSocketManager {
    /// Map of topics to broadcast senders.
    pub inner: Arc<RwLock<HashMap<Topic, Sender>>>,
}

impl WebSocketManager {
    /// Creates a new, empty `WebSocketManager`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the given topic, creating it if necessary.
    pub async fn subscribe(&self, topic: &str) -> Receiver {
        let mut map = self.inner.write().await;
        map.entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(100).0)
            .subscribe()
    }

    /// Broadcasts a message to all subscribers of `topic`.
    ///
    /// If the topic does not exist, it's a no-op.
    /// If the topic has zero subscribers after sending, it is removed.
    pub async fn broadcast<T: Into<String>>(&self, topic: &str, msg: T) {
        let mut map = self.inner.write().await;
        if let Some(sender) = map.get(topic) {
            let _ = sender.send(msg.into());
            if sender.receiver_count() == 0 {
                tracing::debug!("Removing topic '{topic}' due to no subscribers.");
                map.remove(topic);
            }
        }
    }

    /// Number of live receivers on `topic` (zero when the topic does not exist).
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .read()
            .await
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}
