// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Subscriber fan-out.
//!
//! Ingestion publishes tracer changes, new events and high-severity
//! notifications through [`Subscribers`]. Publishing is fire-and-forget.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::NotificationConfig;
use crate::types::{Notification, Tracer, TracerEvent};

/// Default channel capacity for the broadcast fan-out
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SubscriberUpdate {
    /// Tracer watermark or first-event change
    Tracer(Tracer),
    Event(TracerEvent),
    /// Actionable finding (severity >= 2)
    Notification(Notification),
}

pub trait Subscribers: Send + Sync {
    fn publish(&self, update: SubscriberUpdate);
}

/// Broadcasts updates to every live receiver. Receivers that fall behind
/// lose the oldest updates; publishing never blocks ingestion.
pub struct BroadcastSubscribers {
    sender: broadcast::Sender<SubscriberUpdate>,
    capacity: usize,
    published: AtomicU64,
}

impl Default for BroadcastSubscribers {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastSubscribers {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::with_capacity(config.channel_capacity)
    }

    /// `capacity` is clamped to at least 1
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            published: AtomicU64::new(0),
        }
    }

    /// Updates a receiver may fall behind by before it starts losing them
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubscriberUpdate> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total updates published, whether or not anyone was listening
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Subscribers for BroadcastSubscribers {
    fn publish(&self, update: SubscriberUpdate) {
        self.published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(update) {
            Ok(count) => debug!("[Subscribers] Published update to {} subscribers", count),
            Err(_) => debug!("[Subscribers] No subscribers for update"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use tokio::time::{timeout, Duration};

    fn tracer() -> Tracer {
        Tracer {
            id: 1,
            marker: "zzMARKzz".to_string(),
            overall_severity: Severity::Low,
            has_events: true,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let subscribers = BroadcastSubscribers::new();
        subscribers.publish(SubscriberUpdate::Tracer(tracer()));
        assert_eq!(subscribers.published(), 1);
        assert_eq!(subscribers.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_and_receive() {
        let subscribers = BroadcastSubscribers::new();
        let mut rx = subscribers.subscribe();

        subscribers.publish(SubscriberUpdate::Tracer(tracer()));

        let update = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for update")
            .expect("Failed to receive update");
        assert_eq!(update, SubscriberUpdate::Tracer(tracer()));
    }

    #[tokio::test]
    async fn test_config_capacity_bounds_lag() {
        let config = NotificationConfig {
            channel_capacity: 2,
        };
        let subscribers = BroadcastSubscribers::from_config(&config);
        assert_eq!(subscribers.capacity(), 2);

        let mut rx = subscribers.subscribe();
        for _ in 0..3 {
            subscribers.publish(SubscriberUpdate::Tracer(tracer()));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert!(rx.recv().await.is_ok());
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_default_config_capacity() {
        let subscribers = BroadcastSubscribers::from_config(&NotificationConfig::default());
        assert_eq!(subscribers.capacity(), DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_update_wire_format() {
        let json = serde_json::to_value(SubscriberUpdate::Tracer(tracer())).unwrap();
        assert_eq!(json["type"], "tracer");
        assert_eq!(json["data"]["overall_severity"], 1);
    }
}
