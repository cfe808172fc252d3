//! Store change notifications.
//!
//! Writers publish a [`ChangeEvent`] after every successful batch write.
//! Delivery is best effort: with no subscribers the event is dropped, and a
//! subscriber that falls behind skips what it missed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Records inserted or updated on (platform, handle).
    Upsert,
    /// A platform's records were deleted and re-inserted.
    Replace,
    /// The empty store was filled with the built-in seed list.
    Seed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    /// `None` when the write spans several platforms.
    pub platform: Option<Platform>,
    pub kind: ChangeKind,
    pub count: u64,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(platform: Option<Platform>, kind: ChangeKind, count: u64) -> Self {
        Self {
            platform,
            kind,
            count,
            at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(
            "Publishing {:?} change event for {:?} ({} records)",
            event.kind,
            event.platform,
            event.count
        );
        // Err only means nobody is listening right now
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(ChangeEvent::new(Some(Platform::Youtube), ChangeKind::Replace, 100));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.platform, Some(Platform::Youtube));
        assert_eq!(event.kind, ChangeKind::Replace);
        assert_eq!(event.count, 100);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(ChangeEvent::new(None, ChangeKind::Seed, 15));
    }
}
