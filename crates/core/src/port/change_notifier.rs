//! Change Notifier Port
//!
//! Fan-out of `WaitlistChanged` events to every observer of a queue
//! (participant view, owner dashboard, public queue list).
//!
//! Delivery is best-effort and at most once per send. There is no replay log:
//! a subscriber that connects after a publish misses it and must take a
//! snapshot to resynchronize. Events carry the queue version, so
//! [`WaitlistSubscription`] can discard out-of-order deliveries.

use crate::domain::{Version, WaitlistChanged};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Live stream of change events for one queue
pub type ChangeStream = BoxStream<'static, Arc<WaitlistChanged>>;

/// Default per-queue buffer of the in-process notifier
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Notifier interface (any pub/sub transport can implement it)
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Subscribe to subsequent events of one queue
    fn subscribe(&self, queue_id: &str) -> ChangeStream;

    /// Deliver an event to all current subscribers of the queue
    async fn publish(&self, queue_id: &str, event: Arc<WaitlistChanged>);
}

/// Subscriber-side version gate over a [`ChangeStream`]
///
/// Drops any event whose version is lower than or equal to the last one
/// observed. Call [`resync_from`](Self::resync_from) with the version of the
/// snapshot taken on connect.
pub struct WaitlistSubscription {
    stream: ChangeStream,
    last_seen: Option<Version>,
}

impl WaitlistSubscription {
    pub fn new(stream: ChangeStream) -> Self {
        Self {
            stream,
            last_seen: None,
        }
    }

    /// Treat everything up to and including `version` as already observed
    pub fn resync_from(&mut self, version: Version) {
        self.last_seen = Some(self.last_seen.map_or(version, |seen| seen.max(version)));
    }

    pub fn last_seen(&self) -> Option<Version> {
        self.last_seen
    }

    /// Returns true and records the version if the event is newer than anything seen
    pub fn observe(&mut self, event: &WaitlistChanged) -> bool {
        match self.last_seen {
            Some(seen) if event.version <= seen => false,
            _ => {
                self.last_seen = Some(event.version);
                true
            }
        }
    }

    /// Next in-order event, or `None` once the notifier side is gone
    pub async fn next(&mut self) -> Option<Arc<WaitlistChanged>> {
        while let Some(event) = self.stream.next().await {
            if self.observe(&event) {
                return Some(event);
            }
            debug!(
                queue_id = %event.queue_id,
                version = event.version,
                last_seen = ?self.last_seen,
                "Dropping stale waitlist event"
            );
        }
        None
    }
}

/// In-process notifier backed by one `tokio::sync::broadcast` channel per queue
///
/// - `publish()` never blocks; with no subscribers the event is dropped.
/// - Slow receivers skip what they missed (the next event carries the full list).
/// - Channels are created on first subscribe. A channel whose subscribers
///   are all gone is released by the next publish, subscribe or count.
pub struct BroadcastChangeNotifier {
    channels: Mutex<HashMap<String, broadcast::Sender<Arc<WaitlistChanged>>>>,
    capacity: usize,
}

impl BroadcastChangeNotifier {
    /// Creates a notifier with the given per-queue capacity (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of live subscribers of a queue
    pub fn subscriber_count(&self, queue_id: &str) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let count = channels
            .get(queue_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0);
        if count == 0 {
            channels.remove(queue_id);
        }
        count
    }
}

impl Default for BroadcastChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastChangeNotifier {
    fn subscribe(&self, queue_id: &str) -> ChangeStream {
        let rx = {
            let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
            // Sweep queues nobody listens to any more
            channels.retain(|_, tx| tx.receiver_count() > 0);
            channels
                .entry(queue_id.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };

        let queue_id = queue_id.to_string();
        futures::stream::unfold(rx, move |mut rx| {
            let queue_id = queue_id.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => return Some((event, rx)),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(
                                queue_id = %queue_id,
                                skipped = skipped,
                                "Subscriber lagged, skipping missed waitlist events"
                            );
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        })
        .boxed()
    }

    async fn publish(&self, queue_id: &str, event: Arc<WaitlistChanged>) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = channels.get(queue_id) else {
            debug!(queue_id = %queue_id, version = event.version, "No subscribers, event dropped");
            return;
        };

        match tx.send(event) {
            Ok(receivers) => {
                debug!(queue_id = %queue_id, receivers = receivers, "Waitlist event published");
            }
            Err(_) => {
                // Every receiver is gone
                channels.remove(queue_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeKind, WaitlistEntry};

    fn event(queue_id: &str, version: Version, participants: &[&str]) -> Arc<WaitlistChanged> {
        Arc::new(WaitlistChanged {
            queue_id: queue_id.to_string(),
            kind: ChangeKind::Joined,
            participant_id: participants.last().copied().unwrap_or("none").to_string(),
            reason: None,
            version,
            entries: participants
                .iter()
                .map(|p| WaitlistEntry::new(queue_id, *p, 0))
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let notifier = BroadcastChangeNotifier::default();
        let mut participant_view = WaitlistSubscription::new(notifier.subscribe("q1"));
        let mut owner_view = WaitlistSubscription::new(notifier.subscribe("q1"));
        assert_eq!(notifier.subscriber_count("q1"), 2);

        notifier.publish("q1", event("q1", 1, &["p1"])).await;

        assert_eq!(participant_view.next().await.unwrap().version, 1);
        assert_eq!(owner_view.next().await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_queues_are_isolated() {
        let notifier = BroadcastChangeNotifier::default();
        let mut q2 = notifier.subscribe("q2");

        notifier.publish("q1", event("q1", 1, &["p1"])).await;
        notifier.publish("q2", event("q2", 7, &["p9"])).await;

        let received = q2.next().await.unwrap();
        assert_eq!(received.queue_id, "q2");
        assert_eq!(received.version, 7);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let notifier = BroadcastChangeNotifier::default();
        notifier.publish("q1", event("q1", 1, &["p1"])).await;

        let mut late = WaitlistSubscription::new(notifier.subscribe("q1"));
        notifier.publish("q1", event("q1", 2, &["p1", "p2"])).await;

        assert_eq!(late.next().await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_stale_and_duplicate_versions_dropped() {
        let notifier = BroadcastChangeNotifier::default();
        let mut sub = WaitlistSubscription::new(notifier.subscribe("q1"));

        notifier.publish("q1", event("q1", 3, &["p1", "p2", "p3"])).await;
        notifier.publish("q1", event("q1", 2, &["p1", "p2"])).await;
        notifier.publish("q1", event("q1", 3, &["p1", "p2", "p3"])).await;
        notifier.publish("q1", event("q1", 4, &["p1", "p2", "p3", "p4"])).await;

        assert_eq!(sub.next().await.unwrap().version, 3);
        assert_eq!(sub.next().await.unwrap().version, 4);
        assert_eq!(sub.last_seen(), Some(4));
    }

    #[tokio::test]
    async fn test_resync_from_snapshot_version() {
        let notifier = BroadcastChangeNotifier::default();
        let mut sub = WaitlistSubscription::new(notifier.subscribe("q1"));

        // Snapshot taken after subscribing already reflects version 5
        sub.resync_from(5);
        notifier.publish("q1", event("q1", 5, &["p1"])).await;
        notifier.publish("q1", event("q1", 6, &["p1", "p2"])).await;

        assert_eq!(sub.next().await.unwrap().version, 6);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_to_latest() {
        let notifier = BroadcastChangeNotifier::new(2);
        let mut sub = WaitlistSubscription::new(notifier.subscribe("q1"));

        for version in 1..=5 {
            notifier.publish("q1", event("q1", version, &["p1"])).await;
        }

        // Only the two most recent events survive in the ring buffer
        assert_eq!(sub.next().await.unwrap().version, 4);
        assert_eq!(sub.next().await.unwrap().version, 5);
    }

    #[tokio::test]
    async fn test_channel_released_after_last_subscriber() {
        let notifier = BroadcastChangeNotifier::default();
        let stream = notifier.subscribe("q1");
        drop(stream);

        notifier.publish("q1", event("q1", 1, &["p1"])).await;
        assert_eq!(notifier.subscriber_count("q1"), 0);
        assert!(notifier.channels.lock().unwrap().get("q1").is_none());
    }

    #[tokio::test]
    async fn test_abandoned_channels_swept_without_publish() {
        let notifier = BroadcastChangeNotifier::default();
        drop(notifier.subscribe("q1"));
        drop(notifier.subscribe("q2"));

        // Subscribing elsewhere sweeps q1
        let _q3 = notifier.subscribe("q3");
        assert!(!notifier.channels.lock().unwrap().contains_key("q1"));

        // Counting releases an empty channel too
        drop(notifier.subscribe("q4"));
        assert_eq!(notifier.subscriber_count("q4"), 0);
        assert!(!notifier.channels.lock().unwrap().contains_key("q4"));

        assert_eq!(notifier.subscriber_count("q3"), 1);
        assert_eq!(notifier.channels.lock().unwrap().len(), 1);
    }
}
