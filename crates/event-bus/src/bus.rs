use tokio::sync::broadcast;
use tracing::trace;

use crate::event::OrchestratorEvent;

/// Default channel capacity; lagging subscribers miss the oldest
/// unconsumed events rather than unboundedly growing memory, matching
/// `tokio::sync::broadcast`'s built-in backpressure story.
const DEFAULT_CAPACITY: usize = 1_024;

/// Typed pub/sub over the six domain events. Subscribers must tolerate
/// duplicate delivery, matching `broadcast`'s at-least-once semantics.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers. Returns the number
    /// of subscribers it was delivered to. `0` is not an error, it just
    /// means nothing was listening.
    pub fn publish(&self, event: OrchestratorEvent) -> usize {
        trace!(event = event.name(), "publishing orchestrator event");
        self.sender.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_types::RunMode;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(OrchestratorEvent::TestRunStarted {
            run_id: "r1".into(),
            mode: RunMode::Parallel,
            networks: vec!["sepolia".into()],
            test_types: vec![],
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "test_run_started");
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive_the_event() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(OrchestratorEvent::NetworkStarted {
            run_id: "r1".into(),
            network_id: "sepolia".into(),
        });
        assert_eq!(a.recv().await.unwrap().name(), "network_started");
        assert_eq!(b.recv().await.unwrap().name(), "network_started");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_error() {
        let bus = EventBus::default();
        let delivered = bus.publish(OrchestratorEvent::NetworkStarted {
            run_id: "r1".into(),
            network_id: "sepolia".into(),
        });
        assert_eq!(delivered, 0);
    }
}
