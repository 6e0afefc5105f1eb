use tokio::sync::broadcast;
use tunebridge_core::ChangeEvent;

// Buffer 64 events. A subscriber that falls behind skips intermediate
// states and keeps receiving from the latest event.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out delivery of change events to every live subscriber.
///
/// Each realtime connection holds its own receiver, so one slow or
/// broken subscriber never blocks the others or the poller. Delivery is
/// best-effort: events published while nobody listens are dropped, and
/// a late joiner only sees events from its subscribe point onward.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event to all current subscribers. Non-blocking.
    pub fn publish(&self, event: ChangeEvent) {
        // A send error just means no subscribers right now.
        let _ = self.tx.send(event);
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
