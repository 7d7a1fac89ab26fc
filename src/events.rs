//! Store-change notifications for the UI layer.
//!
//! Listeners subscribe explicitly instead of listening on a global bus: the
//! scheduler owns one `EventBus`, the admin dashboard (or a test) takes a
//! receiver and reacts to new-article counts.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Emitted once per pipeline run that touched the store.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyncEvent {
    /// How many articles the run added. Zero is a valid, reportable outcome.
    pub new_count: usize,
    /// True on the very first run after startup, so the UI can stay quiet
    /// instead of toasting "no news" over an empty store.
    pub first_run: bool,
    /// Set when the whole collection was cleared by an admin action.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cleared: bool,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: a bus with no subscribers is fine.
    pub fn emit(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(SyncEvent {
            new_count: 3,
            first_run: false,
            cleared: false,
        });
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.new_count, 3);
        assert!(!ev.first_run);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.emit(SyncEvent {
            new_count: 0,
            first_run: true,
            cleared: false,
        });
    }
}
