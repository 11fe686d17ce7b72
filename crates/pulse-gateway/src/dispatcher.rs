use std::sync::Arc;

use tokio::sync::broadcast;

use pulse_types::events::StoreChange;

/// Fans store changes out to every connected client.
///
/// One broadcast channel, one change kind: any event or message mutation
/// invalidates every subscriber, and each connection refetches its own
/// visible list rather than patching.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<StoreChange>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to store changes. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Fire-and-forget: no connected clients is not an error.
    pub fn broadcast(&self, change: StoreChange) {
        let _ = self.inner.broadcast_tx.send(change);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_every_change() {
        let dispatcher = Dispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        dispatcher.broadcast(StoreChange::EventsChanged);

        assert_eq!(a.recv().await.unwrap(), StoreChange::EventsChanged);
        assert_eq!(b.recv().await.unwrap(), StoreChange::EventsChanged);
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_silent() {
        let dispatcher = Dispatcher::new();
        dispatcher.broadcast(StoreChange::EventsChanged);

        // A late subscriber only sees changes from after it joined.
        let mut late = dispatcher.subscribe();
        dispatcher.broadcast(StoreChange::EventsChanged);
        assert_eq!(late.recv().await.unwrap(), StoreChange::EventsChanged);
    }
}
