//! Event bus
//!
//! Lets callers observe what the audio manager does without polling it.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;

use super::events::AudioEvent;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<AudioEvent>,
}

#[derive(Default)]
struct Subscribers {
    list: Vec<Subscriber>,
    next_id: usize,
}

/// Broadcasts audio events to every subscriber.
///
/// Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<RwLock<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new unbounded receiver
    pub fn subscribe(&self) -> (Receiver<AudioEvent>, SubscriberId) {
        let (sender, receiver) = unbounded();

        let mut inner = self.inner.write();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        inner.list.push(Subscriber { id, sender });

        (receiver, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.write().list.retain(|s| s.id != id);
    }

    /// Send `event` to every subscriber without blocking
    pub fn publish(&self, event: AudioEvent) {
        let inner = self.inner.read();
        if inner.list.is_empty() {
            return;
        }

        tracing::trace!("Publishing: {}", event.description());
        for subscriber in &inner.list {
            // A closed receiver is not an error
            let _ = subscriber.sender.try_send(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.read().list.len()
    }

    /// Drop every subscriber
    pub fn clear(&self) {
        self.inner.write().list.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_subscribe() {
        let bus = EventBus::new();
        let (_rx, _id) = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_bus_unsubscribe() {
        let bus = EventBus::new();
        let (_rx, id) = bus.subscribe();
        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_publish() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();

        bus.publish(AudioEvent::SlotStarted {
            name: "Footsteps".to_string(),
            variant: 2,
        });

        match rx.try_recv().unwrap() {
            AudioEvent::SlotStarted { name, variant } => {
                assert_eq!(name, "Footsteps");
                assert_eq!(variant, 2);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new();
        let (rx1, _id1) = bus.subscribe();
        let (rx2, _id2) = bus.subscribe();

        bus.publish(AudioEvent::LevelLoaded { generation: 1 });

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_publish_to_dropped_receiver_is_ignored() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        drop(rx);

        bus.publish(AudioEvent::LevelLoaded { generation: 1 });
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_bus_clone() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let (_rx, _id) = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);

        bus2.clear();
        assert_eq!(bus1.subscriber_count(), 0);
    }
}
