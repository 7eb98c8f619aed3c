//! Typed publish/subscribe channel for world events.

use std::{collections::BTreeMap, fmt};

use bastion_core::Event;

/// Handle returned by [`EventBus::subscribe`] used to detach a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

type Handler = Box<dyn FnMut(&Event)>;

/// Fan-out of world events to presentation collaborators.
///
/// Subscribers receive events in the order the world emitted them and in
/// ascending subscription order within a single event.
#[derive(Default)]
pub struct EventBus {
    subscribers: BTreeMap<SubscriptionId, Handler>,
    next_id: u32,
}

impl EventBus {
    /// Creates a bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler invoked for every published event.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.subscribers.insert(id, Box::new(handler));
        id
    }

    /// Detaches a handler, reporting whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    pub(crate) fn publish(&mut self, events: &[Event]) {
        if self.subscribers.is_empty() {
            return;
        }
        for event in events {
            for handler in self.subscribers.values_mut() {
                handler(event);
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
