// Event delivery
// Callback subscribers plus channel-backed receivers for polling consumers

use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::types::InventoryEvent;

/// Subscriber callback type
pub type EventCallback = Arc<dyn Fn(&InventoryEvent) + Send + Sync>;

/// Handle returned by `EventBus::subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    callbacks: Vec<(SubscriptionId, EventCallback)>,
    senders: Vec<Sender<InventoryEvent>>,
}

/// Cloneable handle to a shared set of subscribers.
///
/// Events are delivered synchronously on the emitting thread, in emission
/// order. The subscriber list is snapshotted before callbacks run, so a
/// callback may subscribe, unsubscribe or emit without deadlocking.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback invoked for every event
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&InventoryEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.callbacks.len();
        subscribers.callbacks.retain(|(sub_id, _)| *sub_id != id);
        subscribers.callbacks.len() != before
    }

    /// Receive every subsequent event on an unbounded channel.
    /// Dropping the receiver ends the subscription.
    pub fn channel(&self) -> Receiver<InventoryEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.lock().senders.push(tx);
        rx
    }

    pub fn emit(&self, event: InventoryEvent) {
        log::trace!("Emitting {}", event.name());

        let callbacks: Vec<EventCallback> = {
            let mut subscribers = self.lock();
            subscribers
                .senders
                .retain(|tx| tx.send(event.clone()).is_ok());
            subscribers
                .callbacks
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };

        for callback in callbacks {
            callback(&event);
        }
    }
}
