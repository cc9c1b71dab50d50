// src/notify/hub.rs
//! Notifier hub: predicate-based event fan-out
//!
//! Subscribers register a [`Predicate`] and receive every subsequently
//! published event that matches it. Delivery is push-only and at-most-once:
//! no replay of events published before subscription, and a subscriber whose
//! buffer is full simply misses events instead of slowing the publisher.
//! Disconnected subscribers are pruned lazily on the next publish.

use crate::notify::event::SessionEvent;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Subscription filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every session's events (legacy broadcast behavior)
    All,
    /// Only events for one session
    Session(String),
}

impl Predicate {
    /// Whether an event passes this filter
    pub fn matches(&self, event: &SessionEvent) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Session(id) => event.session_id == *id,
        }
    }
}

/// Opaque subscriber identity, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// A live subscription handed back by [`NotifierHub::subscribe`]
pub struct Subscription {
    /// Identity for unsubscribe
    pub id: SubscriberId,

    /// Event stream; closed when the hub drops the subscriber
    pub receiver: mpsc::Receiver<SessionEvent>,
}

struct Subscriber {
    predicate: Predicate,
    sender: mpsc::Sender<SessionEvent>,
}

/// Fan-out hub between the session registry and observers
pub struct NotifierHub {
    subscribers: DashMap<SubscriberId, Subscriber>,
    next_id: AtomicU64,
    buffer: usize,
}

impl NotifierHub {
    /// Create a hub whose subscriber channels buffer `buffer` events
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer,
        }
    }

    /// Register a subscriber for events matching `predicate`
    pub fn subscribe(&self, predicate: Predicate) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.buffer);

        self.subscribers.insert(id, Subscriber { predicate, sender });
        debug!("Subscriber {:?} registered", id);

        Subscription { id, receiver }
    }

    /// Remove a subscriber; safe to call repeatedly
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            debug!("Subscriber {:?} removed", id);
        }
    }

    /// Deliver an event to every matching subscriber (at-most-once)
    pub fn publish(&self, event: &SessionEvent) {
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            if !entry.predicate.matches(event) {
                continue;
            }
            match entry.sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Slow observer: skip the event rather than block
                    trace!("Subscriber {:?} buffer full, event skipped", entry.key());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed.push(*entry.key());
                }
            }
        }

        for id in closed {
            debug!("Subscriber {:?} disconnected, pruning", id);
            self.subscribers.remove(&id);
        }
    }

    /// Current number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
