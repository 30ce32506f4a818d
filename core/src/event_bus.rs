//! In-process publish/subscribe for pass events.
//!
//! Every subscriber owns a bounded queue. `publish` never waits: a full
//! queue loses that one delivery and the remaining subscribers are still
//! served. Owner scoping is left to the consumer (`SimEvent::visible_to`).

use crate::{event::SimEvent, types::OwnerId};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<SimEvent>,
}

/// The receiving end handed to a consumer. Dropping it unsubscribes
/// lazily on the next publish.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<SimEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<SimEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<SimEvent, TryRecvError> {
        self.rx.try_recv()
    }

    /// Wait for the next event visible to `owner`, skipping the rest.
    pub async fn recv_for(&mut self, owner: OwnerId) -> Option<SimEvent> {
        while let Some(event) = self.rx.recv().await {
            if event.visible_to(owner) {
                return Some(event);
            }
        }
        None
    }
}

/// Outcome of one `publish`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub dropped:   usize,
}

pub struct EventBus {
    capacity:    usize,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity:    capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        // Publishing holds the lock only for non-blocking sends, so a
        // poisoned list is still consistent.
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = SubscriberId(Uuid::new_v4());
        let mut subs = self.subscribers();
        subs.push(Subscriber { id, tx });
        log::debug!("event bus: subscriber {id} added (total={})", subs.len());
        Subscription { id, rx }
    }

    /// Remove a subscriber. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.subscribers();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        if subs.len() < before {
            log::debug!("event bus: subscriber {id} removed (total={})", subs.len());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Offer `event` to every subscriber without waiting.
    pub fn publish(&self, event: &SimEvent) -> Delivery {
        let mut report = Delivery::default();
        self.subscribers().retain(|sub| match sub.tx.try_send(event.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                log::warn!(
                    "event bus: dropped {} for slow subscriber {}",
                    event.type_name(),
                    sub.id
                );
                report.dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("event bus: subscriber {} went away, removing", sub.id);
                false
            }
        });
        report
    }
}
