//! Fan-out to every live subscription in this process.

use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};
use crate::event::Event;

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    #[error("subscriber list lock poisoned")]
    Poisoned,
}

/// One `mpsc` sender per subscriber. Publishing never blocks.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    senders: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().map_or(0, |senders| senders.len())
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Event> EventBus<M> for InMemoryEventBus<M> {
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut senders = self.senders.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        // A failed send means the subscription was dropped.
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        tracing::debug!(event = message.event_type(), listeners = senders.len(), "published");
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        match self.senders.lock() {
            Ok(mut senders) => senders.push(tx),
            Err(_) => tracing::warn!("subscriber list poisoned; subscription will stay silent"),
        }
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthEvent;
    use kasir_core::UserId;

    #[test]
    fn each_subscriber_gets_its_own_copy() {
        let bus = InMemoryEventBus::new();
        let till = bus.subscribe();
        let office = bus.subscribe();

        bus.publish(AuthEvent::signed_out()).unwrap();

        assert!(matches!(till.try_recv(), Ok(AuthEvent::SignedOut { .. })));
        assert!(matches!(office.try_recv(), Ok(AuthEvent::SignedOut { .. })));
    }

    #[test]
    fn subscribing_late_misses_history() {
        let bus = InMemoryEventBus::new();
        bus.publish(AuthEvent::signed_in(UserId::new())).unwrap();

        assert!(bus.subscribe().drain().is_empty());
    }

    #[test]
    fn drain_keeps_publish_order() {
        let bus = InMemoryEventBus::new();
        let sub = bus.subscribe();
        bus.publish(AuthEvent::signed_in(UserId::new())).unwrap();
        bus.publish(AuthEvent::signed_out()).unwrap();

        let kinds: Vec<_> = sub.drain().iter().map(|e| e.event_type()).collect();
        assert_eq!(kinds, ["auth.signed_in", "auth.signed_out"]);
    }

    #[test]
    fn dropped_subscriptions_are_forgotten() {
        let bus = InMemoryEventBus::<AuthEvent>::new();
        let _kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(AuthEvent::signed_out()).unwrap();
        assert_eq!(bus.subscriber_count(), 1);
    }
}
