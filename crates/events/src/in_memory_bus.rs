//! In-memory message bus for tests/dev.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc};

use async_trait::async_trait;

use crate::bus::{BusError, MessageBus, OutboundMessage};
use crate::handler::InboundMessage;

/// Records every published message and fans it out to subscribers.
///
/// - No IO
/// - `fail_publishes(true)` makes every publish fail, to exercise the
///   commit-succeeded/publish-failed path
#[derive(Debug, Default)]
pub struct InMemoryMessageBus {
    published: Mutex<Vec<OutboundMessage>>,
    subscribers: Mutex<Vec<mpsc::Sender<InboundMessage>>>,
    failing: AtomicBool,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_publishes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every message accepted so far, in publish order.
    pub fn published(&self) -> Vec<OutboundMessage> {
        self.published
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<InboundMessage> {
        let (tx, rx) = mpsc::channel();
        // A poisoned lock still yields a (silent) subscription.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, message: OutboundMessage) -> Result<(), BusError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BusError::Connection("in-memory bus set to fail".to_string()));
        }

        let inbound = InboundMessage {
            routing_key: message.routing_key.to_string(),
            body: message.body.clone(),
            redelivered: false,
        };

        self.published
            .lock()
            .map_err(|_| BusError::Publish("bus lock poisoned".to_string()))?
            .push(message);

        if let Ok(mut subs) = self.subscribers.lock() {
            // Drop any dead subscribers while publishing.
            subs.retain(|tx| tx.send(inbound.clone()).is_ok());
        }
        Ok(())
    }
}
