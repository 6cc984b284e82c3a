//! Consumer-side contract.

use async_trait::async_trait;

/// A message as received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub routing_key: String,
    pub body: Vec<u8>,
    /// Set by the broker when this is not the first delivery attempt.
    pub redelivered: bool,
}

/// What the consumer loop should tell the broker after handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Processed (or already processed earlier); drop it.
    Ack,
    /// Transient failure; deliver again later.
    Requeue,
    /// The message can never succeed (undecodable); drop without retry.
    Reject,
}

/// Handles one inbound message.
///
/// Delivery is at-least-once, so implementations must be idempotent:
/// handling the same message twice has the same effect as handling it once.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &InboundMessage) -> HandleOutcome;
}
