//! Message publication abstraction (mechanics only).
//!
//! The bus sits after the store of record:
//!
//! ```text
//! Orchestrator → Store of record (commit) → MessageBus (publish) → Consumers
//! ```
//!
//! There is no shared transaction between the two. A publish that fails after
//! the commit leaves the record persisted and the event undelivered; a publish
//! that is retried may be delivered twice. Consumers therefore key on the
//! event's idempotency key.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use emoney_core::ServiceError;

use crate::event::{EXCHANGE_NAME, IntegrationEvent};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A serialized event addressed to an exchange and routing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub exchange: &'static str,
    pub routing_key: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl OutboundMessage {
    /// Serialize `event` as JSON onto the domain exchange under its routing key.
    pub fn json<E: IntegrationEvent>(event: &E) -> Result<Self, BusError> {
        let body =
            serde_json::to_vec(event).map_err(|e| BusError::Serialization(e.to_string()))?;
        Ok(Self {
            exchange: EXCHANGE_NAME,
            routing_key: E::ROUTING_KEY,
            content_type: JSON_CONTENT_TYPE,
            body,
        })
    }
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("publish failed: {0}")]
    Publish(String),

    /// The broker refused the message (negative publisher confirm).
    #[error("broker rejected message: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<BusError> for ServiceError {
    fn from(err: BusError) -> Self {
        ServiceError::infrastructure("event publish", err)
    }
}

/// Transport-agnostic publisher (RabbitMQ in production, in-memory in tests).
///
/// `publish` resolves only once the broker has taken responsibility for the
/// message. Implementations must be safe to share across request tasks.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, message: OutboundMessage) -> Result<(), BusError>;
}

#[async_trait]
impl<B> MessageBus for Arc<B>
where
    B: MessageBus + ?Sized,
{
    async fn publish(&self, message: OutboundMessage) -> Result<(), BusError> {
        (**self).publish(message).await
    }
}
