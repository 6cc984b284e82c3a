//! Domain-facing publisher for account events.

use async_trait::async_trait;
use tracing::{info, instrument};

use emoney_core::{AccountId, Email, ServiceError};

use crate::bus::{MessageBus, OutboundMessage};
use crate::event::AccountCreated;

/// What the account orchestrator needs from the event side.
#[async_trait]
pub trait AccountEventPublisher: Send + Sync {
    /// Publish `account.created`. Call only after the account row committed.
    async fn publish_account_created(
        &self,
        id: AccountId,
        name: &str,
        email: &Email,
    ) -> Result<(), ServiceError>;
}

/// [`AccountEventPublisher`] over any [`MessageBus`].
#[derive(Debug, Clone)]
pub struct BusAccountPublisher<B> {
    bus: B,
}

impl<B> BusAccountPublisher<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl<B> AccountEventPublisher for BusAccountPublisher<B>
where
    B: MessageBus,
{
    #[instrument(skip(self, name, email), fields(account_id = %id), err)]
    async fn publish_account_created(
        &self,
        id: AccountId,
        name: &str,
        email: &Email,
    ) -> Result<(), ServiceError> {
        let event = AccountCreated {
            id,
            name: name.to_string(),
            email: email.clone(),
        };
        let message = OutboundMessage::json(&event)?;

        info!(routing_key = message.routing_key, "publishing account created event");
        self.bus.publish(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::InMemoryMessageBus;

    #[tokio::test]
    async fn publishes_minimal_json_body() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let publisher = BusAccountPublisher::new(bus.clone());
        let id = AccountId::new();

        publisher
            .publish_account_created(id, "Alice", &Email::parse("alice@x.com").unwrap())
            .await
            .unwrap();

        let published = bus.published();
        let body: serde_json::Value = serde_json::from_slice(&published[0].body).unwrap();
        assert_eq!(body, serde_json::json!({"id": id.to_string(), "name": "Alice", "email": "alice@x.com"}));
        assert_eq!(published[0].content_type, "application/json");
    }

    #[tokio::test]
    async fn bus_failure_is_infrastructure_error() {
        let bus = Arc::new(InMemoryMessageBus::new());
        bus.fail_publishes(true);
        let publisher = BusAccountPublisher::new(bus);

        let err = publisher
            .publish_account_created(AccountId::new(), "Alice", &Email::parse("alice@x.com").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_infrastructure());
    }
}
