//! `account.created` consumer: keeps the local account mirror in step with
//! the account service.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use emoney_events::{
    ACCOUNT_CREATED_ROUTING_KEY, AccountCreated, HandleOutcome, InboundMessage, MessageHandler,
};
use emoney_infra::TransactionStore;

#[derive(Debug, Clone)]
pub struct AccountCreatedHandler {
    store: TransactionStore,
}

impl AccountCreatedHandler {
    pub fn new(store: TransactionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageHandler for AccountCreatedHandler {
    async fn handle(&self, message: &InboundMessage) -> HandleOutcome {
        if message.routing_key != ACCOUNT_CREATED_ROUTING_KEY {
            warn!(routing_key = %message.routing_key, "unexpected routing key");
            return HandleOutcome::Reject;
        }

        let event: AccountCreated = match serde_json::from_slice(&message.body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "undecodable account.created payload");
                return HandleOutcome::Reject;
            }
        };

        match self
            .store
            .mirror_account(event.id, &event.name, &event.email)
            .await
        {
            Ok(true) => {
                info!(account_id = %event.id, "account mirrored");
                HandleOutcome::Ack
            }
            Ok(false) => {
                debug!(
                    account_id = %event.id,
                    redelivered = message.redelivered,
                    "account already mirrored"
                );
                HandleOutcome::Ack
            }
            Err(e) if e.is_infrastructure() => {
                warn!(account_id = %event.id, error = %e, "mirror failed, requeueing");
                HandleOutcome::Requeue
            }
            Err(e) => {
                warn!(account_id = %event.id, error = %e, "mirror rejected");
                HandleOutcome::Reject
            }
        }
    }
}
