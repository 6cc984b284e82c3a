//! RabbitMQ adapters for the event bus (publisher and consumer).

mod amqp;
mod supervisor;

pub use amqp::{AmqpConsumer, AmqpMessageBus};
pub use supervisor::{Backoff, stopped, supervise};

/// Durable queue the transaction service binds for account creations.
pub const ACCOUNT_CREATED_QUEUE: &str = "transaction_service.account_created";
