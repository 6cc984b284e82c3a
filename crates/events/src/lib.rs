//! Integration events and the message-bus seam.
//!
//! Events are published after the store of record commits. Delivery is
//! at-least-once; consumers must be idempotent on the event's key.

pub mod bus;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod publisher;

pub use bus::{BusError, MessageBus, OutboundMessage};
pub use event::{ACCOUNT_CREATED_ROUTING_KEY, AccountCreated, EXCHANGE_NAME, IntegrationEvent};
pub use handler::{HandleOutcome, InboundMessage, MessageHandler};
pub use in_memory_bus::InMemoryMessageBus;
pub use publisher::{AccountEventPublisher, BusAccountPublisher};
