//! RabbitMQ via `lapin`.
//!
//! Both sides declare the durable topic exchange, so whichever service starts
//! first creates it. The publisher runs in confirm mode: `publish` returns
//! only after the broker acknowledged the message. The consumer acks after
//! the handler succeeded, so delivery is at-least-once.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, BasicRejectOptions, ConfirmSelectOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::message::Delivery;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{debug, error, info, instrument, warn};

use emoney_events::{
    BusError, EXCHANGE_NAME, HandleOutcome, InboundMessage, MessageBus, MessageHandler,
    OutboundMessage,
};

const PERSISTENT_DELIVERY: u8 = 2;
const CONSUMER_PREFETCH: u16 = 16;

async fn open_channel(url: &str) -> Result<(Connection, Channel), BusError> {
    let connection = Connection::connect(url, ConnectionProperties::default())
        .await
        .map_err(|e| BusError::Connection(e.to_string()))?;
    let channel = connection
        .create_channel()
        .await
        .map_err(|e| BusError::Connection(e.to_string()))?;

    channel
        .exchange_declare(
            EXCHANGE_NAME,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| BusError::Connection(e.to_string()))?;

    Ok((connection, channel))
}

/// Confirm-mode publisher on a single channel.
pub struct AmqpMessageBus {
    // Held so the channel's connection stays open for the bus's lifetime.
    _connection: Connection,
    channel: Channel,
}

impl core::fmt::Debug for AmqpMessageBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AmqpMessageBus")
            .field("channel_id", &self.channel.id())
            .finish_non_exhaustive()
    }
}

impl AmqpMessageBus {
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let (connection, channel) = open_channel(url).await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;

        info!(exchange = EXCHANGE_NAME, "amqp publisher ready");
        Ok(Self {
            _connection: connection,
            channel,
        })
    }
}

#[async_trait]
impl MessageBus for AmqpMessageBus {
    #[instrument(skip(self, message), fields(routing_key = message.routing_key), err)]
    async fn publish(&self, message: OutboundMessage) -> Result<(), BusError> {
        let properties = BasicProperties::default()
            .with_content_type(message.content_type.into())
            .with_delivery_mode(PERSISTENT_DELIVERY);

        let confirmation = self
            .channel
            .basic_publish(
                message.exchange,
                message.routing_key,
                BasicPublishOptions::default(),
                &message.body,
                properties,
            )
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?;

        if confirmation.is_nack() {
            return Err(BusError::Rejected(format!(
                "negative confirm for {}",
                message.routing_key
            )));
        }
        debug!("publish confirmed");
        Ok(())
    }
}

/// A durable queue bound to the domain exchange, drained into a
/// [`MessageHandler`].
pub struct AmqpConsumer {
    _connection: Connection,
    channel: Channel,
    queue: String,
}

impl core::fmt::Debug for AmqpConsumer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AmqpConsumer")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl AmqpConsumer {
    /// Declare `queue` (durable) and bind it to `routing_key`.
    pub async fn bind(url: &str, queue: &str, routing_key: &str) -> Result<Self, BusError> {
        let (connection, channel) = open_channel(url).await?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        channel
            .queue_bind(
                queue,
                EXCHANGE_NAME,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;
        channel
            .basic_qos(CONSUMER_PREFETCH, BasicQosOptions::default())
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;

        info!(queue, routing_key, "amqp consumer bound");
        Ok(Self {
            _connection: connection,
            channel,
            queue: queue.to_string(),
        })
    }

    /// Consume until `shutdown` resolves or the broker closes the stream.
    /// Any other end is an error; [`supervise`](super::supervise) restarts it.
    pub async fn run<H, S>(self, handler: Arc<H>, shutdown: S) -> Result<(), BusError>
    where
        H: MessageHandler + ?Sized,
        S: Future<Output = ()>,
    {
        let mut deliveries = self
            .channel
            .basic_consume(
                &self.queue,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(queue = %self.queue, "consumer stopping");
                    return Ok(());
                }
                next = deliveries.next() => match next {
                    Some(Ok(delivery)) => settle(handler.as_ref(), delivery).await?,
                    Some(Err(e)) => {
                        error!(queue = %self.queue, error = %e, "consumer stream failed");
                        return Err(BusError::Connection(e.to_string()));
                    }
                    None => {
                        warn!(queue = %self.queue, "consumer stream closed by broker");
                        return Ok(());
                    }
                },
            }
        }
    }
}

async fn settle<H>(handler: &H, delivery: Delivery) -> Result<(), BusError>
where
    H: MessageHandler + ?Sized,
{
    let message = InboundMessage {
        routing_key: delivery.routing_key.as_str().to_string(),
        body: delivery.data.clone(),
        redelivered: delivery.redelivered,
    };

    let result = match handler.handle(&message).await {
        HandleOutcome::Ack => delivery.ack(BasicAckOptions::default()).await,
        HandleOutcome::Requeue => {
            delivery
                .nack(BasicNackOptions {
                    requeue: true,
                    ..BasicNackOptions::default()
                })
                .await
        }
        HandleOutcome::Reject => {
            delivery
                .reject(BasicRejectOptions { requeue: false })
                .await
        }
    };
    result.map_err(|e| BusError::Connection(e.to_string()))
}
