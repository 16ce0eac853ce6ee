//! Broker session: one connection and one channel owned by the caller.
//!
//! Every binary opens exactly one session and passes it (or its channel)
//! to the component that needs it. Nothing here is process-global.

use lapin::{Channel, Connection, ConnectionProperties, Consumer, Queue};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::queue::{ConsumeSpec, OutboundMessage, QosSpec, QueueSpec};

/// Reply code for a normal channel or connection close.
const REPLY_SUCCESS: u16 = 200;

/// An open connection with a single channel on it.
pub struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    /// Connect to the broker and open a channel.
    pub async fn open(url: &str) -> Result<Self> {
        info!(url_length = url.len(), "rabbitmq_connecting");

        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(Error::Connect)?;

        info!("rabbitmq_connected");

        let channel = connection.create_channel().await.map_err(Error::Channel)?;

        info!(channel_id = channel.id(), "rabbitmq_channel_created");

        Ok(Self {
            connection,
            channel,
        })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Ensure the queue exists with exactly these parameters.
    pub async fn declare(&self, spec: &QueueSpec) -> Result<Queue> {
        let queue = self
            .channel
            .queue_declare(&spec.name, spec.declare_options(), spec.arguments.clone())
            .await
            .map_err(|cause| Error::Declare {
                queue: spec.name.clone(),
                cause,
            })?;

        info!(
            queue = queue.name().as_str(),
            durable = spec.durable,
            messages = queue.message_count(),
            consumers = queue.consumer_count(),
            "rabbitmq_queue_declared"
        );

        Ok(queue)
    }

    /// Limit how many unacknowledged deliveries the broker hands out.
    pub async fn qos(&self, spec: QosSpec) -> Result<()> {
        self.channel
            .basic_qos(spec.prefetch_count, spec.options())
            .await
            .map_err(Error::Qos)?;

        info!(
            prefetch_count = spec.prefetch_count,
            global = spec.global,
            "rabbitmq_qos_set"
        );

        Ok(())
    }

    /// Register a consumer and return its delivery stream.
    pub async fn subscribe(&self, spec: &ConsumeSpec) -> Result<Consumer> {
        let consumer = self
            .channel
            .basic_consume(
                &spec.queue,
                &spec.consumer_tag,
                spec.consume_options(),
                spec.arguments.clone(),
            )
            .await
            .map_err(|cause| Error::Consume {
                queue: spec.queue.clone(),
                cause,
            })?;

        info!(
            queue = %spec.queue,
            consumer_tag = consumer.tag().as_str(),
            ack_mode = ?spec.ack_mode,
            "rabbitmq_consumer_started"
        );

        Ok(consumer)
    }

    /// Publish through the default exchange, routed by queue name.
    ///
    /// Without publisher confirms this resolves once the frames are handed to
    /// the connection; callers bound it with a timeout.
    pub async fn publish(&self, queue: &str, message: &OutboundMessage) -> Result<()> {
        self.channel
            .basic_publish(
                "",
                queue,
                message.publish_options(),
                &message.body,
                message.properties(),
            )
            .await
            .map_err(|cause| Error::Publish {
                queue: queue.to_string(),
                cause,
            })?
            .await
            .map_err(|cause| Error::Publish {
                queue: queue.to_string(),
                cause,
            })?;

        Ok(())
    }

    /// Close the channel and then the connection.
    ///
    /// Close failures are logged; there is nothing left to do about them.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_channel_close_error");
        }

        if let Err(e) = self.connection.close(REPLY_SUCCESS, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }

        info!("rabbitmq_session_closed");
    }
}
