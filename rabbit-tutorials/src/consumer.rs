//! RabbitMQ consumer module using lapin.
//!
//! A consumer declares its queue, optionally applies a prefetch limit,
//! registers with the broker and then drains deliveries on a dedicated task.
//! Deliveries are handled one at a time, in the order the broker sends them.
//!
//! Acknowledgments go through each delivery's own acker, so they always
//! travel on the channel that delivered the message.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions},
    Consumer,
};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::queue::{AckMode, ConsumeSpec, QosSpec, QueueSpec};
use crate::session::Session;
use crate::shutdown::shutdown_signal;

/// The parts of a delivery a handler gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received<'a> {
    pub body: &'a [u8],
    pub delivery_tag: u64,
    /// The broker handed this message out before and it was never acked.
    pub redelivered: bool,
}

impl<'a> Received<'a> {
    /// A first-time delivery of `body` with no tag.
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            body,
            delivery_tag: 0,
            redelivered: false,
        }
    }
}

/// Work performed for each delivered message.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, message: Received<'_>) -> anyhow::Result<()>;
}

/// Everything needed to set up one consumer.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub queue: QueueSpec,
    pub qos: Option<QosSpec>,
    pub consume: ConsumeSpec,
}

impl ConsumerSettings {
    /// Transient `hello` queue, auto-acknowledged, no prefetch limit.
    pub fn hello(consumer_tag: &str) -> Self {
        let queue = QueueSpec::hello();
        let consume =
            ConsumeSpec::new(queue.name.clone(), AckMode::Auto).consumer_tag(consumer_tag);

        Self {
            queue,
            qos: None,
            consume,
        }
    }

    /// Durable `task_queue`, manually acknowledged, limited prefetch.
    pub fn task(prefetch_count: u16, consumer_tag: &str) -> Self {
        let queue = QueueSpec::task();
        let consume =
            ConsumeSpec::new(queue.name.clone(), AckMode::Manual).consumer_tag(consumer_tag);

        Self {
            queue,
            qos: Some(QosSpec::per_consumer(prefetch_count)),
            consume,
        }
    }
}

/// What to tell the broker once a handler has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Auto-ack: the broker already forgot the message.
    AlreadySettled,
    Ack,
    Requeue,
}

/// Decide how to settle a delivery given the ack mode and handler outcome.
pub fn settle(ack_mode: AckMode, handled: bool) -> Settlement {
    match (ack_mode, handled) {
        (AckMode::Auto, _) => Settlement::AlreadySettled,
        (AckMode::Manual, true) => Settlement::Ack,
        (AckMode::Manual, false) => Settlement::Requeue,
    }
}

/// A running consumer task.
pub struct ConsumerTask {
    queue: String,
    handle: JoinHandle<Result<()>>,
}

impl ConsumerTask {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Stop consuming. Unacknowledged deliveries return to the queue once
    /// the channel closes.
    pub async fn stop(self) {
        self.handle.abort();
        match self.handle.await {
            Ok(Err(e)) => warn!(queue = %self.queue, error = %e, "consumer_task_error"),
            Err(e) if !e.is_cancelled() => {
                warn!(queue = %self.queue, error = %e, "consumer_task_panicked")
            }
            _ => {}
        }
        info!(queue = %self.queue, "consumer_stopped");
    }
}

/// Turn a finished consumer task into the error that ended it.
///
/// The delivery loop never returns `Ok` while the broker keeps the consumer
/// open, so a clean exit still means the consumer was closed.
fn task_error(queue: &str, joined: std::result::Result<Result<()>, JoinError>) -> Error {
    match joined {
        Ok(Err(e)) => e,
        Ok(Ok(())) => Error::ConsumerClosed(queue.to_string()),
        Err(e) => Error::ConsumerTask(e),
    }
}

/// Declare, apply QoS, register, and spawn the delivery loop.
///
/// The queue is declared by the consumer too, so it may start before any
/// producer has run.
pub async fn start<H: Handler>(
    session: &Session,
    settings: ConsumerSettings,
    handler: H,
) -> Result<ConsumerTask> {
    session.declare(&settings.queue).await?;

    if let Some(qos) = settings.qos {
        session.qos(qos).await?;
    }

    let consumer = session.subscribe(&settings.consume).await?;
    let queue = settings.consume.queue.clone();
    let ack_mode = settings.consume.ack_mode;

    let handle = tokio::spawn(drain(consumer, queue.clone(), ack_mode, handler));

    Ok(ConsumerTask { queue, handle })
}

/// Run a consumer until SIGINT/SIGTERM, or until it fails.
///
/// A consumer that stops on its own (connection lost, channel closed) is an
/// error; there is no reconnection.
pub async fn run_until_shutdown(mut task: ConsumerTask) -> Result<()> {
    info!(queue = %task.queue(), " [*] Waiting for messages. To exit press CTRL+C");

    let ended = tokio::select! {
        signal = shutdown_signal() => {
            signal?;
            None
        }
        joined = &mut task.handle => Some(joined),
    };

    match ended {
        None => {
            info!(queue = %task.queue(), "consumer_stopping");
            task.stop().await;
            Ok(())
        }
        Some(joined) => {
            let err = task_error(&task.queue, joined);
            error!(queue = %task.queue, error = %err, "consumer_task_ended");
            Err(err)
        }
    }
}

/// Handle deliveries sequentially until the stream ends or fails.
async fn drain<H: Handler>(
    mut consumer: Consumer,
    queue: String,
    ack_mode: AckMode,
    handler: H,
) -> Result<()> {
    while let Some(delivery) = consumer.next().await {
        let delivery = delivery.map_err(|cause| Error::Delivery {
            queue: queue.clone(),
            cause,
        })?;

        handle_delivery(&queue, ack_mode, &handler, delivery).await?;
    }

    warn!(queue = %queue, "rabbitmq_consumer_closed");
    Err(Error::ConsumerClosed(queue))
}

async fn handle_delivery<H: Handler>(
    queue: &str,
    ack_mode: AckMode,
    handler: &H,
    delivery: Delivery,
) -> Result<()> {
    let delivery_tag = delivery.delivery_tag;

    info!(
        queue = queue,
        delivery_tag = delivery_tag,
        redelivered = delivery.redelivered,
        body_length = delivery.data.len(),
        "rabbitmq_delivery_received"
    );

    let outcome = handler
        .handle(Received {
            body: &delivery.data,
            delivery_tag,
            redelivered: delivery.redelivered,
        })
        .await;
    if let Err(e) = &outcome {
        error!(
            queue = queue,
            delivery_tag = delivery_tag,
            ack_mode = ?ack_mode,
            error = %e,
            "handler_failed"
        );
    }

    match settle(ack_mode, outcome.is_ok()) {
        Settlement::AlreadySettled => {}
        Settlement::Ack => {
            delivery
                .acker
                .ack(BasicAckOptions::default())
                .await
                .map_err(|cause| Error::Ack {
                    delivery_tag,
                    cause,
                })?;

            info!(queue = queue, delivery_tag = delivery_tag, "rabbitmq_delivery_acked");
        }
        Settlement::Requeue => {
            delivery
                .acker
                .nack(BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                })
                .await
                .map_err(|cause| Error::Ack {
                    delivery_tag,
                    cause,
                })?;

            warn!(queue = queue, delivery_tag = delivery_tag, "rabbitmq_delivery_requeued");
        }
    }

    Ok(())
}
