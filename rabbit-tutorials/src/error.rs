//! Error types for broker setup, publishing and consumption.
//!
//! Every variant names the operation that failed and carries the underlying
//! cause in its message, so a single log line is enough to diagnose it.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to the broker.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to connect to RabbitMQ: {0}")]
    Connect(lapin::Error),

    #[error("Failed to open a channel: {0}")]
    Channel(lapin::Error),

    #[error("Failed to declare queue {queue}: {cause}")]
    Declare { queue: String, cause: lapin::Error },

    #[error("Failed to set QoS: {0}")]
    Qos(lapin::Error),

    #[error("Failed to register a consumer on {queue}: {cause}")]
    Consume { queue: String, cause: lapin::Error },

    #[error("Failed to publish a message to {queue}: {cause}")]
    Publish { queue: String, cause: lapin::Error },

    #[error("Publish to {queue} timed out after {timeout:?}")]
    PublishTimeout { queue: String, timeout: Duration },

    #[error("Failed to acknowledge delivery {delivery_tag}: {cause}")]
    Ack { delivery_tag: u64, cause: lapin::Error },

    #[error("Delivery stream error on {queue}: {cause}")]
    Delivery { queue: String, cause: lapin::Error },

    #[error("Consumer on {0} was closed by the broker")]
    ConsumerClosed(String),

    #[error("Consumer task failed: {0}")]
    ConsumerTask(#[from] tokio::task::JoinError),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
