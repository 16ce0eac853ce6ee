//! Producer side: declare a queue and publish to it with a deadline.
//!
//! A publisher owns its session. There is no reconnection and no retry; a
//! failed or late publish is returned to the caller as-is.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::info;

use super::types::{OutboundMessage, QueueSpec};
use crate::error::{Error, Result};
use crate::session::Session;

/// Publishes messages to one queue through the default exchange.
pub struct Publisher {
    session: Session,
    queue: QueueSpec,
    publish_timeout: Duration,
}

impl Publisher {
    /// Connect and declare the target queue.
    ///
    /// The declaration must match any existing queue of the same name.
    pub async fn connect(url: &str, queue: QueueSpec, publish_timeout: Duration) -> Result<Self> {
        let session = Session::open(url).await?;
        Self::with_session(session, queue, publish_timeout).await
    }

    /// Declare the target queue on an already open session.
    pub async fn with_session(
        session: Session,
        queue: QueueSpec,
        publish_timeout: Duration,
    ) -> Result<Self> {
        session.declare(&queue).await?;

        Ok(Self {
            session,
            queue,
            publish_timeout,
        })
    }

    pub fn queue(&self) -> &QueueSpec {
        &self.queue
    }

    /// Publish one message, routed by queue name.
    pub async fn publish(&self, message: &OutboundMessage) -> Result<()> {
        let queue = self.queue.name.as_str();

        within_deadline(queue, self.publish_timeout, self.session.publish(queue, message))
            .await?;

        info!(
            queue = queue,
            body_length = message.body.len(),
            persistent = message.persistent,
            "rabbitmq_message_published"
        );

        Ok(())
    }

    /// Close the channel and the connection.
    pub async fn close(self) {
        self.session.close().await;
    }
}

/// Run a publish, turning a missed deadline into `Error::PublishTimeout`.
async fn within_deadline<F>(queue: &str, limit: Duration, publish: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match timeout(limit, publish).await {
        Ok(result) => result,
        Err(_) => Err(Error::PublishTimeout {
            queue: queue.to_string(),
            timeout: limit,
        }),
    }
}

/// Connect, declare, publish a single message and disconnect.
pub async fn publish_once(
    url: &str,
    queue: QueueSpec,
    message: &OutboundMessage,
    publish_timeout: Duration,
) -> Result<()> {
    let publisher = Publisher::connect(url, queue, publish_timeout).await?;
    let result = publisher.publish(message).await;
    publisher.close().await;
    result
}
