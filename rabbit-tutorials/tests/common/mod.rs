//! Shared helpers for broker-backed tests.
//!
//! Tests read `AMQP_URL` and fall back to a local guest broker. Every test
//! works on its own uniquely named queue and deletes it afterwards.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::{message::Delivery, options::QueueDeleteOptions, Consumer};
use tokio::sync::Mutex;
use tokio::time::timeout;

use tutorials::config::DEFAULT_AMQP_URL;
use tutorials::{Handler, Received, Session};

/// How long to wait before concluding that nothing is coming.
pub const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// How long to wait for a delivery that should arrive.
pub const DELIVERY_WAIT: Duration = Duration::from_secs(5);

pub fn amqp_url() -> String {
    std::env::var("AMQP_URL").unwrap_or_else(|_| DEFAULT_AMQP_URL.to_string())
}

pub fn unique_queue(prefix: &str) -> String {
    format!("test-{}-{}", prefix, uuid::Uuid::new_v4())
}

pub async fn open_session() -> Session {
    Session::open(&amqp_url())
        .await
        .expect("Failed to connect to RabbitMQ")
}

/// Next delivery within `wait`, or `None` if the broker sent nothing.
pub async fn next_delivery(consumer: &mut Consumer, wait: Duration) -> Option<Delivery> {
    match timeout(wait, consumer.next()).await {
        Ok(Some(Ok(delivery))) => Some(delivery),
        Ok(Some(Err(e))) => panic!("delivery error: {e}"),
        Ok(None) | Err(_) => None,
    }
}

/// Delete a test queue on a fresh session.
pub async fn delete_queue(name: &str) {
    let session = open_session().await;
    let _ = session
        .channel()
        .queue_delete(name, QueueDeleteOptions::default())
        .await;
    session.close().await;
}

/// Handler that remembers every delivery it was given.
#[derive(Clone, Default)]
pub struct Recorder {
    /// Body and redelivered flag, in arrival order.
    pub deliveries: Arc<Mutex<Vec<(Vec<u8>, bool)>>>,
}

impl Recorder {
    /// Wait until at least `count` deliveries arrived, or give up after `wait`.
    pub async fn wait_for_deliveries(
        &self,
        count: usize,
        wait: Duration,
    ) -> Vec<(Vec<u8>, bool)> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let deliveries = self.deliveries.lock().await.clone();
            if deliveries.len() >= count || tokio::time::Instant::now() >= deadline {
                return deliveries;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Bodies only, see `wait_for_deliveries`.
    pub async fn wait_for(&self, count: usize, wait: Duration) -> Vec<Vec<u8>> {
        self.wait_for_deliveries(count, wait)
            .await
            .into_iter()
            .map(|(body, _)| body)
            .collect()
    }
}

#[async_trait]
impl Handler for Recorder {
    async fn handle(&self, message: Received<'_>) -> anyhow::Result<()> {
        self.deliveries
            .lock()
            .await
            .push((message.body.to_vec(), message.redelivered));
        Ok(())
    }
}
