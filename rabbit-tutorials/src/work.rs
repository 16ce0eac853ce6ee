//! Delivery handlers for the two scenarios.
//!
//! `Printer` just logs the body. `TaskRunner` pretends each `.` in the body
//! is one unit of work and sleeps accordingly.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::info;

use crate::consumer::{Handler, Received};

/// The byte that marks one unit of simulated work.
pub const WORK_MARKER: u8 = b'.';

/// Number of work markers in a task body.
pub fn work_units(body: &[u8]) -> u32 {
    let count = body.iter().filter(|&&b| b == WORK_MARKER).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// How long a task body takes to "process". Saturates at `Duration::MAX`.
pub fn work_duration(body: &[u8], unit: Duration) -> Duration {
    unit.checked_mul(work_units(body)).unwrap_or(Duration::MAX)
}

/// Logs every message it receives.
#[derive(Debug, Clone, Default)]
pub struct Printer;

#[async_trait]
impl Handler for Printer {
    async fn handle(&self, message: Received<'_>) -> anyhow::Result<()> {
        info!(body = %String::from_utf8_lossy(message.body), "Received a message");
        Ok(())
    }
}

/// Simulates variable-length work, one `unit` per marker in the body.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    unit: Duration,
}

impl TaskRunner {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }
}

#[async_trait]
impl Handler for TaskRunner {
    async fn handle(&self, message: Received<'_>) -> anyhow::Result<()> {
        let body = message.body;
        let duration = work_duration(body, self.unit);

        info!(
            body = %String::from_utf8_lossy(body),
            work_units = work_units(body),
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            redelivered = message.redelivered,
            "Received a message"
        );

        sleep(duration).await;

        info!("Done");
        Ok(())
    }
}
