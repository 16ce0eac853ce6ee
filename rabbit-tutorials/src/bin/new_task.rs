//! Work-queue producer.
//!
//! Publishes the command-line words (default `hello`) as one task on the
//! durable `task_queue`. Each `.` in the body costs a worker one work unit.
//!
//! Tasks are transient unless `TASK_PERSISTENT` is set: the queue survives a
//! broker restart, but transient messages in it do not.

use std::env;

use anyhow::Result;
use tracing::{info, warn};

use tutorials::queue::publish_once;
use tutorials::{body_from_args, telemetry, Config, OutboundMessage, QueueSpec};

#[tokio::main]
async fn main() {
    telemetry::init();

    telemetry::exit_on_error(run(Config::from_env()).await);
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let queue = QueueSpec::task();
    if queue.durable && !config.task_persistent {
        warn!(
            queue = %queue.name,
            "publishing transient messages to a durable queue; they are lost if the broker restarts"
        );
    }

    let body = body_from_args(env::args().skip(1), "hello");
    let message = OutboundMessage::text(body.clone()).persistent(config.task_persistent);

    publish_once(&config.amqp_url, queue, &message, config.publish_timeout()).await?;

    info!(body = %body, persistent = config.task_persistent, " [x] Sent");
    Ok(())
}
