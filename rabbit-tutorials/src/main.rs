//! Work-queue worker.
//!
//! Consumes tasks from the durable `task_queue` one at a time (prefetch 1),
//! sleeping one work unit per `.` in the body before acknowledging. Several
//! workers can share the queue; the broker hands each a new task only after
//! it acknowledged the previous one.

use anyhow::{Context, Result};
use tracing::info;

use tutorials::{consumer, telemetry, Config, ConsumerSettings, Session, TaskRunner};

#[tokio::main]
async fn main() {
    telemetry::init();

    info!("worker_starting");

    telemetry::exit_on_error(run(Config::from_env()).await);
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    info!(
        amqp_url = %config.redacted_url(),
        prefetch_count = config.prefetch_count,
        work_unit_ms = config.work_unit_ms,
        "config_loaded"
    );

    let session = Session::open(&config.amqp_url).await?;

    let settings = ConsumerSettings::task(config.prefetch_count, &config.consumer_tag);
    let task = consumer::start(&session, settings, TaskRunner::new(config.work_unit()))
        .await
        .context("worker setup failed")?;

    info!("worker_ready");

    let outcome = consumer::run_until_shutdown(task).await;
    session.close().await;
    outcome?;

    info!("worker_shutdown_complete");
    Ok(())
}
