//! Hello-world consumer.
//!
//! Prints every message on the transient `hello` queue. Deliveries are
//! auto-acknowledged, so a message is gone from the broker the moment it is
//! sent here.

use anyhow::{Context, Result};
use tracing::info;

use tutorials::{consumer, telemetry, Config, ConsumerSettings, Printer, Session};

#[tokio::main]
async fn main() {
    telemetry::init();

    telemetry::exit_on_error(run(Config::from_env()).await);
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    info!(amqp_url = %config.redacted_url(), "config_loaded");

    let session = Session::open(&config.amqp_url).await?;

    let task = consumer::start(&session, ConsumerSettings::hello(&config.consumer_tag), Printer)
        .await
        .context("receiver setup failed")?;

    let outcome = consumer::run_until_shutdown(task).await;
    session.close().await;
    outcome?;

    Ok(())
}
