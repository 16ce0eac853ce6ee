//! Hello-world producer.
//!
//! Publishes one `text/plain` message (default `Hello World!`, or the
//! command-line words) to the transient `hello` queue and exits.

use std::env;

use anyhow::Result;
use tracing::info;

use tutorials::queue::publish_once;
use tutorials::{body_from_args, telemetry, Config, OutboundMessage, QueueSpec};

#[tokio::main]
async fn main() {
    telemetry::init();

    telemetry::exit_on_error(run(Config::from_env()).await);
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let body = body_from_args(env::args().skip(1), "Hello World!");
    let message = OutboundMessage::text(body.clone());

    publish_once(
        &config.amqp_url,
        QueueSpec::hello(),
        &message,
        config.publish_timeout(),
    )
    .await?;

    info!(body = %body, " [x] Sent");
    Ok(())
}
