//! Structured logging setup and the fatal-error exit path shared by all
//! binaries.

use std::fmt::Display;
use std::process;

use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured JSON logging, filtered by `RUST_LOG` (default `info`).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

/// Log a fatal error as a single event and exit with status 1.
///
/// Every setup, publish and consume failure ends the process this way.
pub fn exit_on_error<T, E>(result: Result<T, E>) -> T
where
    E: Display,
{
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal");
            process::exit(1);
        }
    }
}
