//! RabbitMQ tutorials - hello world and work queues.
//!
//! This library provides shared modules for the four binaries:
//! - `send`: publishes one message to the `hello` queue
//! - `receive`: prints everything on `hello`, auto-acknowledged
//! - `new_task`: publishes one task to the durable `task_queue`
//! - `worker`: processes tasks with prefetch 1 and manual acknowledgment
//!
//! ## Architecture
//!
//! ```text
//! send     → hello      → receive
//! new_task → task_queue → worker (× N, fair dispatch)
//! ```

pub mod config;
pub mod consumer;
pub mod error;
pub mod queue;
pub mod session;
pub mod shutdown;
pub mod telemetry;
pub mod work;

// Re-export commonly used types
pub use config::Config;
pub use consumer::{ConsumerSettings, ConsumerTask, Handler, Received};
pub use error::{Error, Result};
pub use queue::{
    AckMode, ConsumeSpec, OutboundMessage, Publisher, QosSpec, QueueSpec, HELLO_QUEUE,
    TASK_QUEUE,
};
pub use session::Session;
pub use work::{Printer, TaskRunner};

/// Join command-line words into a message body, or fall back to `default`.
pub fn body_from_args<I>(args: I, default: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    let words: Vec<String> = args.into_iter().collect();
    if words.is_empty() {
        default.to_string()
    } else {
        words.join(" ")
    }
}
