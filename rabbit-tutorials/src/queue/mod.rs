//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - Queue, QoS, consume and message parameters for both scenarios
//! - A producer that publishes through the default exchange
//!
//! ## Scenarios
//!
//! ```text
//! send     → hello      → receive   (transient, auto-ack)
//! new_task → task_queue → worker    (durable, prefetch 1, manual ack)
//! ```

pub mod publisher;
pub mod types;

pub use publisher::{publish_once, Publisher};
pub use types::{
    AckMode, ConsumeSpec, OutboundMessage, QosSpec, QueueSpec, HELLO_QUEUE,
    PERSISTENT_DELIVERY_MODE, TASK_QUEUE,
};
