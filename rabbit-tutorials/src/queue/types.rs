//! Queue, QoS, consume and message parameters for the two scenarios.
//!
//! This module defines the broker-facing settings for:
//! - `hello` queue: transient, auto-acknowledged
//! - `task_queue` queue: durable, prefetch 1, manually acknowledged

use lapin::{
    options::{BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties,
};

/// Queue name for the hello-world scenario.
pub const HELLO_QUEUE: &str = "hello";

/// Queue name for the work-queue scenario.
pub const TASK_QUEUE: &str = "task_queue";

/// AMQP delivery mode for messages the broker writes to disk.
pub const PERSISTENT_DELIVERY_MODE: u8 = 2;

// =============================================================================
// Queue Declaration
// =============================================================================

/// Parameters for declaring a queue.
///
/// Redeclaring with identical parameters is a no-op on the broker; any
/// difference against an existing queue is refused.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub exclusive: bool,
    pub no_wait: bool,
    pub arguments: FieldTable,
}

impl QueueSpec {
    /// A transient queue with default flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: false,
            auto_delete: false,
            exclusive: false,
            no_wait: false,
            arguments: FieldTable::default(),
        }
    }

    /// The hello-world queue.
    pub fn hello() -> Self {
        Self::new(HELLO_QUEUE)
    }

    /// The durable task queue shared by all workers.
    pub fn task() -> Self {
        Self::new(TASK_QUEUE).durable(true)
    }

    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn auto_delete(mut self, auto_delete: bool) -> Self {
        self.auto_delete = auto_delete;
        self
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn arguments(mut self, arguments: FieldTable) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn declare_options(&self) -> QueueDeclareOptions {
        QueueDeclareOptions {
            passive: false,
            durable: self.durable,
            exclusive: self.exclusive,
            auto_delete: self.auto_delete,
            nowait: self.no_wait,
        }
    }
}

// =============================================================================
// Quality of Service
// =============================================================================

/// Prefetch limit for a channel.
///
/// `global = false` applies the limit to each consumer on the channel,
/// `true` to the channel as a whole. Prefetch size is always unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosSpec {
    pub prefetch_count: u16,
    pub global: bool,
}

impl QosSpec {
    /// One unacknowledged delivery per consumer, for fair dispatch.
    pub fn fair_dispatch() -> Self {
        Self::per_consumer(1)
    }

    pub fn per_consumer(prefetch_count: u16) -> Self {
        Self {
            prefetch_count,
            global: false,
        }
    }

    pub fn options(&self) -> BasicQosOptions {
        BasicQosOptions {
            global: self.global,
        }
    }
}

// =============================================================================
// Consumption
// =============================================================================

/// Who acknowledges a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// The broker treats a message as consumed as soon as it is sent.
    Auto,
    /// The handler must finish before the delivery is acknowledged.
    Manual,
}

/// Parameters for registering a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumeSpec {
    pub queue: String,
    /// Empty lets the broker assign a tag.
    pub consumer_tag: String,
    pub ack_mode: AckMode,
    pub exclusive: bool,
    pub no_local: bool,
    pub no_wait: bool,
    pub arguments: FieldTable,
}

impl ConsumeSpec {
    pub fn new(queue: impl Into<String>, ack_mode: AckMode) -> Self {
        Self {
            queue: queue.into(),
            consumer_tag: String::new(),
            ack_mode,
            exclusive: false,
            no_local: false,
            no_wait: false,
            arguments: FieldTable::default(),
        }
    }

    pub fn consumer_tag(mut self, tag: impl Into<String>) -> Self {
        self.consumer_tag = tag.into();
        self
    }

    pub fn consume_options(&self) -> BasicConsumeOptions {
        BasicConsumeOptions {
            no_local: self.no_local,
            no_ack: self.ack_mode == AckMode::Auto,
            exclusive: self.exclusive,
            nowait: self.no_wait,
        }
    }
}

// =============================================================================
// Outbound Messages
// =============================================================================

/// A message to publish through the default exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub content_type: String,
    pub body: Vec<u8>,
    pub persistent: bool,
    pub mandatory: bool,
    pub immediate: bool,
}

impl OutboundMessage {
    /// A transient `text/plain` message.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            content_type: "text/plain".to_string(),
            body: body.into().into_bytes(),
            persistent: false,
            mandatory: false,
            immediate: false,
        }
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn publish_options(&self) -> BasicPublishOptions {
        BasicPublishOptions {
            mandatory: self.mandatory,
            immediate: self.immediate,
        }
    }

    pub fn properties(&self) -> BasicProperties {
        let properties =
            BasicProperties::default().with_content_type(self.content_type.clone().into());

        if self.persistent {
            properties.with_delivery_mode(PERSISTENT_DELIVERY_MODE)
        } else {
            properties
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_queue_is_transient() {
        let spec = QueueSpec::hello();
        assert_eq!(spec.name, "hello");

        let options = spec.declare_options();
        assert!(!options.durable);
        assert!(!options.auto_delete);
        assert!(!options.exclusive);
        assert!(!options.nowait);
        assert!(!options.passive);
    }

    #[test]
    fn test_task_queue_is_durable() {
        let spec = QueueSpec::task();
        assert_eq!(spec.name, "task_queue");
        assert!(spec.declare_options().durable);
        assert_ne!(spec, QueueSpec::new(TASK_QUEUE));
    }

    #[test]
    fn test_queue_builder_flags() {
        let mut arguments = FieldTable::default();
        arguments.insert("x-max-length".into(), lapin::types::AMQPValue::LongUInt(10));

        let spec = QueueSpec::new("scratch")
            .auto_delete(true)
            .exclusive(true)
            .arguments(arguments.clone());

        let options = spec.declare_options();
        assert!(options.auto_delete);
        assert!(options.exclusive);
        assert!(!options.durable);
        assert_eq!(spec.arguments, arguments);
    }

    #[test]
    fn test_fair_dispatch_qos() {
        let qos = QosSpec::fair_dispatch();
        assert_eq!(qos.prefetch_count, 1);
        assert!(!qos.options().global);
    }

    #[test]
    fn test_ack_mode_maps_to_no_ack() {
        let auto = ConsumeSpec::new(HELLO_QUEUE, AckMode::Auto);
        assert!(auto.consume_options().no_ack);
        assert!(auto.consumer_tag.is_empty());

        let manual = ConsumeSpec::new(TASK_QUEUE, AckMode::Manual).consumer_tag("worker-1");
        assert!(!manual.consume_options().no_ack);
        assert_eq!(manual.consumer_tag, "worker-1");
    }

    #[test]
    fn test_text_message_properties() {
        let message = OutboundMessage::text("Hello World!");
        assert_eq!(message.body, b"Hello World!");

        let properties = message.properties();
        assert_eq!(
            properties.content_type().as_ref().map(|s| s.as_str()),
            Some("text/plain")
        );
        assert_eq!(*properties.delivery_mode(), None);
    }

    #[test]
    fn test_persistent_message_sets_delivery_mode() {
        let message = OutboundMessage::text("First message.").persistent(true);
        assert_eq!(*message.properties().delivery_mode(), Some(2));
        assert!(!message.publish_options().mandatory);
    }
}
