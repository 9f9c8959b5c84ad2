//! Messaging adapters and consumers.
//!
//! [`nats`] holds the JetStream publisher and the idempotent stream
//! bootstrap; [`event_listener`] feeds inbound events to the engine;
//! [`dlq_retry`] drives failed events back through the pipeline with
//! exponential backoff; [`memory`] is the process-local bus used by tests
//! and single-node development.

pub mod dlq_retry;
pub mod event_listener;
pub mod memory;
pub mod nats;

pub use dlq_retry::{
    backoff_delay, plan_retry, DlqRetryConsumer, RetryExecutor, RetryOutcome, RetryStep,
};
pub use event_listener::EventListener;
pub use memory::{InMemoryEventBus, PublishedMessage};
pub use nats::{ensure_streams, NatsEventBus};
