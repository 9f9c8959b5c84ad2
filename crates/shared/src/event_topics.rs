//! Centralized topic and stream naming for the event pipeline.
//!
//! Single source of truth for topic names, JetStream stream names and
//! durable consumer names, preventing mismatches between publishers and
//! consumers. Actual topic names are configurable; the constants here are
//! the defaults.

/// Default subject for incoming events.
pub const DEFAULT_EVENTS_TOPIC: &str = "eventide.events";

/// Default subject for the retry (dead-letter) queue.
pub const DEFAULT_DLQ_TOPIC: &str = "eventide.dlq";

/// Default subject for terminally parked envelopes.
pub const DEFAULT_DLQ_DEAD_TOPIC: &str = "eventide.dlq.dead";

/// JetStream stream holding incoming events.
pub const EVENTS_STREAM_NAME: &str = "EVENTIDE_EVENTS";

/// JetStream stream holding DLQ and dead-letter envelopes.
pub const DLQ_STREAM_NAME: &str = "EVENTIDE_DLQ";

/// Durable consumer name for the main processing pipeline.
pub const ENGINE_CONSUMER: &str = "eventide-engine";

/// Durable consumer name for the DLQ retry loop.
///
/// Distinct from [`ENGINE_CONSUMER`] so retries neither compete with the
/// main pipeline for capacity nor re-consume their own backlog.
pub const DLQ_CONSUMER: &str = "eventide-dlq-processor";

/// Message header carrying the partition/ordering key of a published message.
pub const KEY_HEADER: &str = "Eventide-Msg-Key";
