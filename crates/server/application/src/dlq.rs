//! Dead-letter queue service.
//!
//! Envelopes failed events onto the retry topic and parks unrecoverable
//! envelopes on the terminal topic. Publish failures from the DLQ itself
//! are logged and swallowed: the engine has no useful recovery left at
//! this point, and raising would only lose the surrounding rules.

use std::sync::Arc;

use tracing::{error, info};

use eventide_server_domain::{DeadEnvelope, DlqEnvelope, EventBus, IncomingEvent, RawDlqEnvelope};
use eventide_shared::{DEFAULT_DLQ_DEAD_TOPIC, DEFAULT_DLQ_TOPIC};

/// Topics and retry budget of the DLQ pipeline.
#[derive(Debug, Clone)]
pub struct DlqPolicy {
    pub retry_topic: String,
    pub dead_topic: String,
    /// Envelopes at or beyond this count are terminal.
    pub max_retries: u32,
}

impl Default for DlqPolicy {
    fn default() -> Self {
        Self {
            retry_topic: DEFAULT_DLQ_TOPIC.to_string(),
            dead_topic: DEFAULT_DLQ_DEAD_TOPIC.to_string(),
            max_retries: 3,
        }
    }
}

/// Publisher side of the dead-letter pipeline.
#[derive(Clone)]
pub struct DlqService {
    bus: Arc<dyn EventBus>,
    policy: DlqPolicy,
}

impl DlqService {
    pub fn new(bus: Arc<dyn EventBus>, policy: DlqPolicy) -> Self {
        Self { bus, policy }
    }

    pub fn policy(&self) -> &DlqPolicy {
        &self.policy
    }

    /// Envelope a failed dispatch and publish it to the retry topic,
    /// keyed by the event id.
    pub async fn enqueue_failure(&self, event: &IncomingEvent, error_text: &str, retry_count: u32) {
        let envelope = DlqEnvelope::new(event.clone(), error_text.to_string(), retry_count);

        let payload = match envelope.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(event_id = %event.event_id, error = %e, "CRITICAL: failed to serialize DLQ envelope");
                return;
            }
        };

        let key = event.has_event_id().then_some(event.event_id.as_str());
        match self.bus.publish(&self.policy.retry_topic, key, &payload).await {
            Ok(()) => info!(
                event_id = %event.event_id,
                retry_count,
                error = error_text,
                "Event sent to DLQ"
            ),
            Err(e) => {
                error!(event_id = %event.event_id, error = %e, "CRITICAL: failed to publish to DLQ")
            }
        }
    }

    /// Envelope input that could not be decoded as an event. Published
    /// unkeyed; the retry loop parks these on sight.
    pub async fn enqueue_raw(&self, raw_message: &str, error_text: &str) {
        let envelope = RawDlqEnvelope::new(raw_message.to_string(), error_text.to_string());

        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "CRITICAL: failed to serialize raw DLQ envelope");
                return;
            }
        };

        match self.bus.publish(&self.policy.retry_topic, None, &payload).await {
            Ok(()) => info!(error = error_text, "Unparseable event sent to DLQ"),
            Err(e) => error!(error = %e, "CRITICAL: failed to publish raw envelope to DLQ"),
        }
    }

    /// Publish a terminal envelope to the dead topic. Events landing here
    /// require manual investigation and are never retried automatically.
    pub async fn park(&self, original_dlq_message: &str, reason: &str) {
        let envelope = DeadEnvelope::new(original_dlq_message.to_string(), reason.to_string());

        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "CRITICAL: failed to serialize terminal envelope");
                return;
            }
        };

        match self.bus.publish(&self.policy.dead_topic, None, &payload).await {
            Ok(()) => error!(reason, "CRITICAL: event moved to permanent DLQ"),
            Err(e) => error!(error = %e, "CRITICAL: failed to publish to permanent DLQ"),
        }
    }

    /// Whether an envelope with this retry count still has budget left.
    pub fn is_retryable(&self, retry_count: u32) -> bool {
        retry_count < self.policy.max_retries
    }
}
