//! Incoming event wire type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved payload key carrying the attempt count of a retried event.
///
/// The retry loop stamps it before re-publishing and the engine reads it
/// when enqueueing the next failure, so the count advances monotonically
/// across pipeline re-entries. The whole `_`-prefixed namespace inside the
/// payload is reserved for such control fields and is not part of the
/// user-visible event contract.
pub const RETRY_COUNT_FIELD: &str = "_retryCount";

/// An event published by an external producer.
///
/// ```json
/// {
///   "eventId": "evt-abc-123",
///   "eventType": "customer.created",
///   "source": "user-service",
///   "payload": { "plan": "enterprise" }
/// }
/// ```
///
/// `eventId` is the dedup identity; when absent or blank the dedup gate is
/// bypassed. `(eventType, source)` selects the workflow; conditions are
/// evaluated against `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingEvent {
    #[serde(default)]
    pub event_id: String,
    pub event_type: String,
    pub source: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl IncomingEvent {
    /// Current attempt count read from the reserved payload field.
    ///
    /// Only numeric values are honored; anything else counts as zero.
    pub fn retry_count(&self) -> u32 {
        coerce_retry_count(self.payload.get(RETRY_COUNT_FIELD))
    }

    /// Stamp the attempt count into the payload before re-publishing.
    pub fn stamp_retry_count(&mut self, count: u32) {
        self.payload
            .insert(RETRY_COUNT_FIELD.to_string(), Value::from(count));
    }

    /// Whether the event carries an id usable for deduplication.
    pub fn has_event_id(&self) -> bool {
        !self.event_id.trim().is_empty()
    }
}

/// Coerce a JSON value into a retry count, defaulting to zero.
pub fn coerce_retry_count(value: Option<&Value>) -> u32 {
    match value {
        Some(v) => v
            .as_u64()
            .map(|n| n.min(u32::MAX as u64) as u32)
            .or_else(|| v.as_i64().map(|n| n.max(0) as u32))
            .or_else(|| v.as_f64().map(|f| f.max(0.0) as u32))
            .unwrap_or(0),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with_payload(payload: Value) -> IncomingEvent {
        serde_json::from_value(json!({
            "eventId": "evt-001",
            "eventType": "customer.created",
            "source": "user-service",
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_camel_case_wire_form() {
        let event = event_with_payload(json!({"plan": "enterprise"}));

        assert_eq!(event.event_id, "evt-001");
        assert_eq!(event.event_type, "customer.created");
        assert_eq!(event.source, "user-service");
        assert_eq!(event.payload["plan"], "enterprise");
    }

    #[test]
    fn missing_event_id_and_payload_default() {
        let event: IncomingEvent = serde_json::from_value(json!({
            "eventType": "t",
            "source": "s",
        }))
        .unwrap();

        assert!(!event.has_event_id());
        assert!(event.payload.is_empty());
    }

    #[test]
    fn retry_count_defaults_to_zero() {
        let event = event_with_payload(json!({}));
        assert_eq!(event.retry_count(), 0);
    }

    #[test]
    fn retry_count_coerces_numbers() {
        assert_eq!(event_with_payload(json!({"_retryCount": 2})).retry_count(), 2);
        assert_eq!(
            event_with_payload(json!({"_retryCount": 2.0})).retry_count(),
            2
        );
        assert_eq!(
            event_with_payload(json!({"_retryCount": -1})).retry_count(),
            0
        );
    }

    #[test]
    fn retry_count_ignores_non_numeric_values() {
        assert_eq!(
            event_with_payload(json!({"_retryCount": "2"})).retry_count(),
            0
        );
        assert_eq!(
            event_with_payload(json!({"_retryCount": null})).retry_count(),
            0
        );
    }

    #[test]
    fn stamping_overwrites_previous_count() {
        let mut event = event_with_payload(json!({"_retryCount": 1}));
        event.stamp_retry_count(2);
        assert_eq!(event.retry_count(), 2);
    }

    #[test]
    fn round_trips_through_json() {
        let event = event_with_payload(json!({"plan": "enterprise", "seats": 5}));
        let json = serde_json::to_string(&event).unwrap();
        let back: IncomingEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
