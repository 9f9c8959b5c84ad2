//! Dead-letter queue envelopes.
//!
//! Three wire forms travel over the DLQ topics: [`DlqEnvelope`] wraps an
//! event whose dispatch failed, [`RawDlqEnvelope`] wraps input that could
//! not be parsed as an event at ingress, and [`DeadEnvelope`] is the
//! terminal form published when an envelope is out of retries or
//! structurally unprocessable.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::IncomingEvent;

/// Envelope around an event whose dispatch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqEnvelope {
    pub original_event: IncomingEvent,
    pub error: String,
    pub retry_count: u32,
    /// Epoch milliseconds at enqueue time.
    pub timestamp: i64,
}

impl DlqEnvelope {
    pub fn new(original_event: IncomingEvent, error: String, retry_count: u32) -> Self {
        Self {
            original_event,
            error,
            retry_count,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Envelope around a message that could not be decoded as an event.
///
/// These can never be retried, because the original event structure is
/// unknown; the retry loop parks them on sight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDlqEnvelope {
    pub raw_message: String,
    pub error: String,
    pub retry_count: u32,
    pub timestamp: i64,
}

impl RawDlqEnvelope {
    pub fn new(raw_message: String, error: String) -> Self {
        Self {
            raw_message,
            error,
            retry_count: 0,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Terminal envelope published to the dead topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadEnvelope {
    /// Verbatim text of the DLQ message being parked.
    pub original_dlq_message: String,
    /// Human-readable reason for parking.
    pub reason: String,
    pub timestamp: i64,
}

impl DeadEnvelope {
    pub fn new(original_dlq_message: String, reason: String) -> Self {
        Self {
            original_dlq_message,
            reason,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> IncomingEvent {
        serde_json::from_value(json!({
            "eventId": "evt-001",
            "eventType": "customer.created",
            "source": "user-service",
            "payload": {"plan": "enterprise"},
        }))
        .unwrap()
    }

    #[test]
    fn envelope_round_trip_preserves_original_event() {
        let envelope = DlqEnvelope::new(sample_event(), "bus unavailable".into(), 2);

        let bytes = envelope.to_json().unwrap();
        let back = DlqEnvelope::from_json(&bytes).unwrap();

        assert_eq!(back.original_event, envelope.original_event);
        assert_eq!(back.retry_count, 2);
        assert_eq!(back.error, "bus unavailable");
    }

    #[test]
    fn envelope_uses_camel_case_field_names() {
        let envelope = DlqEnvelope::new(sample_event(), "boom".into(), 0);
        let value: serde_json::Value =
            serde_json::from_slice(&envelope.to_json().unwrap()).unwrap();

        assert!(value.get("originalEvent").is_some());
        assert_eq!(value["retryCount"], 0);
        assert_eq!(value["originalEvent"]["eventId"], "evt-001");
    }

    #[test]
    fn raw_envelope_always_starts_at_zero_retries() {
        let envelope = RawDlqEnvelope::new("not json".into(), "decode failed".into());
        assert_eq!(envelope.retry_count, 0);

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["rawMessage"], "not json");
    }

    #[test]
    fn dead_envelope_carries_reason() {
        let envelope = DeadEnvelope::new("{...}".into(), "Max retries exceeded: 3".into());
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["originalDlqMessage"], "{...}");
        assert_eq!(value["reason"], "Max retries exceeded: 3");
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
