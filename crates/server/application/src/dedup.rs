//! Event deduplication gate.
//!
//! The gate performs an atomic create-if-absent on `{prefix}{eventId}`
//! with a bounded TTL. The atomicity lives in the KV store, which makes
//! the gate correct under multiple concurrent consumers: for a given id,
//! exactly one caller observes "first sight" until the key expires or is
//! explicitly cleared by the retry loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use eventide_server_domain::KeyValueStore;

/// Dedup gate behavior.
#[derive(Debug, Clone)]
pub struct DedupPolicy {
    /// Prefix prepended to the event id to form the KV key.
    pub prefix: String,
    /// How long a processed event id is remembered.
    pub ttl: Duration,
    /// On KV transport errors, `true` treats the event as new (risking a
    /// duplicate dispatch), `false` treats it as a duplicate (risking
    /// event loss).
    pub fail_open: bool,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            prefix: "eventide:dedup:".to_string(),
            ttl: Duration::from_secs(24 * 60 * 60),
            fail_open: true,
        }
    }
}

/// First-sight check keyed by event id, with time-bounded memory.
#[derive(Clone)]
pub struct DeduplicationService {
    kv: Arc<dyn KeyValueStore>,
    policy: DedupPolicy,
}

impl DeduplicationService {
    pub fn new(kv: Arc<dyn KeyValueStore>, policy: DedupPolicy) -> Self {
        Self { kv, policy }
    }

    /// Whether this event id has already been seen within the TTL window.
    ///
    /// Blank ids cannot be deduplicated and always count as new; the store
    /// is not touched.
    pub async fn is_duplicate(&self, event_id: &str) -> bool {
        if event_id.trim().is_empty() {
            return false;
        }

        let key = self.key_for(event_id);

        match self.kv.set_if_absent(&key, "1", self.policy.ttl).await {
            Ok(true) => false,
            Ok(false) => {
                warn!(event_id, "Duplicate event detected");
                true
            }
            Err(e) => {
                error!(event_id, error = %e, "Dedup check failed against KV store");
                !self.policy.fail_open
            }
        }
    }

    /// Remove the dedup key so the event can be re-processed.
    ///
    /// Used by the retry loop before re-publishing; without it the
    /// original event's dedup record would silently swallow the retry.
    pub async fn clear(&self, event_id: &str) {
        if event_id.trim().is_empty() {
            return;
        }

        let key = self.key_for(event_id);
        match self.kv.delete(&key).await {
            Ok(()) => info!(event_id, "Cleared dedup key for retry"),
            Err(e) => error!(event_id, error = %e, "Failed to clear dedup key"),
        }
    }

    fn key_for(&self, event_id: &str) -> String {
        format!("{}{}", self.policy.prefix, event_id)
    }
}
