//! Process-local bus used by tests and single-node development.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use eventide_server_domain::{BusError, EventBus};

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    /// Decode the payload as JSON; panics on non-JSON payloads, which is
    /// acceptable in the test contexts this bus exists for.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.payload).expect("payload is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// [`EventBus`] recording every publish in memory, with per-topic failure
/// injection for exercising DLQ paths.
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    messages: Mutex<Vec<PublishedMessage>>,
    fail_topics: Mutex<HashSet<String>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish to `topic` fail until [`heal`](Self::heal) is called.
    pub fn fail_on(&self, topic: &str) {
        self.fail_topics.lock().unwrap().insert(topic.to_string());
    }

    pub fn heal(&self, topic: &str) {
        self.fail_topics.lock().unwrap().remove(topic);
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.topic == topic)
            .collect()
    }

    pub fn count_for(&self, topic: &str) -> usize {
        self.published_to(topic).len()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BusError> {
        if self.fail_topics.lock().unwrap().contains(topic) {
            return Err(BusError::Publish {
                topic: topic.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        self.messages.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            key: key.map(str::to_string),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
