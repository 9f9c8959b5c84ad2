//! Hand-rolled port fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use eventide_server_domain::{
    BusError, EventBus, HttpClient, HttpError, IncomingEvent, KeyValueStore, KvError,
    RepositoryError, Workflow, WorkflowRepository,
};
use eventide_shared::WorkflowId;

pub(crate) fn sample_event(event_id: &str, payload: Value) -> IncomingEvent {
    serde_json::from_value(json!({
        "eventId": event_id,
        "eventType": "customer.created",
        "source": "user-service",
        "payload": payload,
    }))
    .unwrap()
}

#[derive(Debug, Clone)]
pub(crate) struct PublishedMessage {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Bus fake recording every publish, with per-topic failure injection.
#[derive(Default)]
pub(crate) struct RecordingBus {
    messages: Mutex<Vec<PublishedMessage>>,
    fail_topics: Mutex<HashSet<String>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, topic: &str) {
        self.fail_topics.lock().unwrap().insert(topic.to_string());
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
impl EventBus for RecordingBus {
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

/// KV fake without TTL expiry; unit tests never outlive a key.
#[derive(Default)]
pub(crate) struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
    operations: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn fail_next_operations(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        _ttl: Duration,
    ) -> Result<bool, KvError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(KvError::Backend("injected failure".to_string()));
        }

        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            Ok(false)
        } else {
            entries.insert(key.to_string(), value.to_string());
            Ok(true)
        }
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(KvError::Backend("injected failure".to_string()));
        }

        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// HTTP fake replying with a fixed status.
pub(crate) struct StubHttpClient {
    status: u16,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubHttpClient {
    pub fn replying(status: u16) -> Self {
        Self {
            status,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn execute(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: String,
    ) -> Result<u16, HttpError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
        Ok(self.status)
    }
}

/// In-memory workflow repository honoring the `(event_type, source)`
/// uniqueness constraint.
#[derive(Default)]
pub(crate) struct InMemoryWorkflows {
    workflows: Mutex<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflows {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, workflow: Workflow) {
        self.workflows
            .lock()
            .unwrap()
            .insert(workflow.id, workflow);
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflows {
    async fn find_active(
        &self,
        event_type: &str,
        source: &str,
    ) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .values()
            .find(|w| w.is_active() && w.event_type == event_type && w.source == source)
            .cloned())
    }

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.workflows.lock().unwrap().get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Workflow>, RepositoryError> {
        Ok(self.workflows.lock().unwrap().values().cloned().collect())
    }

    async fn save(&self, workflow: Workflow) -> Result<Workflow, RepositoryError> {
        let mut workflows = self.workflows.lock().unwrap();

        let conflict = workflows.values().any(|existing| {
            existing.id != workflow.id
                && existing.event_type == workflow.event_type
                && existing.source == workflow.source
        });
        if conflict {
            return Err(RepositoryError::Conflict {
                event_type: workflow.event_type.clone(),
                event_source: workflow.source.clone(),
            });
        }

        workflows.insert(workflow.id, workflow.clone());
        Ok(workflow)
    }

    async fn delete(&self, id: &WorkflowId) -> Result<(), RepositoryError> {
        self.workflows
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(*id))
    }
}
