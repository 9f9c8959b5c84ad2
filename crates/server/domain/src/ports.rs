//! Ports implemented by the infrastructure layer.
//!
//! The engine and its services only ever talk to these traits; all
//! concurrency safety reduces to the adapters' guarantees.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use eventide_shared::WorkflowId;

use crate::workflows::Workflow;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },

    #[error("bus connection error: {0}")]
    Connection(String),
}

/// Fire-and-observe-errors publisher onto the message bus.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish `payload` to `topic`, optionally keyed for per-key ordering.
    async fn publish(&self, topic: &str, key: Option<&str>, payload: &[u8])
        -> Result<(), BusError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("key-value store error: {0}")]
    Backend(String),

    #[error("key-value connection error: {0}")]
    Connection(String),
}

/// Key-value store backing the dedup gate.
///
/// `set_if_absent` must be atomic: under concurrent callers exactly one
/// may observe a successful create for a given key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Create `key` with `value` and `ttl` only if it does not exist.
    /// Returns `true` when the create succeeded (first sight).
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, KvError>;

    /// Delete `key` unconditionally.
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("http client error: {0}")]
    Client(String),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// Outbound HTTP transport for webhook and generic HTTP actions.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a request with a JSON body and return the response status.
    /// Transport-level failures (DNS, refused, timeout) are errors; any
    /// status code is a successful transport result.
    async fn execute(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: String,
    ) -> Result<u16, HttpError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    #[error("a workflow already exists for event type '{event_type}' and source '{event_source}'")]
    Conflict {
        event_type: String,
        event_source: String,
    },

    #[error("repository error: {0}")]
    Backend(String),
}

/// Lookup and persistence of workflow definitions.
///
/// Implementations enforce the `(event_type, source)` uniqueness
/// constraint and return workflows with rules pre-sorted by priority
/// ascending.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// The unique ACTIVE workflow listening for `(event_type, source)`,
    /// if any.
    async fn find_active(
        &self,
        event_type: &str,
        source: &str,
    ) -> Result<Option<Workflow>, RepositoryError>;

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Workflow>, RepositoryError>;

    /// Insert or replace a workflow. Fails with [`RepositoryError::Conflict`]
    /// when a different workflow already claims the `(event_type, source)`
    /// pair.
    async fn save(&self, workflow: Workflow) -> Result<Workflow, RepositoryError>;

    async fn delete(&self, id: &WorkflowId) -> Result<(), RepositoryError>;
}
