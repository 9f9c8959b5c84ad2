//! Action execution.
//!
//! Executes the side effect of a matched rule against its decoded
//! `actionConfig`. Every failure mode (missing config fields, transport
//! errors, non-2xx responses) surfaces as a [`DispatchError`] the engine
//! converts into a DLQ entry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use eventide_server_domain::{ActionType, BusError, EventBus, HttpClient, HttpError, IncomingEvent};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid action config: {0}")]
    InvalidConfig(String),

    #[error("action config is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("failed to serialize dispatch body: {0}")]
    Serialization(String),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("endpoint {url} responded with status {status}")]
    Endpoint { url: String, status: u16 },
}

/// Executes a typed action against its configuration.
///
/// | action  | config                                   | body            |
/// |---------|------------------------------------------|-----------------|
/// | KAFKA   | `topic`, optional `key` (event id)       | event payload   |
/// | WEBHOOK | `url`                                    | whole event     |
/// | HTTP    | `url`, optional `method`, `headers`      | event payload   |
#[derive(Clone)]
pub struct ActionDispatcher {
    bus: Arc<dyn EventBus>,
    http: Arc<dyn HttpClient>,
}

impl ActionDispatcher {
    pub fn new(bus: Arc<dyn EventBus>, http: Arc<dyn HttpClient>) -> Self {
        Self { bus, http }
    }

    pub async fn dispatch(
        &self,
        action_type: ActionType,
        config: &Map<String, Value>,
        event: &IncomingEvent,
    ) -> Result<(), DispatchError> {
        match action_type {
            ActionType::Kafka => self.dispatch_bus(config, event).await,
            ActionType::Webhook => self.dispatch_webhook(config, event).await,
            ActionType::Http => self.dispatch_http(config, event).await,
        }
    }

    async fn dispatch_bus(
        &self,
        config: &Map<String, Value>,
        event: &IncomingEvent,
    ) -> Result<(), DispatchError> {
        let topic = required_str(config, "topic")?;
        let key = config
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or(&event.event_id);

        let body = serde_json::to_vec(&event.payload)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        self.bus.publish(topic, Some(key), &body).await?;
        info!(topic, key, "Dispatched KAFKA action");
        Ok(())
    }

    async fn dispatch_webhook(
        &self,
        config: &Map<String, Value>,
        event: &IncomingEvent,
    ) -> Result<(), DispatchError> {
        let url = required_str(config, "url")?;

        // Webhooks receive the whole event, not just the payload, so the
        // receiver can see id, type and source.
        let body = serde_json::to_string(event)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        let status = self
            .http
            .execute("POST", url, &json_headers(), body)
            .await?;
        ensure_success(url, status)?;
        info!(url, status, "Dispatched WEBHOOK action");
        Ok(())
    }

    async fn dispatch_http(
        &self,
        config: &Map<String, Value>,
        event: &IncomingEvent,
    ) -> Result<(), DispatchError> {
        let url = required_str(config, "url")?;
        let method = config
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("POST")
            .to_uppercase();

        let mut headers = json_headers();
        if let Some(custom) = config.get("headers").and_then(Value::as_object) {
            for (name, value) in custom {
                headers.insert(name.clone(), header_value(value));
            }
        }

        let body = serde_json::to_string(&event.payload)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        let status = self.http.execute(&method, url, &headers, body).await?;
        ensure_success(url, status)?;
        info!(method, url, status, "Dispatched HTTP action");
        Ok(())
    }
}

fn required_str<'a>(
    config: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, DispatchError> {
    config
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(DispatchError::MissingField { field })
}

fn json_headers() -> HashMap<String, String> {
    HashMap::from([("Content-Type".to_string(), "application/json".to_string())])
}

fn header_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn ensure_success(url: &str, status: u16) -> Result<(), DispatchError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(DispatchError::Endpoint {
            url: url.to_string(),
            status,
        })
    }
}
