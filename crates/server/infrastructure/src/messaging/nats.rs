//! NATS JetStream adapter for the bus port.
//!
//! Topics map directly onto JetStream subjects. The optional message key
//! rides in the `Eventide-Msg-Key` header; NATS does not partition by key
//! the way a partitioned log does, so per-key ordering is whatever a
//! single subject/consumer pair provides.

use async_nats::jetstream;
use async_nats::jetstream::stream::{Config as StreamConfig, StorageType};
use async_trait::async_trait;
use tracing::info;

use eventide_server_domain::{BusError, EventBus};
use eventide_shared::{TopicSettings, DLQ_STREAM_NAME, EVENTS_STREAM_NAME, KEY_HEADER};

#[derive(Clone)]
pub struct NatsEventBus {
    jetstream: jetstream::Context,
}

impl NatsEventBus {
    pub fn new(jetstream: jetstream::Context) -> Self {
        Self { jetstream }
    }

    pub fn from_client(client: async_nats::Client) -> Self {
        Self::new(jetstream::new(client))
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BusError> {
        let mut headers = async_nats::HeaderMap::new();
        if let Some(key) = key {
            headers.insert(KEY_HEADER, key);
        }

        let ack = self
            .jetstream
            .publish_with_headers(topic.to_string(), headers, payload.to_vec().into())
            .await
            .map_err(|e| BusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        // Wait for the broker ack so transport failures surface here, not
        // silently after the dispatch reported success.
        ack.await.map_err(|e| BusError::Publish {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

/// Create the two pipeline streams if they do not exist. Idempotent and
/// safe to run on every startup.
pub async fn ensure_streams(
    jetstream: &jetstream::Context,
    topics: &TopicSettings,
) -> Result<(), BusError> {
    let streams = [
        StreamConfig {
            name: EVENTS_STREAM_NAME.to_string(),
            description: Some("Inbound choreography events".to_string()),
            subjects: vec![topics.events.clone()],
            max_messages: 1_000_000,
            max_bytes: 1024 * 1024 * 1024,
            storage: StorageType::File,
            ..Default::default()
        },
        StreamConfig {
            name: DLQ_STREAM_NAME.to_string(),
            description: Some("Retry and terminal dead-letter envelopes".to_string()),
            subjects: vec![topics.dlq.clone(), topics.dlq_dead.clone()],
            max_messages: 100_000,
            max_bytes: 100 * 1024 * 1024,
            storage: StorageType::File,
            ..Default::default()
        },
    ];

    for config in streams {
        let name = config.name.clone();
        match jetstream.get_stream(&name).await {
            Ok(_) => info!(stream = %name, "Stream exists"),
            Err(_) => {
                jetstream
                    .create_stream(config)
                    .await
                    .map_err(|e| BusError::Connection(format!("failed to create stream {name}: {e}")))?;
                info!(stream = %name, "Stream created");
            }
        }
    }

    Ok(())
}
