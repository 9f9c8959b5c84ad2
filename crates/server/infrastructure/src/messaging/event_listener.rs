//! Main pipeline consumer.
//!
//! Durable pull consumer on the events subject feeding every decoded
//! message to the choreography engine. Messages that cannot be decoded as
//! events are wrapped in a raw envelope and sent to the DLQ, where the
//! retry loop parks them terminally (their structure is unknown, so they
//! can never be retried).

use std::sync::Arc;

use async_nats::jetstream;
use async_nats::jetstream::consumer::pull::Config as PullConsumerConfig;
use async_nats::jetstream::consumer::AckPolicy;
use futures::StreamExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use eventide_server_application::{ChoreographyEngine, DlqService};
use eventide_server_domain::{BusError, IncomingEvent};
use eventide_shared::{ENGINE_CONSUMER, EVENTS_STREAM_NAME};

pub struct EventListener {
    jetstream: jetstream::Context,
    engine: Arc<ChoreographyEngine>,
    dlq: DlqService,
    events_topic: String,
}

impl EventListener {
    pub fn new(
        jetstream: jetstream::Context,
        engine: Arc<ChoreographyEngine>,
        dlq: DlqService,
        events_topic: String,
    ) -> Self {
        Self {
            jetstream,
            engine,
            dlq,
            events_topic,
        }
    }

    /// Consume until the shutdown signal flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), BusError> {
        let stream = self
            .jetstream
            .get_stream(EVENTS_STREAM_NAME)
            .await
            .map_err(|e| BusError::Connection(format!("events stream missing: {e}")))?;

        let consumer = stream
            .get_or_create_consumer(
                ENGINE_CONSUMER,
                PullConsumerConfig {
                    durable_name: Some(ENGINE_CONSUMER.to_string()),
                    filter_subject: self.events_topic.clone(),
                    ack_policy: AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Connection(format!("failed to create consumer: {e}")))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| BusError::Connection(format!("failed to open message stream: {e}")))?;

        info!(topic = %self.events_topic, "Event listener started");

        loop {
            tokio::select! {
                maybe_message = messages.next() => {
                    match maybe_message {
                        Some(Ok(message)) => {
                            self.handle(&message.payload).await;
                            if let Err(e) = message.ack().await {
                                warn!(error = %e, "Failed to ack event message");
                            }
                        }
                        Some(Err(e)) => warn!(error = %e, "Error receiving event message"),
                        None => {
                            warn!("Event message stream closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Event listener shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle(&self, payload: &[u8]) {
        match serde_json::from_slice::<IncomingEvent>(payload) {
            Ok(event) => self.engine.process(&event).await,
            Err(e) => {
                let raw = String::from_utf8_lossy(payload);
                error!(error = %e, "Failed to decode incoming event");
                self.dlq
                    .enqueue_raw(&raw, &format!("Failed to decode event: {e}"))
                    .await;
            }
        }
    }
}
