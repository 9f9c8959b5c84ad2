//! DLQ retry loop.
//!
//! Consumes the retry topic on its own durable consumer and walks each
//! envelope through a fixed decision ladder:
//!
//! ```text
//! eventide.dlq ──► parse envelope ──► rawMessage?      ──► park
//!                        │             retries spent?  ──► park
//!                        │             no originalEvent ──► park
//!                        ▼
//!                  wait base * 5^retryCount
//!                  clear dedup key
//!                  stamp _retryCount = retryCount + 1
//!                  re-publish to eventide.events
//! ```
//!
//! Planning ([`plan_retry`]) is a pure function over the raw envelope
//! text; execution ([`RetryExecutor`]) performs the waiting and the side
//! effects. The backoff wait is cancellable: shutdown during the sleep
//! leaves the message unacked so it is redelivered after restart.

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::consumer::pull::Config as PullConsumerConfig;
use async_nats::jetstream::consumer::AckPolicy;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{error, info, warn};

use eventide_server_application::{DeduplicationService, DlqService};
use eventide_server_domain::events::coerce_retry_count;
use eventide_server_domain::{BusError, EventBus, IncomingEvent};
use eventide_shared::{DLQ_CONSUMER, DLQ_STREAM_NAME};

/// What to do with one DLQ message.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStep {
    /// Terminally park the raw envelope text with a reason.
    Park { reason: String },
    /// Wait `delay`, clear dedup, stamp `retry_count + 1`, re-publish.
    Retry {
        event: IncomingEvent,
        retry_count: u32,
        delay: Duration,
    },
}

/// Backoff before retry N: `base_delay_ms * 5^N` (5s, 25s, 125s, … for
/// the default base).
pub fn backoff_delay(base_delay_ms: u64, retry_count: u32) -> Duration {
    Duration::from_millis(base_delay_ms.saturating_mul(5u64.saturating_pow(retry_count)))
}

/// Decide what to do with a DLQ message. Pure: no I/O, no clock.
pub fn plan_retry(raw: &str, max_retries: u32, base_delay_ms: u64) -> RetryStep {
    let envelope: Value = match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => {
            return RetryStep::Park {
                reason: "Malformed DLQ envelope".to_string(),
            }
        }
    };

    // Raw envelopes wrap input that never decoded as an event; the
    // original structure is unknown, so a retry is impossible.
    if envelope.get("rawMessage").is_some() {
        return RetryStep::Park {
            reason: "Unparseable event — cannot retry".to_string(),
        };
    }

    let retry_count = coerce_retry_count(envelope.get("retryCount"));
    if retry_count >= max_retries {
        return RetryStep::Park {
            reason: format!("Max retries exceeded: {retry_count}"),
        };
    }

    let event = match envelope.get("originalEvent") {
        None | Some(Value::Null) => {
            return RetryStep::Park {
                reason: "Missing originalEvent field".to_string(),
            }
        }
        Some(value) => match serde_json::from_value::<IncomingEvent>(value.clone()) {
            Ok(event) => event,
            Err(_) => {
                return RetryStep::Park {
                    reason: "Malformed DLQ envelope".to_string(),
                }
            }
        },
    };

    RetryStep::Retry {
        event,
        retry_count,
        delay: backoff_delay(base_delay_ms, retry_count),
    }
}

/// Outcome of executing a [`RetryStep`], deciding whether the message is
/// acked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Step completed; ack the message.
    Done,
    /// Re-publish failed; leave the message unacked for redelivery.
    RepublishFailed,
    /// Shutdown interrupted the wait; leave unacked and stop consuming.
    Interrupted,
}

/// Side-effecting half of the retry loop.
pub struct RetryExecutor {
    bus: Arc<dyn EventBus>,
    dedup: DeduplicationService,
    dlq: DlqService,
    events_topic: String,
}

impl RetryExecutor {
    pub fn new(
        bus: Arc<dyn EventBus>,
        dedup: DeduplicationService,
        dlq: DlqService,
        events_topic: String,
    ) -> Self {
        Self {
            bus,
            dedup,
            dlq,
            events_topic,
        }
    }

    pub async fn execute(
        &self,
        raw: &str,
        step: RetryStep,
        shutdown: &mut watch::Receiver<bool>,
    ) -> RetryOutcome {
        match step {
            RetryStep::Park { reason } => {
                warn!(reason = %reason, "Parking DLQ envelope");
                self.dlq.park(raw, &reason).await;
                RetryOutcome::Done
            }
            RetryStep::Retry {
                mut event,
                retry_count,
                delay,
            } => {
                info!(
                    event_id = %event.event_id,
                    attempt = retry_count + 1,
                    backoff_ms = delay.as_millis() as u64,
                    "Retrying DLQ event"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => {
                        info!("Retry backoff interrupted by shutdown");
                        return RetryOutcome::Interrupted;
                    }
                }

                // Mandatory: without clearing the dedup record the
                // re-published event would be silently dropped at the gate.
                self.dedup.clear(&event.event_id).await;

                event.stamp_retry_count(retry_count + 1);

                let payload = match serde_json::to_vec(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!(error = %e, "Failed to serialize event for re-publish");
                        return RetryOutcome::RepublishFailed;
                    }
                };

                let key = event.has_event_id().then_some(event.event_id.as_str());
                match self.bus.publish(&self.events_topic, key, &payload).await {
                    Ok(()) => {
                        info!(
                            event_id = %event.event_id,
                            attempt = retry_count + 1,
                            topic = %self.events_topic,
                            "Re-published DLQ event"
                        );
                        RetryOutcome::Done
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to re-publish DLQ event");
                        RetryOutcome::RepublishFailed
                    }
                }
            }
        }
    }
}

/// Durable consumer on the retry topic.
///
/// Runs in its own consumer group, so retries neither cannibalize
/// main-pipeline capacity nor re-enter their own backlog.
pub struct DlqRetryConsumer {
    jetstream: jetstream::Context,
    executor: RetryExecutor,
    retry_topic: String,
    max_retries: u32,
    base_delay_ms: u64,
}

impl DlqRetryConsumer {
    pub fn new(
        jetstream: jetstream::Context,
        executor: RetryExecutor,
        retry_topic: String,
        max_retries: u32,
        base_delay_ms: u64,
    ) -> Self {
        Self {
            jetstream,
            executor,
            retry_topic,
            max_retries,
            base_delay_ms,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), BusError> {
        let stream = self
            .jetstream
            .get_stream(DLQ_STREAM_NAME)
            .await
            .map_err(|e| BusError::Connection(format!("DLQ stream missing: {e}")))?;

        let consumer = stream
            .get_or_create_consumer(
                DLQ_CONSUMER,
                PullConsumerConfig {
                    durable_name: Some(DLQ_CONSUMER.to_string()),
                    filter_subject: self.retry_topic.clone(),
                    ack_policy: AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Connection(format!("failed to create DLQ consumer: {e}")))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| BusError::Connection(format!("failed to open DLQ stream: {e}")))?;

        info!(topic = %self.retry_topic, "DLQ retry consumer started");

        loop {
            tokio::select! {
                maybe_message = messages.next() => {
                    match maybe_message {
                        Some(Ok(message)) => {
                            let raw = String::from_utf8_lossy(&message.payload).into_owned();
                            let step = plan_retry(&raw, self.max_retries, self.base_delay_ms);

                            match self.executor.execute(&raw, step, &mut shutdown).await {
                                RetryOutcome::Done => {
                                    if let Err(e) = message.ack().await {
                                        warn!(error = %e, "Failed to ack DLQ message");
                                    }
                                }
                                RetryOutcome::RepublishFailed => {
                                    // No ack: the broker redelivers later.
                                    warn!("Leaving DLQ message unacked for redelivery");
                                }
                                RetryOutcome::Interrupted => break,
                            }
                        }
                        Some(Err(e)) => warn!(error = %e, "Error receiving DLQ message"),
                        None => {
                            warn!("DLQ message stream closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("DLQ retry consumer shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}
