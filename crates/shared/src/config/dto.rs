//! Configuration DTOs.
//!
//! Single source of truth for all runtime configuration. Loaded once at
//! startup and handed to services by value; services never read the
//! environment themselves.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::event_topics::{DEFAULT_DLQ_DEAD_TOPIC, DEFAULT_DLQ_TOPIC, DEFAULT_EVENTS_TOPIC};

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventideConfig {
    pub nats: NatsSettings,
    pub redis: RedisSettings,
    pub http_api: HttpApiSettings,
    pub topics: TopicSettings,
    pub dlq: DlqSettings,
    pub dedup: DedupSettings,
    pub outbound_http: OutboundHttpSettings,
}

/// NATS connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsSettings {
    pub url: String,
}

impl Default for NatsSettings {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

/// Redis connection settings for the dedup store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

/// Bind address of the administrative HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpApiSettings {
    pub bind_address: SocketAddr,
}

impl Default for HttpApiSettings {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Topic (subject) names used by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSettings {
    /// Inbound events consumed by the engine.
    pub events: String,
    /// Retry queue for failed dispatches.
    pub dlq: String,
    /// Terminal sink for exhausted or unprocessable envelopes.
    pub dlq_dead: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            events: DEFAULT_EVENTS_TOPIC.to_string(),
            dlq: DEFAULT_DLQ_TOPIC.to_string(),
            dlq_dead: DEFAULT_DLQ_DEAD_TOPIC.to_string(),
        }
    }
}

/// Retry budget and backoff base for the DLQ pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqSettings {
    /// Envelopes with `retryCount >= max_retries` are parked terminally.
    pub max_retries: u32,
    /// Backoff before retry N is `base_delay_ms * 5^N`.
    pub base_delay_ms: u64,
}

impl Default for DlqSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 5_000,
        }
    }
}

/// Dedup gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupSettings {
    /// Lifetime of a dedup key.
    pub ttl_secs: u64,
    /// Prefix prepended to the event id to form the KV key.
    pub prefix: String,
    /// When the KV store is unreachable, `true` processes the event anyway
    /// (risking a duplicate dispatch), `false` drops it.
    pub fail_open: bool,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            prefix: "eventide:dedup:".to_string(),
            fail_open: true,
        }
    }
}

/// Settings for outbound HTTP dispatch (webhook / generic HTTP actions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundHttpSettings {
    /// Total per-request timeout; bounds DLQ latency on slow endpoints.
    pub timeout_secs: u64,
}

impl Default for OutboundHttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Default for EventideConfig {
    fn default() -> Self {
        Self {
            nats: NatsSettings::default(),
            redis: RedisSettings::default(),
            http_api: HttpApiSettings::default(),
            topics: TopicSettings::default(),
            dlq: DlqSettings::default(),
            dedup: DedupSettings::default(),
            outbound_http: OutboundHttpSettings::default(),
        }
    }
}

impl EventideConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            nats: NatsSettings {
                url: env_string("EVENTIDE_NATS_URL", defaults.nats.url),
            },
            redis: RedisSettings {
                url: env_string("EVENTIDE_REDIS_URL", defaults.redis.url),
            },
            http_api: HttpApiSettings {
                bind_address: env_parsed("EVENTIDE_HTTP_BIND", defaults.http_api.bind_address)?,
            },
            topics: TopicSettings {
                events: env_string("EVENTIDE_TOPICS_EVENTS", defaults.topics.events),
                dlq: env_string("EVENTIDE_TOPICS_DLQ", defaults.topics.dlq),
                dlq_dead: env_string("EVENTIDE_TOPICS_DLQ_DEAD", defaults.topics.dlq_dead),
            },
            dlq: DlqSettings {
                max_retries: env_parsed("EVENTIDE_DLQ_MAX_RETRIES", defaults.dlq.max_retries)?,
                base_delay_ms: env_parsed("EVENTIDE_DLQ_BASE_DELAY_MS", defaults.dlq.base_delay_ms)?,
            },
            dedup: DedupSettings {
                ttl_secs: env_parsed("EVENTIDE_DEDUP_TTL_SECS", defaults.dedup.ttl_secs)?,
                prefix: env_string("EVENTIDE_DEDUP_PREFIX", defaults.dedup.prefix),
                fail_open: env_parsed("EVENTIDE_DEDUP_FAIL_OPEN", defaults.dedup.fail_open)?,
            },
            outbound_http: OutboundHttpSettings {
                timeout_secs: env_parsed(
                    "EVENTIDE_HTTP_TIMEOUT_SECS",
                    defaults.outbound_http.timeout_secs,
                )?,
            },
        })
    }
}

fn env_string(key: &str, default: String) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

fn env_parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(key, &value, "failed to parse")),
        _ => Ok(default),
    }
}
