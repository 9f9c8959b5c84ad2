//! Configuration for the Eventide server.
//!
//! Configuration is loaded from environment variables (optionally seeded
//! from a `.env` file) into immutable DTOs that are passed to services at
//! startup. Every value has a default so a bare environment boots against
//! local NATS and Redis.

mod dto;
mod error;
mod loader;
mod validator;

pub use dto::{
    DedupSettings, DlqSettings, EventideConfig, HttpApiSettings, NatsSettings,
    OutboundHttpSettings, RedisSettings, TopicSettings,
};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use validator::validate_config;
