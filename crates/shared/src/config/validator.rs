//! Configuration validation.

use super::dto::EventideConfig;
use super::error::ConfigError;

/// Reject configurations that would misroute or stall the pipeline.
pub fn validate_config(config: &EventideConfig) -> Result<(), ConfigError> {
    let topics = [
        ("topics.events", &config.topics.events),
        ("topics.dlq", &config.topics.dlq),
        ("topics.dlq_dead", &config.topics.dlq_dead),
    ];

    for (name, value) in &topics {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{name} must not be empty")));
        }
    }

    // Identical topics would loop envelopes back into the pipeline they
    // failed out of.
    if config.topics.events == config.topics.dlq
        || config.topics.events == config.topics.dlq_dead
        || config.topics.dlq == config.topics.dlq_dead
    {
        return Err(ConfigError::Validation(
            "topics.events, topics.dlq and topics.dlq_dead must be pairwise distinct".to_string(),
        ));
    }

    if config.dlq.base_delay_ms == 0 {
        return Err(ConfigError::Validation(
            "dlq.base_delay_ms must be greater than zero".to_string(),
        ));
    }

    if config.dedup.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "dedup.ttl_secs must be greater than zero".to_string(),
        ));
    }

    if config.dedup.prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "dedup.prefix must not be empty".to_string(),
        ));
    }

    if config.nats.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "nats.url must not be empty".to_string(),
        ));
    }

    if config.redis.url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "redis.url must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&EventideConfig::default()).is_ok());
    }

    #[test]
    fn rejects_empty_topic() {
        let mut config = EventideConfig::default();
        config.topics.events = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_colliding_topics() {
        let mut config = EventideConfig::default();
        config.topics.dlq = config.topics.events.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_base_delay() {
        let mut config = EventideConfig::default();
        config.dlq.base_delay_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_dedup_ttl() {
        let mut config = EventideConfig::default();
        config.dedup.ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
