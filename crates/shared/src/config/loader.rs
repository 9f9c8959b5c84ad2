//! Configuration loader.
//!
//! Loads configuration from an optional `.env` file followed by the
//! process environment, then validates the result.

use std::path::{Path, PathBuf};

use super::dto::EventideConfig;
use super::error::ConfigError;
use super::validator::validate_config;

/// Loads [`EventideConfig`] from the environment.
///
/// Values from the `.env` file are injected into the process environment
/// before reading, so explicit environment variables win only when the file
/// does not define them (standard dotenv semantics).
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    env_file_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(env_file_path: Option<PathBuf>) -> Self {
        Self { env_file_path }
    }

    /// Load and validate the server configuration.
    pub fn load(&self) -> Result<EventideConfig, ConfigError> {
        if let Some(path) = &self.env_file_path {
            self.load_env_file(path)?;
        }

        let config = EventideConfig::from_env()?;
        validate_config(&config)?;

        Ok(config)
    }

    fn load_env_file(&self, path: &Path) -> Result<(), ConfigError> {
        dotenv::from_path(path).map_err(|e| ConfigError::EnvFileLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_file_is_an_error() {
        let loader = ConfigLoader::new(Some(PathBuf::from("/nonexistent/.env")));
        assert!(matches!(
            loader.load(),
            Err(ConfigError::EnvFileLoad { .. })
        ));
    }

    #[test]
    fn loader_without_env_file_uses_defaults() {
        let config = ConfigLoader::new(None).load().unwrap();
        assert_eq!(config.dlq.max_retries, 3);
    }
}
