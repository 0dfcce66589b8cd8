//! Configuration loading from disk.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::CaddyError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read client config: {}", e),
            ConfigError::Parse(e) => write!(f, "client config is not valid TOML: {}", e),
            ConfigError::Validation(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "invalid client config: {}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CaddyError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(_) => CaddyError::InvalidSpec(err.to_string()),
            other => CaddyError::Config(other.to_string()),
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ClientConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = ?path, url = %config.admin.url, "Configuration loaded");
    Ok(config)
}
