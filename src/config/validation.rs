//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the admin URL parses and uses http(s)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.admin.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "admin.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("admin.url", e.to_string())),
    }

    if config.admin.server_name.trim().is_empty() {
        errors.push(ValidationError::new("admin.server_name", "must not be empty"));
    }
    if config.admin.server_name.contains('/') {
        errors.push(ValidationError::new("admin.server_name", "must not contain '/'"));
    }
    if config.admin.timeout_secs == 0 {
        errors.push(ValidationError::new("admin.timeout_secs", "must be greater than 0"));
    }

    if let Some(tunnel) = &config.tunnel {
        if tunnel.destination.trim().is_empty() {
            errors.push(ValidationError::new("tunnel.destination", "must not be empty"));
        }
        if tunnel.local_port == 0 {
            errors.push(ValidationError::new("tunnel.local_port", "must not be 0"));
        }
        if !tunnel.remote_addr.contains(':') {
            errors.push(ValidationError::new("tunnel.remote_addr", "expected host:port"));
        }
        if tunnel.ready_attempts == 0 {
            errors.push(ValidationError::new("tunnel.ready_attempts", "must be greater than 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
