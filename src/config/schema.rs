//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default Caddy admin endpoint.
pub const DEFAULT_ADMIN_URL: &str = "http://localhost:2019";

/// Default name of the HTTP server routes are managed under.
pub const DEFAULT_SERVER_NAME: &str = "srv0";

/// Root configuration for the admin client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Admin API endpoint settings.
    pub admin: AdminConfig,

    /// Optional SSH tunnel to reach a remote admin API.
    pub tunnel: Option<TunnelConfig>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Admin API endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Base URL of the admin API (e.g., "http://localhost:2019").
    pub url: String,

    /// HTTP server whose route list is reconciled.
    pub server_name: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ADMIN_URL.to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// SSH local port-forward used to reach an admin API bound to a remote loopback.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// SSH destination (e.g., "deploy@edge.example.com").
    pub destination: String,

    /// Admin address as seen from the remote host.
    pub remote_addr: String,

    /// Local port the tunnel listens on.
    pub local_port: u16,

    /// SSH executable.
    pub ssh_binary: String,

    /// Extra arguments passed to ssh before the destination.
    pub extra_args: Vec<String>,

    /// Attempts made while waiting for the forwarded port to accept connections.
    pub ready_attempts: u32,

    /// Base delay for readiness backoff in milliseconds.
    pub ready_base_delay_ms: u64,

    /// Maximum delay for readiness backoff in milliseconds.
    pub ready_max_delay_ms: u64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            remote_addr: "localhost:2019".to_string(),
            local_port: 2020,
            ssh_binary: "ssh".to_string(),
            extra_args: Vec::new(),
            ready_attempts: 10,
            ready_base_delay_ms: 100,
            ready_max_delay_ms: 2000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.admin.url, "http://localhost:2019");
        assert_eq!(config.admin.server_name, "srv0");
        assert!(config.tunnel.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [admin]
            server_name = "edge"

            [tunnel]
            destination = "root@10.0.0.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.admin.server_name, "edge");
        assert_eq!(config.admin.url, DEFAULT_ADMIN_URL);
        let tunnel = config.tunnel.unwrap();
        assert_eq!(tunnel.destination, "root@10.0.0.5");
        assert_eq!(tunnel.local_port, 2020);
    }
}
