//! Admin API client.
//!
//! # Responsibilities
//! - Hold the transport and the managed server name
//! - Issue one request and classify the outcome
//! - Decode JSON response bodies

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use crate::admin::path::ConfigPath;
use crate::config::{ClientConfig, DEFAULT_SERVER_NAME};
use crate::error::{CaddyError, CaddyResult};
use crate::net::{AdminRequest, HttpTransport, Transport, TunnelTransport};

/// Handle on one Caddy admin endpoint.
///
/// Cheap to clone; every clone shares the same transport. Holds no cached
/// server state, each operation fetches what it needs.
#[derive(Debug, Clone)]
pub struct AdminClient {
    transport: Arc<dyn Transport>,
    server_name: String,
}

impl AdminClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }

    /// Use `name` as the HTTP server whose routes are managed.
    pub fn with_server(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Build a client from configuration, opening an SSH tunnel if one is configured.
    pub async fn connect(config: &ClientConfig) -> CaddyResult<Self> {
        let transport: Arc<dyn Transport> = match &config.tunnel {
            Some(tunnel) => Arc::new(TunnelTransport::open(&config.admin, tunnel).await?),
            None => Arc::new(HttpTransport::new(&config.admin)?),
        };

        tracing::debug!(
            endpoint = %transport.endpoint(),
            server = %config.admin.server_name,
            "Admin client ready"
        );
        Ok(Self::new(transport).with_server(config.admin.server_name.clone()))
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn server_path(&self) -> ConfigPath {
        ConfigPath::new("/apps/http/servers").join(&self.server_name)
    }

    pub fn routes_path(&self) -> ConfigPath {
        self.server_path().join("routes")
    }

    /// Send a request and return the decoded JSON body, `None` when empty.
    ///
    /// Any non-2xx status becomes `CaddyError::Transport` carrying the
    /// response body as detail.
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> CaddyResult<Option<Value>> {
        let mut request = AdminRequest::new(method.clone(), path);
        if let Some(body) = body {
            request = request.with_body(body.clone());
        }

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            tracing::debug!(
                method = %method,
                path,
                status = response.status,
                body = %response.body.trim(),
                "Admin API rejected request"
            );
            return Err(CaddyError::Transport {
                status: Some(response.status),
                detail: response.body.trim().to_string(),
            });
        }

        if response.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| CaddyError::Schema(format!("invalid JSON from {} {}: {}", method, path, e)))
    }
}
