//! HTTP transport to the admin API.
//!
//! # Responsibilities
//! - Send one request to the admin endpoint and hand back status + body
//! - Serialize JSON request bodies
//! - Map connection failures into `CaddyError::Transport`
//!
//! Status classification happens one layer up in `AdminClient`, so every
//! transport (direct or tunnelled) is judged by the same rules.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::AdminConfig;
use crate::error::{CaddyError, CaddyResult};

/// A single admin API call.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRequest {
    pub method: Method,
    /// Absolute API path, e.g. `/config/apps/http`.
    pub path: String,
    pub body: Option<Value>,
}

impl AdminRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw answer from the admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminResponse {
    pub status: u16,
    pub body: String,
}

impl AdminResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything able to carry admin API requests to a Caddy instance.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: AdminRequest) -> CaddyResult<AdminResponse>;

    /// Base URL requests are resolved against, for logging.
    fn endpoint(&self) -> &Url;
}

/// Direct HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for the endpoint described by `config`.
    pub fn new(config: &AdminConfig) -> CaddyResult<Self> {
        Self::with_timeouts(
            &config.url,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    pub fn with_timeouts(base_url: &str, timeout: Duration, connect_timeout: Duration) -> CaddyResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CaddyError::InvalidSpec(format!("invalid admin URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .no_proxy()
            .build()
            .map_err(CaddyError::network)?;

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: AdminRequest) -> CaddyResult<AdminResponse> {
        let url = self.url_for(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(method = %request.method, url = %url, error = %e, "Admin request failed");
            CaddyError::network(e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(CaddyError::network)?;

        tracing::trace!(method = %request.method, url = %url, status, "Admin request completed");
        Ok(AdminResponse { status, body })
    }

    fn endpoint(&self) -> &Url {
        &self.base_url
    }
}
