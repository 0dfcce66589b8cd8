//! Idempotent bootstrap of the HTTP app, server and TLS policy.
//!
//! # Responsibilities
//! - Create the structure routes need before any route can be added
//! - Skip steps whose subtree already equals the desired value
//! - Stop at the first failing step and name it

use serde::Serialize;
use serde_json::Value;
use std::future::Future;

use crate::admin::{AdminClient, ConfigPath};
use crate::error::{CaddyError, CaddyResult};
use crate::routing::RouteList;
use crate::setup::plan::SetupPlan;

const HTTP_SERVERS: &str = "/apps/http/servers";
const TLS_APP: &str = "/apps/tls";
const TLS_AUTOMATION: &str = "/apps/tls/automation";
const LOCAL_CA: &str = "/apps/pki/certificate_authorities/local";

/// Which steps wrote to the server and which were already satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub changed: Vec<&'static str>,
    pub unchanged: Vec<&'static str>,
}

impl SetupReport {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }

    async fn step<F>(&mut self, name: &'static str, action: F) -> CaddyResult<()>
    where
        F: Future<Output = CaddyResult<bool>>,
    {
        match action.await {
            Ok(true) => {
                tracing::info!(step = name, "Setup step applied");
                self.changed.push(name);
                Ok(())
            }
            Ok(false) => {
                tracing::debug!(step = name, "Setup step already satisfied");
                self.unchanged.push(name);
                Ok(())
            }
            Err(e) => {
                tracing::error!(step = name, error = %e, "Setup step failed");
                Err(CaddyError::Setup {
                    step: name,
                    source: Box::new(e),
                })
            }
        }
    }
}

/// Snapshot used by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub http_app: bool,
    pub server: String,
    pub server_exists: bool,
    /// Module of the first TLS issuer (`internal`, `acme`), if any.
    pub tls_issuer: Option<String>,
    pub route_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Bootstrapper {
    client: AdminClient,
}

impl Bootstrapper {
    pub fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// Bring the server to `plan`, touching only what differs.
    pub async fn setup(&self, plan: &SetupPlan) -> CaddyResult<SetupReport> {
        tracing::info!(server = %plan.server_name, tls = plan.tls.label(), "Bootstrapping Caddy");
        let mut report = SetupReport::default();

        report.step("http-app", self.ensure_http_app()).await?;
        report.step("server", self.ensure_server(plan)).await?;
        report.step("tls-policy", self.ensure_tls_policy(plan)).await?;
        if let Some(install) = plan.install_trust {
            report.step("pki-trust", self.ensure_trust(install)).await?;
        }

        Ok(report)
    }

    /// Convenience form taking the flat options the CLI exposes.
    ///
    /// An empty `cf_token` means no ACME token.
    pub async fn setup_caddy(
        &self,
        cf_token: &str,
        server_name: &str,
        use_local_certs: bool,
        install_trust: Option<bool>,
    ) -> CaddyResult<SetupReport> {
        let plan = SetupPlan::builder()
            .server_name(server_name)
            .local_certs(use_local_certs)
            .acme_token(cf_token)
            .install_trust(install_trust)
            .build()?;
        self.setup(&plan).await
    }

    async fn ensure_http_app(&self) -> CaddyResult<bool> {
        Ok(self.client.ensure_path(HTTP_SERVERS).await? > 0)
    }

    async fn ensure_server(&self, plan: &SetupPlan) -> CaddyResult<bool> {
        let path = ConfigPath::new(HTTP_SERVERS).join(&plan.server_name);
        let desired_listen = Value::from(plan.listen.clone());

        match self.client.get_config(&path).await {
            Err(CaddyError::NotFound(_)) => {
                self.client.put_config(&path, &plan.server_body()).await?;
                Ok(true)
            }
            Err(e) => Err(e),
            Ok(existing) if existing.get("listen") == Some(&desired_listen) => Ok(false),
            Ok(_) => {
                // Only the listen addresses; existing routes stay.
                self.client.put_config(path.join("listen"), &desired_listen).await?;
                Ok(true)
            }
        }
    }

    async fn ensure_tls_policy(&self, plan: &SetupPlan) -> CaddyResult<bool> {
        let created = self.client.ensure_path(TLS_APP).await?;
        let desired = plan.tls.automation();
        if self.current(TLS_AUTOMATION).await?.as_ref() == Some(&desired) {
            return Ok(created > 0);
        }
        self.client.put_config(TLS_AUTOMATION, &desired).await?;
        Ok(true)
    }

    async fn ensure_trust(&self, install: bool) -> CaddyResult<bool> {
        let created = self.client.ensure_path(LOCAL_CA).await?;
        let path = ConfigPath::new(LOCAL_CA).join("install_trust");
        let desired = Value::Bool(install);
        if self.current(&path).await?.as_ref() == Some(&desired) {
            return Ok(created > 0);
        }
        self.client.put_config(&path, &desired).await?;
        Ok(true)
    }

    async fn current(&self, path: impl Into<ConfigPath>) -> CaddyResult<Option<Value>> {
        match self.client.get_config(path).await {
            Ok(value) => Ok(Some(value)),
            Err(CaddyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Best-effort overview of what is configured. Only the route listing can fail.
    pub async fn status(&self) -> CaddyResult<ServerStatus> {
        let http_app = self.client.has_path("/apps/http").await;
        let server_exists = self.client.has_path(self.client.server_path()).await;

        let tls_issuer = self
            .current(TLS_AUTOMATION)
            .await
            .ok()
            .flatten()
            .and_then(|automation| {
                automation
                    .pointer("/policies/0/issuers/0/module")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        let route_ids = if server_exists {
            match self.client.get_config(self.client.routes_path()).await {
                Ok(value) => RouteList::from_value(value)?.ids(),
                Err(CaddyError::NotFound(_)) => Vec::new(),
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };

        Ok(ServerStatus {
            http_app,
            server: self.client.server_name().to_string(),
            server_exists,
            tls_issuer,
            route_ids,
        })
    }
}
