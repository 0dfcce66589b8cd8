//! Desired baseline for a Caddy instance.

use serde_json::{json, Value};
use std::fmt;

use crate::config::DEFAULT_SERVER_NAME;
use crate::error::{CaddyError, CaddyResult};

/// DNS providers usable for ACME DNS-01 challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsProvider {
    Cloudflare,
}

impl DnsProvider {
    pub fn module_name(&self) -> &'static str {
        match self {
            DnsProvider::Cloudflare => "cloudflare",
        }
    }
}

/// How certificates are issued.
#[derive(Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Caddy's internal CA.
    Internal,
    /// ACME with a DNS-01 challenge.
    AcmeDns { provider: DnsProvider, api_token: String },
}

// Tokens never reach logs.
impl fmt::Debug for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsMode::Internal => f.write_str("Internal"),
            TlsMode::AcmeDns { provider, .. } => f
                .debug_struct("AcmeDns")
                .field("provider", provider)
                .field("api_token", &"<redacted>")
                .finish(),
        }
    }
}

impl TlsMode {
    pub fn label(&self) -> &'static str {
        match self {
            TlsMode::Internal => "internal",
            TlsMode::AcmeDns { .. } => "acme",
        }
    }

    /// Value for `/apps/tls/automation`.
    pub fn automation(&self) -> Value {
        let issuer = match self {
            TlsMode::Internal => json!({ "module": "internal" }),
            TlsMode::AcmeDns { provider, api_token } => json!({
                "module": "acme",
                "challenges": {
                    "dns": {
                        "provider": {
                            "name": provider.module_name(),
                            "api_token": api_token,
                        }
                    }
                }
            }),
        };
        json!({ "policies": [{ "issuers": [issuer] }] })
    }
}

/// Validated bootstrap request. Build with [`SetupPlan::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPlan {
    pub server_name: String,
    pub tls: TlsMode,
    pub listen: Vec<String>,
    /// Reconcile the local CA's `install_trust` flag when set.
    pub install_trust: Option<bool>,
}

impl SetupPlan {
    pub fn builder() -> SetupPlanBuilder {
        SetupPlanBuilder::default()
    }

    /// Initial body for a server that does not exist yet.
    pub fn server_body(&self) -> Value {
        json!({
            "listen": self.listen,
            "routes": [],
            "protocols": ["h1", "h2"],
        })
    }
}

#[derive(Debug, Clone)]
pub struct SetupPlanBuilder {
    server_name: String,
    local_certs: bool,
    acme_token: Option<String>,
    provider: DnsProvider,
    listen: Vec<String>,
    install_trust: Option<bool>,
}

impl Default for SetupPlanBuilder {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            local_certs: false,
            acme_token: None,
            provider: DnsProvider::Cloudflare,
            listen: vec![":80".to_string(), ":443".to_string()],
            install_trust: None,
        }
    }
}

impl SetupPlanBuilder {
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    pub fn local_certs(mut self, enabled: bool) -> Self {
        self.local_certs = enabled;
        self
    }

    /// DNS provider token for ACME. Empty strings count as absent.
    pub fn acme_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.acme_token = if token.trim().is_empty() { None } else { Some(token) };
        self
    }

    pub fn dns_provider(mut self, provider: DnsProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn listen<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listen = addrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn install_trust(mut self, install: Option<bool>) -> Self {
        self.install_trust = install;
        self
    }

    pub fn build(self) -> CaddyResult<SetupPlan> {
        let server_name = self.server_name.trim().to_string();
        if server_name.is_empty() || server_name.contains('/') {
            return Err(CaddyError::InvalidSpec(format!("invalid server name '{}'", self.server_name)));
        }
        if self.listen.is_empty() {
            return Err(CaddyError::InvalidSpec("at least one listen address is required".to_string()));
        }

        let tls = match (self.local_certs, self.acme_token) {
            (true, Some(_)) => {
                return Err(CaddyError::InvalidSpec(
                    "local certificates and an ACME token are mutually exclusive".to_string(),
                ))
            }
            (true, None) => TlsMode::Internal,
            (false, Some(api_token)) => TlsMode::AcmeDns {
                provider: self.provider,
                api_token,
            },
            (false, None) => {
                return Err(CaddyError::InvalidSpec(
                    "ACME needs a DNS provider token; pass one or use local certificates".to_string(),
                ))
            }
        };

        if self.install_trust == Some(true) && tls != TlsMode::Internal {
            return Err(CaddyError::InvalidSpec(
                "install_trust only applies to local certificates".to_string(),
            ));
        }

        Ok(SetupPlan {
            server_name,
            tls,
            listen: self.listen,
            install_trust: self.install_trust,
        })
    }
}
