//! Wildcard domains and the per-subdomain proxies living under them.
//!
//! A wildcard route for `example.com` matches `*.example.com` and
//! `example.com`. Its handler chain is a `subroute` holding one route per
//! registered subdomain, followed by a `static_response` 404 for subdomains
//! nobody registered. Sub-proxies are inserted into that subroute.

use crate::error::{CaddyError, CaddyResult};
use crate::routing::route::{Handler, Route};

/// Host used for upstreams when none is given.
pub const DEFAULT_UPSTREAM_HOST: &str = "localhost";

/// Status answered for subdomains without a registered route.
pub const WILDCARD_FALLBACK_STATUS: u16 = 404;

/// ID of the wildcard route for `domain`.
pub fn wildcard_id(domain: &str) -> String {
    format!("wildcard-{}", domain)
}

impl Route {
    /// Wildcard container route for `domain`.
    pub fn wildcard(domain: &str) -> Self {
        Route::new(
            wildcard_id(domain),
            [format!("*.{}", domain), domain.to_string()],
            vec![
                Handler::Subroute { routes: Vec::new() },
                Handler::static_response(WILDCARD_FALLBACK_STATUS),
            ],
        )
    }
}

/// A subdomain proxied to one upstream per port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardSpec {
    pub domain: String,
    pub subdomain: String,
    pub ports: Vec<u16>,
    pub host: String,
}

impl WildcardSpec {
    /// Validate and build. An empty or absent `host` means loopback.
    pub fn new(domain: &str, subdomain: &str, ports: &[u16], host: Option<&str>) -> CaddyResult<Self> {
        let domain = domain.trim().trim_matches('.');
        let subdomain = subdomain.trim().trim_matches('.');

        if domain.is_empty() {
            return Err(CaddyError::InvalidSpec("domain must not be empty".to_string()));
        }
        if subdomain.is_empty() {
            return Err(CaddyError::InvalidSpec("subdomain must not be empty".to_string()));
        }
        if ports.is_empty() {
            return Err(CaddyError::InvalidSpec(format!(
                "no ports given for {}.{}",
                subdomain, domain
            )));
        }
        if ports.contains(&0) {
            return Err(CaddyError::InvalidSpec("port 0 is not a valid upstream".to_string()));
        }

        let host = match host.map(str::trim) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => DEFAULT_UPSTREAM_HOST.to_string(),
        };

        Ok(Self {
            domain: domain.to_string(),
            subdomain: subdomain.to_string(),
            ports: ports.to_vec(),
            host,
        })
    }

    /// Fully qualified host, also the route ID.
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }

    pub fn dials(&self) -> Vec<String> {
        self.ports.iter().map(|port| format!("{}:{}", self.host, port)).collect()
    }

    pub fn to_route(&self) -> Route {
        let fqdn = self.fqdn();
        Route::new(fqdn.clone(), [fqdn], vec![Handler::reverse_proxy(self.dials())])
    }
}
