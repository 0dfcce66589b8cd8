//! Route reconciliation against the live route list.
//!
//! # Responsibilities
//! - Decide create / replace / conflict by route ID
//! - Expand wildcard specs into routes and nest them under their wildcard
//! - Idempotent delete by ID
//!
//! # Design Decisions
//! - Every operation re-fetches the list; nothing is cached between calls
//! - Read-modify-write of the whole list, last-write-wins. Concurrent writers
//!   from elsewhere can lose updates
//! - New routes go last (lowest priority) unless a position is given

use crate::admin::AdminClient;
use crate::error::{CaddyError, CaddyResult};
use crate::routing::list::insert_at;
use crate::routing::{wildcard_id, Route, RouteList, RoutePosition, WildcardSpec};

/// How `add_route_with` treats an existing ID and where it places the route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddMode {
    /// Overwrite a route with the same ID instead of failing with `Conflict`.
    pub replace: bool,
    /// Explicit slot. `None` appends new routes and keeps replaced ones where they were.
    pub position: Option<RoutePosition>,
}

impl AddMode {
    pub fn replace() -> Self {
        Self {
            replace: true,
            position: None,
        }
    }

    pub fn at(mut self, position: RoutePosition) -> Self {
        self.position = Some(position);
        self
    }
}

/// Converges the managed server's routes towards requested state.
#[derive(Debug, Clone)]
pub struct Reconciler {
    client: AdminClient,
}

impl Reconciler {
    pub fn new(client: AdminClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AdminClient {
        &self.client
    }

    /// Current route list. A server without routes yields an empty list.
    pub async fn fetch_routes(&self) -> CaddyResult<RouteList> {
        match self.client.get_config(self.client.routes_path()).await {
            Ok(value) => RouteList::from_value(value),
            Err(CaddyError::NotFound(_)) => Ok(RouteList::default()),
            Err(e) => Err(e),
        }
    }

    /// Decoded top-level routes; entries that do not decode are skipped.
    pub async fn list_routes(&self) -> CaddyResult<Vec<Route>> {
        Ok(self.fetch_routes().await?.decoded())
    }

    async fn store(&self, routes: RouteList) -> CaddyResult<()> {
        self.client
            .put_config(self.client.routes_path(), &routes.into_value())
            .await
    }

    /// Append `route`; `Conflict` if its ID is already present.
    pub async fn add_route(&self, route: &Route) -> CaddyResult<()> {
        self.add_route_with(route, AddMode::default()).await
    }

    pub async fn add_route_with(&self, route: &Route, mode: AddMode) -> CaddyResult<()> {
        let value = route.encode()?;
        let mut routes = self.fetch_routes().await?;

        if routes.contains_id(&route.id) {
            if !mode.replace {
                tracing::debug!(id = %route.id, "Route already exists");
                return Err(CaddyError::Conflict(route.id.clone()));
            }
            match mode.position {
                None => {
                    routes.replace_id(&route.id, value);
                }
                Some(position) => {
                    routes.remove_id(&route.id);
                    routes.insert(position, value);
                }
            }
            tracing::info!(id = %route.id, "Replacing route");
        } else {
            routes.insert(mode.position.unwrap_or_default(), value);
            tracing::info!(id = %route.id, "Adding route");
        }

        self.store(routes).await
    }

    /// Remove every route with `id`. Absent IDs are a successful no-op.
    ///
    /// Returns whether anything was removed.
    pub async fn delete_route(&self, id: &str) -> CaddyResult<bool> {
        let mut routes = self.fetch_routes().await?;
        let removed = routes.remove_id(id);
        if removed == 0 {
            tracing::debug!(id, "Route not present, nothing to delete");
            return Ok(false);
        }

        tracing::info!(id, removed, "Deleting route");
        self.store(routes).await?;
        Ok(true)
    }

    /// Proxy `from_host` to a single upstream. The route ID is `from_host`.
    ///
    /// A host covered by an existing wildcard route lands inside that
    /// wildcard's subroute, since the wildcard is terminal and would
    /// otherwise answer 404 before a later top-level route is reached.
    pub async fn add_reverse_proxy(&self, from_host: &str, to_addr: &str) -> CaddyResult<()> {
        self.add_reverse_proxy_with(from_host, to_addr, AddMode::default()).await
    }

    pub async fn add_reverse_proxy_with(&self, from_host: &str, to_addr: &str, mode: AddMode) -> CaddyResult<()> {
        let route = reverse_proxy_route(from_host, to_addr)?;
        let wildcards = covering_wildcards(&route.id);
        self.add_nested(&route, &wildcards, mode).await
    }

    /// Wildcard container for `*.<domain>` and `<domain>`.
    pub async fn add_wildcard_route(&self, domain: &str) -> CaddyResult<()> {
        let domain = domain.trim().trim_matches('.');
        if domain.is_empty() {
            return Err(CaddyError::InvalidSpec("domain must not be empty".to_string()));
        }
        self.add_route(&Route::wildcard(domain)).await
    }

    /// Proxy `<subdomain>.<domain>` to `host:port` for every port.
    pub async fn add_sub_reverse_proxy(
        &self,
        domain: &str,
        subdomain: &str,
        ports: &[u16],
        host: Option<&str>,
    ) -> CaddyResult<()> {
        let spec = WildcardSpec::new(domain, subdomain, ports, host)?;
        self.add_sub_proxy_with(&spec, AddMode::default()).await
    }

    /// Place the route for `spec` inside the domain's wildcard subroute when
    /// one exists, at top level otherwise.
    pub async fn add_sub_proxy_with(&self, spec: &WildcardSpec, mode: AddMode) -> CaddyResult<()> {
        tracing::debug!(id = %spec.fqdn(), upstreams = ?spec.dials(), "Expanding sub-proxy");
        self.add_nested(&spec.to_route(), &[wildcard_id(&spec.domain)], mode).await
    }

    /// Add `route` inside the subroute of the first wildcard in `wildcards`
    /// present at top level, or at top level when none is.
    async fn add_nested(&self, route: &Route, wildcards: &[String], mode: AddMode) -> CaddyResult<()> {
        let value = route.encode()?;
        let mut routes = self.fetch_routes().await?;

        if routes.contains_id(&route.id) {
            if !mode.replace {
                tracing::debug!(id = %route.id, "Route already exists");
                return Err(CaddyError::Conflict(route.id.clone()));
            }
            if mode.position.is_none() {
                routes.replace_id(&route.id, value);
                tracing::info!(id = %route.id, "Replacing route");
                return self.store(routes).await;
            }
            routes.remove_id(&route.id);
        }

        let position = mode.position.unwrap_or_default();
        let wildcard = wildcards
            .iter()
            .find(|id| routes.position_of(id).is_some())
            .cloned();
        match wildcard.as_deref().and_then(|id| routes.subroute_mut(id)) {
            Some(nested) => {
                insert_at(nested, position, value);
                tracing::info!(id = %route.id, wildcard = ?wildcard, "Adding route under wildcard");
            }
            None => {
                routes.insert(position, value);
                tracing::info!(id = %route.id, "Adding route");
            }
        }

        self.store(routes).await
    }
}

/// IDs of the wildcard routes whose host patterns match `host`: the parent
/// domain's (`*.<parent>`) first, then the host's own (apex match).
fn covering_wildcards(host: &str) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some((_, parent)) = host.split_once('.') {
        if parent.contains('.') {
            ids.push(wildcard_id(parent));
        }
    }
    ids.push(wildcard_id(host));
    ids
}

/// Validated single-upstream proxy route.
pub fn reverse_proxy_route(from_host: &str, to_addr: &str) -> CaddyResult<Route> {
    let from_host = from_host.trim();
    let to_addr = to_addr.trim();
    if from_host.is_empty() {
        return Err(CaddyError::InvalidSpec("source host must not be empty".to_string()));
    }
    if to_addr.is_empty() {
        return Err(CaddyError::InvalidSpec("upstream address must not be empty".to_string()));
    }
    Ok(Route::reverse_proxy(from_host, to_addr))
}
