//! Config tree accessor.
//!
//! # Responsibilities
//! - Read and write subtrees of the live configuration by path
//! - Best-effort existence checks for paths and route IDs
//!
//! # Design Decisions
//! - Writes are last-write-wins: no ETag or version check
//! - `put_config` replaces with PATCH when the path exists and creates with
//!   POST otherwise, matching Caddy's verb semantics for object keys
//! - `has_path` / `has_id` collapse every error to `false`; they are status
//!   helpers, not an existence oracle

use reqwest::Method;
use serde_json::{json, Value};

use crate::admin::client::AdminClient;
use crate::admin::path::ConfigPath;
use crate::error::{CaddyError, CaddyResult};
use crate::routing::RouteList;

/// Error text Caddy uses when a path walks through a missing node.
const INVALID_TRAVERSAL: &str = "invalid traversal path";

impl AdminClient {
    /// Fetch the subtree at `path`.
    ///
    /// Caddy answers `null` for an unset key and 400 "invalid traversal path"
    /// when an intermediate node is missing; both, and HTTP 404, map to
    /// `CaddyError::NotFound`.
    pub async fn get_config(&self, path: impl Into<ConfigPath>) -> CaddyResult<Value> {
        let path = path.into();
        match self.request(Method::GET, &path.api_path(), None).await {
            Ok(Some(Value::Null)) | Ok(None) => Err(CaddyError::NotFound(path.to_string())),
            Ok(Some(value)) => Ok(value),
            Err(CaddyError::Transport { status: Some(404), .. }) => Err(CaddyError::NotFound(path.to_string())),
            Err(CaddyError::Transport {
                status: Some(400),
                detail,
            }) if detail.contains(INVALID_TRAVERSAL) => {
                tracing::trace!(path = %path, "Missing intermediate node");
                Err(CaddyError::NotFound(path.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the subtree at `path` wholesale.
    pub async fn put_config(&self, path: impl Into<ConfigPath>, value: &Value) -> CaddyResult<()> {
        let path = path.into();
        let method = match self.get_config(&path).await {
            Ok(_) => Method::PATCH,
            Err(CaddyError::NotFound(_)) => Method::POST,
            Err(e) => return Err(e),
        };

        tracing::debug!(path = %path, method = %method, "Writing config subtree");
        self.request(method, &path.api_path(), Some(value)).await?;
        Ok(())
    }

    /// Append `value` to the array at `path`, or set it when `path` is an object key.
    pub async fn append_config(&self, path: impl Into<ConfigPath>, value: &Value) -> CaddyResult<()> {
        let path = path.into();
        tracing::debug!(path = %path, "Appending to config subtree");
        self.request(Method::POST, &path.api_path(), Some(value)).await?;
        Ok(())
    }

    /// Remove the subtree at `path`.
    pub async fn delete_config(&self, path: impl Into<ConfigPath>) -> CaddyResult<()> {
        let path = path.into();
        tracing::debug!(path = %path, "Deleting config subtree");
        match self.request(Method::DELETE, &path.api_path(), None).await {
            Err(CaddyError::Transport { status: Some(404), .. }) => Err(CaddyError::NotFound(path.to_string())),
            other => other.map(|_| ()),
        }
    }

    /// Create every missing node along `path` as an empty object.
    ///
    /// Returns the number of nodes created.
    pub async fn ensure_path(&self, path: impl Into<ConfigPath>) -> CaddyResult<usize> {
        let path = path.into();
        let mut created = 0;

        if !self.exists(&ConfigPath::root()).await? {
            self.append_config(ConfigPath::root(), &json!({})).await?;
            created += 1;
        }
        for node in path.ancestors() {
            if !self.exists(&node).await? {
                self.append_config(&node, &json!({})).await?;
                created += 1;
            }
        }

        if created > 0 {
            tracing::debug!(path = %path, created, "Initialized config path");
        }
        Ok(created)
    }

    /// Best-effort existence check. Never fails.
    pub async fn has_path(&self, path: impl Into<ConfigPath>) -> bool {
        let path = path.into();
        match self.get_config(&path).await {
            Ok(_) => true,
            Err(CaddyError::NotFound(_)) => false,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Existence check failed, reporting absent");
                false
            }
        }
    }

    /// Best-effort search of the managed server's routes, subroutes included.
    pub async fn has_id(&self, id: &str) -> bool {
        match self.get_config(self.routes_path()).await.and_then(RouteList::from_value) {
            Ok(routes) => routes.contains_id(id),
            Err(CaddyError::NotFound(_)) => false,
            Err(e) => {
                tracing::debug!(id, error = %e, "Route ID lookup failed, reporting absent");
                false
            }
        }
    }

    async fn exists(&self, path: &ConfigPath) -> CaddyResult<bool> {
        match self.get_config(path).await {
            Ok(_) => Ok(true),
            Err(CaddyError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::mock::ScriptedTransport;
    use std::sync::Arc;

    fn client(transport: &Arc<ScriptedTransport>) -> AdminClient {
        AdminClient::new(transport.clone())
    }

    #[tokio::test]
    async fn test_null_body_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new(vec![(200, "null\n")]));
        let err = client(&transport).get_config("/apps/http").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(transport.requests()[0].path, "/config/apps/http");
    }

    #[tokio::test]
    async fn test_non_success_carries_body() {
        let transport = Arc::new(ScriptedTransport::new(vec![(400, "{\"error\":\"bad\"}")]));
        let err = client(&transport).get_config("/apps").await.unwrap_err();
        match err {
            CaddyError::Transport { status, detail } => {
                assert_eq!(status, Some(400));
                assert!(detail.contains("bad"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_intermediate_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            (400, "{\"error\":\"invalid traversal path at: config/apps/http\"}\n"),
            (400, "{\"error\":\"invalid traversal path at: config/apps\"}\n"),
        ]));
        let client = client(&transport);

        let err = client.get_config("/apps/http/servers/srv0/routes").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!client.has_path("/apps/http").await);
    }

    #[tokio::test]
    async fn test_put_creates_then_replaces() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            (200, "null"),
            (200, ""),
            (200, "{\"a\":1}"),
            (200, ""),
        ]));
        let admin = client(&transport);
        admin.put_config("/apps/tls", &json!({"a": 1})).await.unwrap();
        admin.put_config("/apps/tls", &json!({"a": 2})).await.unwrap();

        let methods: Vec<Method> = transport.requests().into_iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::GET, Method::POST, Method::GET, Method::PATCH]);
    }

    #[tokio::test]
    async fn test_has_path_swallows_errors() {
        let transport = Arc::new(ScriptedTransport::new(vec![(500, "down"), (200, "{}")]));
        let admin = client(&transport);
        assert!(!admin.has_path("/apps").await);
        assert!(admin.has_path("/apps").await);
    }

    #[tokio::test]
    async fn test_ensure_path_creates_missing_nodes() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            (200, "{\"apps\":{}}"),
            (200, "{}"),
            (200, "null"),
            (200, ""),
        ]));
        let created = client(&transport).ensure_path("/apps/tls").await.unwrap();
        assert_eq!(created, 1);

        let last = transport.requests().pop().unwrap();
        assert_eq!(last.method, Method::POST);
        assert_eq!(last.path, "/config/apps/tls");
        assert_eq!(last.body, Some(json!({})));
    }
}
