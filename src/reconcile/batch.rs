//! Sequential batches of route operations.
//!
//! A batch stops at the first failing operation. Operations already applied
//! stay applied; the report says exactly which ran, which failed and which
//! never started.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{CaddyError, CaddyResult};
use crate::reconcile::routes::{AddMode, Reconciler};
use crate::routing::WildcardSpec;

/// One route operation, as written in a batch file.
///
/// ```toml
/// [[ops]]
/// op = "add-proxy"
/// from = "api.example.com"
/// to = "localhost:8080"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum BatchOp {
    AddProxy {
        from: String,
        to: String,
        #[serde(default)]
        replace: bool,
    },
    DeleteRoute {
        id: String,
    },
    AddWildcard {
        domain: String,
    },
    AddSubProxy {
        domain: String,
        subdomain: String,
        ports: Vec<u16>,
        #[serde(default)]
        host: Option<String>,
        #[serde(default)]
        replace: bool,
    },
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::AddProxy { from, to, .. } => write!(f, "add-proxy {} -> {}", from, to),
            BatchOp::DeleteRoute { id } => write!(f, "delete-route {}", id),
            BatchOp::AddWildcard { domain } => write!(f, "add-wildcard {}", domain),
            BatchOp::AddSubProxy {
                domain,
                subdomain,
                ports,
                ..
            } => write!(f, "add-sub-proxy {}.{} {:?}", subdomain, domain, ports),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchFile {
    #[serde(default)]
    ops: Vec<BatchOp>,
}

/// Parse a TOML batch file.
pub fn load_batch(path: &Path) -> CaddyResult<Vec<BatchOp>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CaddyError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    parse_batch(&content)
}

pub fn parse_batch(content: &str) -> CaddyResult<Vec<BatchOp>> {
    let file: BatchFile = toml::from_str(content).map_err(|e| CaddyError::InvalidSpec(e.to_string()))?;
    Ok(file.ops)
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub applied: Vec<BatchOp>,
    pub failed: Option<(BatchOp, CaddyError)>,
    pub skipped: Vec<BatchOp>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }

    /// The failing operation's error, if any.
    pub fn into_result(self) -> CaddyResult<Vec<BatchOp>> {
        match self.failed {
            Some((_, err)) => Err(err),
            None => Ok(self.applied),
        }
    }
}

impl Reconciler {
    /// Apply a single batch operation.
    pub async fn apply(&self, op: &BatchOp) -> CaddyResult<()> {
        match op {
            BatchOp::AddProxy { from, to, replace } => {
                let mode = AddMode {
                    replace: *replace,
                    position: None,
                };
                self.add_reverse_proxy_with(from, to, mode).await
            }
            BatchOp::DeleteRoute { id } => self.delete_route(id).await.map(|_| ()),
            BatchOp::AddWildcard { domain } => self.add_wildcard_route(domain).await,
            BatchOp::AddSubProxy {
                domain,
                subdomain,
                ports,
                host,
                replace,
            } => {
                let spec = WildcardSpec::new(domain, subdomain, ports, host.as_deref())?;
                let mode = AddMode {
                    replace: *replace,
                    position: None,
                };
                self.add_sub_proxy_with(&spec, mode).await
            }
        }
    }

    /// Apply `ops` in order, stopping at the first failure. No rollback.
    pub async fn apply_batch(&self, ops: Vec<BatchOp>) -> BatchReport {
        let mut report = BatchReport::default();
        let mut ops = ops.into_iter();

        for op in ops.by_ref() {
            match self.apply(&op).await {
                Ok(()) => {
                    tracing::debug!(op = %op, "Batch operation applied");
                    report.applied.push(op);
                }
                Err(e) => {
                    tracing::warn!(op = %op, error = %e, applied = report.applied.len(), "Batch stopped");
                    report.failed = Some((op, e));
                    break;
                }
            }
        }

        report.skipped = ops.collect();
        report
    }
}
