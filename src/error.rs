//! Error taxonomy shared by every layer of the client.

use thiserror::Error;

/// Errors returned by admin API operations.
#[derive(Debug, Error)]
pub enum CaddyError {
    /// Network failure or non-2xx response from the admin API.
    #[error("admin API transport error{}: {detail}", status_suffix(.status))]
    Transport { status: Option<u16>, detail: String },

    /// Addressed config path or route ID is absent.
    #[error("config path not found: {0}")]
    NotFound(String),

    /// A route with this ID already exists and replace was not requested.
    #[error("route '{0}' already exists")]
    Conflict(String),

    /// Malformed JSON from the server, or a route that cannot be encoded.
    #[error("schema error: {0}")]
    Schema(String),

    /// Caller-supplied parameters failed validation.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// A bootstrap step failed.
    #[error("setup step '{step}' failed: {source}")]
    Setup {
        step: &'static str,
        #[source]
        source: Box<CaddyError>,
    },

    /// Client configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl CaddyError {
    pub(crate) fn network(err: impl std::fmt::Display) -> Self {
        CaddyError::Transport {
            status: None,
            detail: err.to_string(),
        }
    }

    pub(crate) fn schema(err: impl std::fmt::Display) -> Self {
        CaddyError::Schema(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CaddyError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CaddyError::Conflict(_))
    }

    /// HTTP status code, when the admin API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CaddyError::Transport { status, .. } => *status,
            CaddyError::Setup { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Result type for admin API operations.
pub type CaddyResult<T> = Result<T, CaddyError>;
