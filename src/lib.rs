//! Caddy admin API client and route reconciler

pub mod admin;
pub mod config;
pub mod error;
pub mod net;
pub mod reconcile;
pub mod routing;
pub mod setup;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use admin::{AdminClient, ConfigPath};
pub use config::ClientConfig;
pub use error::{CaddyError, CaddyResult};
pub use reconcile::{BatchOp, Reconciler};
pub use routing::{Route, WildcardSpec};
pub use setup::{Bootstrapper, SetupPlan};
