//! Environment bootstrap subsystem.
//!
//! # Data Flow
//! ```text
//! Caller options (server name, local certs / ACME token, trust)
//!     → plan.rs (validate once, build SetupPlan)
//!     → bootstrap.rs (http-app → server → tls-policy → pki-trust)
//!         each step: read subtree, compare, write only on difference
//! ```
//!
//! # Design Decisions
//! - Steps run in order and stop at the first failure
//! - Existing servers keep their routes; only `listen` is reconciled
//! - DNS tokens are redacted from Debug output

pub mod bootstrap;
pub mod plan;

pub use bootstrap::{Bootstrapper, ServerStatus, SetupReport};
pub use plan::{DnsProvider, SetupPlan, TlsMode};
