//! Resilience helpers.
//!
//! # Design Decisions
//! - No retries for admin API calls; retry policy belongs to the caller
//! - Backoff is used only to wait for local infrastructure (SSH tunnels)

pub mod backoff;

pub use backoff::Backoff;
