//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! AdminClient::request
//!     → Transport (trait object)
//!         → transport.rs: HttpTransport (reqwest, direct)
//!         → tunnel.rs: TunnelTransport (ssh -L, then HttpTransport on the local port)
//!     → Caddy admin API
//! ```
//!
//! # Design Decisions
//! - The rest of the crate only sees `dyn Transport`
//! - No retries at this layer
//! - Timeouts come from the reqwest client configuration

pub mod transport;
pub mod tunnel;

pub use transport::{AdminRequest, AdminResponse, HttpTransport, Transport};
pub use tunnel::{SshTunnel, TunnelTransport};

#[cfg(test)]
pub(crate) mod mock;
