//! Admin API access.
//!
//! # Data Flow
//! ```text
//! caller
//!     → tree.rs (get/put/append/delete by ConfigPath, existence checks)
//!     → client.rs (request + status classification + JSON decode)
//!     → net::Transport
//! ```

pub mod client;
pub mod path;
pub mod tree;

pub use client::AdminClient;
pub use path::ConfigPath;
