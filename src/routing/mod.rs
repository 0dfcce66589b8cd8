//! Route model subsystem.
//!
//! # Data Flow
//! ```text
//! Caller input (host, upstream, wildcard spec)
//!     → route.rs / wildcard.rs (build Route, encode to Caddy JSON)
//!     → list.rs (place into the fetched route list)
//!
//! Fetched route list (raw JSON)
//!     → list.rs (ID search through subroutes)
//!     → route.rs (decode for inspection)
//! ```
//!
//! # Design Decisions
//! - Route lists stay raw JSON; only routes we inspect are decoded
//! - Route ID (`@id`) is the identity and idempotency key
//! - Decoding is structural only

pub mod list;
pub mod route;
pub mod wildcard;

pub use list::{RouteList, RoutePosition};
pub use route::{Handler, MatchSet, Route, Upstream};
pub use wildcard::{wildcard_id, WildcardSpec};
