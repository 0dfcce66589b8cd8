//! Route reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! Desired state (route, proxy, wildcard spec, batch)
//!     → routes.rs (fetch list, decide create / replace / conflict)
//!     → admin::tree (write back the full list)
//!
//! Batch:
//!     → batch.rs (ops in order, stop at first failure, report)
//! ```
//!
//! # Design Decisions
//! - Conflicts are explicit; replace must be requested
//! - Delete is idempotent and never reports NotFound
//! - No rollback of partially applied batches

pub mod batch;
pub mod routes;

pub use batch::{load_batch, parse_batch, BatchOp, BatchReport};
pub use routes::{AddMode, Reconciler};
