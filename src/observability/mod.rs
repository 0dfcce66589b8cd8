//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events
//!     → logging.rs (filter, format, stderr)
//! ```

pub mod logging;

pub use logging::init_logging;
