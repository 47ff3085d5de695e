//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! io subsystem produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (request and response counters)
//! ```
//!
//! # Design Decisions
//! - Every dispatch carries a request ID in its log events
//! - Metrics are cheap (atomic increments) and go to whatever recorder the
//!   embedding application installs

pub mod logging;
pub mod metrics;
