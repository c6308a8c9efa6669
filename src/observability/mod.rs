//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Store operations produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and gauges via the `metrics` facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a recorder itself
//! - `logging::init` is a convenience for binaries and tests
//! - Metrics are cheap (no-ops without a recorder)

pub mod logging;
pub mod metrics;
