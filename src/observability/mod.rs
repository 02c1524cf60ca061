//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per rescue attempt)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every attempt carries a UUID `attempt_id` in its span and its report
//! - Private keys never reach a log field
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
