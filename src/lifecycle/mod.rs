//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Logging/metrics → Wallets + targets
//!     → Endpoint pool → Chain-id check → Strategy → Trigger monitor
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Monitors stop at their next wait point → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, before any transaction is built
//! - A running burst is never interrupted by shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
