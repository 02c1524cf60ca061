//! Rescue subsystem: the burst orchestrator and its components.
//!
//! # Data Flow
//! ```text
//! TargetIdentity
//!     → registry.rs      (skip if already rescued)
//!     → eligibility.rs   (calculateAllocation >= expected, else abort)
//!     → nonce.rs + strategy.rs::authorize   (concurrently; permit signed here)
//!     → fees.rs ×3       (fund / claim / extract drafts, concurrently)
//!     → orchestrator.rs  (BurstPlan: nonces, quotes, funding = target gas cost)
//!     → submitter.rs     (sign all, then dispatch all three concurrently)
//!     → reconciler.rs    (claim + extract receipts under one bound)
//!     → RescueReport
//! ```
//!
//! # Design Decisions
//! - One orchestration skeleton; the extract leg is a pluggable strategy
//! - Every attempt yields a report, aborts included; nothing stops the cycle
//! - No retries within a cycle; transient endpoint faults rotate the pool
//! - Targets run one at a time, separated by a minimum spacing

pub mod eligibility;
pub mod error;
pub mod fees;
pub mod nonce;
pub mod orchestrator;
pub mod permit;
pub mod reconciler;
pub mod registry;
pub mod scheduler;
pub mod strategy;
pub mod submitter;
pub mod types;

pub use error::{RescueError, RescueResult};
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use registry::CompletionRegistry;
pub use strategy::{ExtractionStrategy, NativeExtraction, PermitExtraction};
pub use types::{
    AbortReason, AcceptedLegs, BurstHashes, FundingObservation, LegStatus, RescueOutcome,
    RescueReport, SettlementReport, TargetIdentity,
};
