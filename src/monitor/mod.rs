//! Trigger monitors.
//!
//! # Data Flow
//! ```text
//! poll.rs:  ticker → airdrop balance >= threshold? → one cycle → DONE
//! event.rs: ticker → Transfer logs into the airdrop → cycle per batch → WAITING
//! ```
//!
//! # Design Decisions
//! - Monitors drive a [`Cycle`], not the orchestrator directly
//! - Errors while waiting rotate the pool and keep the monitor waiting
//! - Shutdown is observed only between cycles; a running burst completes

pub mod event;
pub mod poll;

pub use event::EventTrigger;
pub use poll::{BalanceSource, PollTrigger};

use crate::blockchain::Ledger;
use crate::rescue::{ExtractionStrategy, Orchestrator, RescueReport, TargetIdentity};

/// Where a monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Waiting,
    Processing,
    /// Terminal; only the poll trigger reaches it.
    Done,
}

/// A full pass over every target.
#[allow(async_fn_in_trait)]
pub trait Cycle {
    async fn run_cycle(&self) -> Vec<RescueReport>;
}

/// The orchestrator bound to the process's target list.
pub struct RescueCycle<'a, L, S> {
    orchestrator: &'a Orchestrator<L, S>,
    targets: &'a [TargetIdentity],
}

impl<'a, L, S> RescueCycle<'a, L, S> {
    pub fn new(orchestrator: &'a Orchestrator<L, S>, targets: &'a [TargetIdentity]) -> Self {
        Self { orchestrator, targets }
    }
}

impl<L: Ledger, S: ExtractionStrategy> Cycle for RescueCycle<'_, L, S> {
    async fn run_cycle(&self) -> Vec<RescueReport> {
        self.orchestrator.run_cycle(self.targets).await
    }
}
