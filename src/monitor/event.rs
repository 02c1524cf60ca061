//! Transfer-event trigger.
//!
//! [`EventTrigger::run`] polls and processes on one task, so a batch that
//! lands while a cycle runs is picked up by the next poll. The guard covers
//! callers that drive [`EventTrigger::handle_batch`] from several tasks.

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::interval;

use crate::blockchain::{Ledger, LedgerResult, TransferEvent};
use crate::endpoints::EndpointPool;
use crate::monitor::{Cycle, TriggerState};
use crate::rescue::RescueReport;

/// Runs a cycle for every non-empty batch of `Transfer` logs into the
/// watched contract. Repeatable: returns to `Waiting` after each cycle.
pub struct EventTrigger<L> {
    pool: Arc<EndpointPool<L>>,
    token: Address,
    recipient: Address,
    confirmations: u64,
    lookback: u64,
    interval: Duration,
    last_block: Option<u64>,
    /// Held for a whole cycle; a batch arriving meanwhile waits here.
    guard: Arc<Mutex<TriggerState>>,
}

impl<L: Ledger> EventTrigger<L> {
    pub fn new(
        pool: Arc<EndpointPool<L>>,
        token: Address,
        recipient: Address,
        confirmations: u64,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            token,
            recipient,
            confirmations,
            lookback: 0,
            interval,
            last_block: None,
            guard: Arc::new(Mutex::new(TriggerState::Waiting)),
        }
    }

    /// Scan `blocks` below the safe head on the first poll.
    pub fn with_lookback(mut self, blocks: u64) -> Self {
        self.lookback = blocks;
        self
    }

    /// `Processing` while a cycle holds the guard.
    pub fn state(&self) -> TriggerState {
        match self.guard.try_lock() {
            Ok(state) => *state,
            Err(_) => TriggerState::Processing,
        }
    }

    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    /// Logs in `(last_block, head - confirmations]`. The first call anchors
    /// `lookback` blocks below the safe head and scans up to it.
    pub async fn poll_batch(&mut self) -> LedgerResult<Vec<TransferEvent>> {
        let ledger = self.pool.active();
        let head = ledger.block_number().await?;
        let safe = head.saturating_sub(self.confirmations);

        let from = match self.last_block {
            Some(last) => last + 1,
            None => {
                let anchor = safe.saturating_sub(self.lookback);
                self.last_block = Some(anchor);
                tracing::info!(block = anchor, lookback = self.lookback, "Event trigger anchored");
                anchor + 1
            }
        };
        if safe < from {
            return Ok(Vec::new());
        }

        let events = ledger
            .transfer_events(self.token, self.recipient, from, safe)
            .await?;
        self.last_block = Some(safe);
        Ok(events)
    }

    /// Run one cycle for `events` under the guard. Empty batches do nothing.
    pub async fn handle_batch<C: Cycle>(
        &self,
        cycle: &C,
        events: &[TransferEvent],
    ) -> Option<Vec<RescueReport>> {
        if events.is_empty() {
            return None;
        }
        let mut state = self.guard.lock().await;
        *state = TriggerState::Processing;
        tracing::info!(
            events = events.len(),
            first_block = events[0].block_number,
            "Transfer batch received, running cycle"
        );
        let reports = cycle.run_cycle().await;
        *state = TriggerState::Waiting;
        Some(reports)
    }

    /// Watch until shutdown.
    pub async fn run<C: Cycle>(&mut self, cycle: &C, shutdown: &mut broadcast::Receiver<()>) {
        tracing::info!(
            token = %self.token,
            recipient = %self.recipient,
            confirmations = self.confirmations,
            lookback = self.lookback,
            "Starting event trigger"
        );

        let mut ticker = interval(self.interval);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Event trigger stopped");
                    return;
                }
                _ = ticker.tick() => {
                    match self.poll_batch().await {
                        Ok(events) => {
                            self.handle_batch(cycle, &events).await;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Log poll failed");
                            self.pool.note_failure(&e);
                        }
                    }
                }
            }
        }
    }
}
