//! One-shot balance-threshold trigger.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::blockchain::contracts::{decode_uint, IPermitToken};
use crate::blockchain::{Ledger, LedgerResult};
use crate::endpoints::EndpointPool;
use crate::monitor::{Cycle, TriggerState};
use crate::rescue::RescueReport;

/// What balance of the watched contract is compared to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceSource {
    Native,
    Token(Address),
}

/// Fires exactly once per process: the first time the watched balance
/// reaches the threshold, runs one cycle and is done.
pub struct PollTrigger<L> {
    pool: Arc<EndpointPool<L>>,
    watched: Address,
    source: BalanceSource,
    threshold: U256,
    interval: Duration,
    triggered: bool,
    state: TriggerState,
}

impl<L: Ledger> PollTrigger<L> {
    pub fn new(
        pool: Arc<EndpointPool<L>>,
        watched: Address,
        source: BalanceSource,
        threshold: U256,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            watched,
            source,
            threshold,
            interval,
            triggered: false,
            state: TriggerState::Waiting,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    async fn read_balance(&self, ledger: &L) -> LedgerResult<U256> {
        match self.source {
            BalanceSource::Native => ledger.balance(self.watched).await,
            BalanceSource::Token(token) => {
                let input = Bytes::from(IPermitToken::balanceOfCall { account: self.watched }.abi_encode());
                decode_uint(&ledger.call(token, input).await?)
            }
        }
    }

    /// One observation. True only for the first one at or above the threshold.
    pub async fn observe(&mut self) -> bool {
        if self.triggered {
            return false;
        }
        let ledger = self.pool.active();
        match self.read_balance(&ledger).await {
            Ok(balance) if balance >= self.threshold => {
                self.triggered = true;
                tracing::info!(%balance, threshold = %self.threshold, "Balance threshold crossed");
                true
            }
            Ok(balance) => {
                tracing::debug!(%balance, threshold = %self.threshold, "Below threshold");
                false
            }
            Err(e) => {
                tracing::warn!(endpoint = %ledger.endpoint(), error = %e, "Balance poll failed");
                self.pool.note_failure(&e);
                false
            }
        }
    }

    /// Poll until the threshold fires or shutdown. Returns the cycle's reports
    /// when it ran.
    pub async fn run<C: Cycle>(
        &mut self,
        cycle: &C,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Option<Vec<RescueReport>> {
        if self.state == TriggerState::Done {
            return None;
        }
        tracing::info!(
            watched = %self.watched,
            threshold = %self.threshold,
            interval_ms = self.interval.as_millis() as u64,
            "Starting poll trigger"
        );

        let mut ticker = interval(self.interval);
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Poll trigger stopped before firing");
                    return None;
                }
                _ = ticker.tick() => {
                    if self.observe().await {
                        self.state = TriggerState::Processing;
                        let reports = cycle.run_cycle().await;
                        self.state = TriggerState::Done;
                        return Some(reports);
                    }
                }
            }
        }
    }
}
