//! Settlement reconciliation.
//!
//! Claim and extract receipts are awaited concurrently, each under the same
//! bound. A leg that times out is reported as such and never cancels the
//! other. The funding leg is only looked up once, afterwards, without waiting.
//! Every lookup goes through the pool's active endpoint, so an endpoint fault
//! mid-wait moves the remaining polls to the next endpoint.

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::blockchain::{Ledger, ReceiptStatus};
use crate::config::BurstConfig;
use crate::endpoints::EndpointPool;
use crate::observability::metrics;
use crate::rescue::types::{BurstHashes, FundingObservation, Leg, LegStatus, SettlementReport};

#[derive(Debug, Clone, Copy)]
pub struct SettlementReconciler {
    timeout: Duration,
    poll_interval: Duration,
}

impl SettlementReconciler {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self { timeout, poll_interval }
    }

    pub fn from_config(config: &BurstConfig) -> Self {
        Self::new(
            Duration::from_secs(config.settlement_timeout_secs),
            Duration::from_millis(config.receipt_poll_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll the receipt of `hash` until it is mined or the bound elapses.
    ///
    /// Lookup errors are logged and polling continues; only the bound ends it.
    /// Endpoint faults rotate the pool before the next poll.
    pub async fn await_leg<L: Ledger>(
        &self,
        pool: &EndpointPool<L>,
        leg: Leg,
        hash: TxHash,
    ) -> LegStatus {
        let poll = async {
            loop {
                let index = pool.active_index();
                let ledger = pool.active();
                match ledger.receipt_status(hash).await {
                    Ok(Some(ReceiptStatus::Succeeded)) => return LegStatus::Success,
                    Ok(Some(ReceiptStatus::Reverted)) => return LegStatus::Failure,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(
                            leg = leg.as_str(),
                            tx_hash = %hash,
                            endpoint = %ledger.endpoint(),
                            error = %e,
                            "Receipt lookup failed, still waiting"
                        );
                        pool.note_failure_at(index, &e);
                    }
                }
                sleep(self.poll_interval).await;
            }
        };

        let status = match timeout(self.timeout, poll).await {
            Ok(status) => status,
            Err(_) => LegStatus::TimedOut,
        };
        metrics::record_leg(leg.as_str(), leg_status_label(status));
        status
    }

    /// One lookup of the funding receipt. Never waits.
    pub async fn observe_funding<L: Ledger>(&self, ledger: &L, hash: TxHash) -> FundingObservation {
        match ledger.receipt_status(hash).await {
            Ok(Some(ReceiptStatus::Succeeded)) => FundingObservation::Confirmed,
            Ok(Some(ReceiptStatus::Reverted)) => FundingObservation::Reverted,
            Ok(None) => FundingObservation::Unobserved,
            Err(e) => {
                tracing::debug!(tx_hash = %hash, error = %e, "Funding receipt lookup failed");
                FundingObservation::Unobserved
            }
        }
    }

    /// Await both critical legs, then observe funding.
    pub async fn reconcile<L: Ledger>(
        &self,
        pool: &EndpointPool<L>,
        hashes: &BurstHashes,
    ) -> SettlementReport {
        let (claim, extract) = tokio::join!(
            self.await_leg(pool, Leg::Claim, hashes.claim),
            self.await_leg(pool, Leg::Extract, hashes.extract),
        );
        let funding = self.observe_funding(&*pool.active(), hashes.fund).await;

        if funding == FundingObservation::Reverted {
            tracing::warn!(tx_hash = %hashes.fund, "Funding leg reverted");
        }

        SettlementReport { claim, extract, funding }
    }
}

pub fn leg_status_label(status: LegStatus) -> &'static str {
    match status {
        LegStatus::Success => "success",
        LegStatus::Failure => "failure",
        LegStatus::TimedOut => "timed_out",
    }
}
