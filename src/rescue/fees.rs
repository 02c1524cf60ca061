//! Two-tier fee estimation.
//!
//! Primary: the chain's precise estimation call, which prices the exact draft
//! and returns base fee, priority fee and gas limit. Fallback: generic
//! EIP-1559 fee query plus the caller's fixed gas limit. Quotes are fresh per
//! draft and never cached.

use crate::blockchain::{FeesPerGas, Ledger, LedgerError, LedgerResult, PreciseEstimate, TxDraft};
use crate::config::FeeConfig;
use crate::observability::metrics;
use crate::rescue::types::FeeQuote;

/// Which tier produced a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    Precise,
    Fallback,
}

impl FeeTier {
    pub fn as_str(self) -> &'static str {
        match self {
            FeeTier::Precise => "precise",
            FeeTier::Fallback => "fallback",
        }
    }
}

/// A quote plus how it was obtained.
#[derive(Debug, Clone)]
pub struct FeeEstimate {
    pub quote: FeeQuote,
    pub tier: FeeTier,
    /// Primary-tier failure that caused the fallback, if any.
    pub degraded: Option<LedgerError>,
}

/// Multipliers applied to precise-tier answers.
#[derive(Debug, Clone, Copy)]
pub struct FeeEstimator {
    base_multiplier: f64,
    priority_multiplier: f64,
}

impl FeeEstimator {
    pub fn new(base_multiplier: f64, priority_multiplier: f64) -> Self {
        Self { base_multiplier, priority_multiplier }
    }

    pub fn from_config(config: &FeeConfig) -> Self {
        Self::new(config.base_multiplier, config.priority_multiplier)
    }

    /// Quote `draft`, degrading silently to the fallback tier on any primary failure.
    ///
    /// Only errors when the fallback query fails as well.
    pub async fn estimate<L: Ledger>(
        &self,
        ledger: &L,
        draft: &TxDraft,
        fallback_gas_limit: u64,
    ) -> LedgerResult<FeeEstimate> {
        match ledger.estimate_precise(draft).await {
            Ok(precise) => {
                metrics::record_fee_tier(FeeTier::Precise.as_str());
                Ok(FeeEstimate {
                    quote: self.from_precise(&precise),
                    tier: FeeTier::Precise,
                    degraded: None,
                })
            }
            Err(reason) => {
                tracing::debug!(
                    endpoint = %ledger.endpoint(),
                    to = %draft.to,
                    error = %reason,
                    "Precise estimation failed, using fallback fees"
                );
                let fees = ledger.fees_per_gas().await?;
                metrics::record_fee_tier(FeeTier::Fallback.as_str());
                Ok(FeeEstimate {
                    quote: from_fallback(&fees, fallback_gas_limit),
                    tier: FeeTier::Fallback,
                    degraded: Some(reason),
                })
            }
        }
    }

    /// `priority = floor(p * pm)`, `max = floor(base * bm) + priority`.
    pub fn from_precise(&self, estimate: &PreciseEstimate) -> FeeQuote {
        let max_priority_fee_per_gas =
            apply_multiplier(estimate.priority_fee_per_gas, self.priority_multiplier);
        let max_fee_per_gas = apply_multiplier(estimate.base_fee_per_gas, self.base_multiplier)
            .saturating_add(max_priority_fee_per_gas);
        FeeQuote {
            gas_limit: estimate.gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }
}

/// Fallback quote: fees verbatim, gas limit verbatim.
pub fn from_fallback(fees: &FeesPerGas, gas_limit: u64) -> FeeQuote {
    FeeQuote {
        gas_limit,
        max_fee_per_gas: fees.max_fee_per_gas,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
    }
}

/// Multiply in floating point, then floor back to integer wei.
pub fn apply_multiplier(value: u128, multiplier: f64) -> u128 {
    (value as f64 * multiplier).floor() as u128
}
