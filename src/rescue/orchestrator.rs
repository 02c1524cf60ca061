//! Per-target burst orchestration.
//!
//! One skeleton for every airdrop; the [`ExtractionStrategy`] supplies the
//! extract leg. Targets are processed one at a time, so nothing here needs
//! to coordinate nonces or pool state with another attempt.

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::{Ledger, LedgerError, TxDraft, Wallet};
use crate::config::validation::{parse_address, parse_selector, ValidationError};
use crate::config::RescueConfig;
use crate::endpoints::EndpointPool;
use crate::observability::metrics;
use crate::rescue::eligibility::EligibilityVerifier;
use crate::rescue::error::{RescueError, RescueResult};
use crate::rescue::fees::{FeeEstimate, FeeEstimator};
use crate::rescue::nonce::NonceAllocator;
use crate::rescue::reconciler::SettlementReconciler;
use crate::rescue::registry::{CompletionRecord, CompletionRegistry};
use crate::rescue::scheduler::SpacingPolicy;
use crate::rescue::strategy::{ExtractContext, ExtractionStrategy};
use crate::rescue::submitter::BurstSubmitter;
use crate::rescue::types::{
    BurstHashes, BurstPlan, Call, Leg, RescueOutcome, RescueReport, SettlementReport, SignerRole,
    TargetIdentity, TxIntent,
};

/// Everything the orchestrator needs from configuration, already parsed.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub airdrop: Address,
    pub claim_selector: FixedBytes<4>,
    pub fund_gas_limit: u64,
    pub claim_gas_limit: u64,
    pub estimator: FeeEstimator,
    pub reconciler: SettlementReconciler,
    pub target_spacing: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &RescueConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            airdrop: parse_address("contracts.airdrop", &config.contracts.airdrop)?,
            claim_selector: parse_selector(&config.contracts.claim_selector)?,
            fund_gas_limit: config.fees.fund_gas_limit,
            claim_gas_limit: config.fees.claim_gas_limit,
            estimator: FeeEstimator::from_config(&config.fees),
            reconciler: SettlementReconciler::from_config(&config.burst),
            target_spacing: Duration::from_millis(config.burst.target_spacing_ms),
        })
    }

    fn claim_call(&self) -> Call {
        Call {
            to: self.airdrop,
            value: U256::ZERO,
            input: Bytes::copy_from_slice(self.claim_selector.as_slice()),
        }
    }
}

/// Runs rescue attempts against the pool's active endpoint.
pub struct Orchestrator<L, S> {
    pool: Arc<EndpointPool<L>>,
    relayer: Wallet,
    strategy: S,
    settings: OrchestratorSettings,
    verifier: EligibilityVerifier,
    nonces: NonceAllocator,
    registry: CompletionRegistry,
}

impl<L: Ledger, S: ExtractionStrategy> Orchestrator<L, S> {
    pub fn new(
        pool: Arc<EndpointPool<L>>,
        relayer: Wallet,
        strategy: S,
        settings: OrchestratorSettings,
        registry: CompletionRegistry,
    ) -> Self {
        let verifier = EligibilityVerifier::new(settings.airdrop);
        Self {
            pool,
            relayer,
            strategy,
            settings,
            verifier,
            nonces: NonceAllocator,
            registry,
        }
    }

    pub fn pool(&self) -> &Arc<EndpointPool<L>> {
        &self.pool
    }

    pub fn registry(&self) -> &CompletionRegistry {
        &self.registry
    }

    /// Process `targets` strictly in order, spacing their starts.
    ///
    /// Always returns one report per target; no attempt's failure stops the loop.
    pub async fn run_cycle(&self, targets: &[TargetIdentity]) -> Vec<RescueReport> {
        let mut spacing = SpacingPolicy::new(self.settings.target_spacing);
        let mut reports = Vec::with_capacity(targets.len());

        for target in targets {
            let delay = spacing.delay_before(Instant::now());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            spacing.mark_started(Instant::now());
            reports.push(self.rescue(target).await);
        }

        let rescued = reports.iter().filter(|r| r.outcome_label() == "rescued").count();
        tracing::info!(
            targets = targets.len(),
            rescued,
            strategy = self.strategy.name(),
            "Rescue cycle finished"
        );
        reports
    }

    /// One attempt for `target`. Never fails; the outcome lives in the report.
    pub async fn rescue(&self, target: &TargetIdentity) -> RescueReport {
        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "rescue",
            attempt_id = %attempt_id,
            address = %target.address()
        );

        let outcome = async {
            if self.registry.is_completed(&target.address()) {
                tracing::info!("Target already rescued, skipping");
                return RescueOutcome::AlreadyRescued;
            }
            match self.execute(target, attempt_id).await {
                Ok((hashes, settlement)) => RescueOutcome::Settled { hashes, settlement },
                Err(e) => {
                    tracing::warn!(error = %e, "Rescue attempt aborted");
                    RescueOutcome::Aborted(e.into())
                }
            }
        }
        .instrument(span.clone())
        .await;

        let report = RescueReport { attempt_id, target: target.address(), outcome };
        metrics::record_attempt(report.outcome_label());
        span.in_scope(|| match serde_json::to_string(&report) {
            Ok(json) => tracing::info!(outcome = report.outcome_label(), report = %json, "Rescue report"),
            Err(_) => tracing::info!(outcome = report.outcome_label(), "Rescue report"),
        });
        report
    }

    /// Rotate on endpoint faults, then hand the error back.
    fn fault(&self, err: LedgerError) -> RescueError {
        self.pool.note_failure(&err);
        RescueError::Transport(err)
    }

    fn fault_rescue(&self, err: RescueError) -> RescueError {
        if let RescueError::Transport(e) = &err {
            self.pool.note_failure(e);
        }
        err
    }

    fn signer_address(&self, role: SignerRole, target: &TargetIdentity) -> Address {
        match role {
            SignerRole::Relayer => self.relayer.address(),
            SignerRole::Target => target.address(),
        }
    }

    async fn execute(
        &self,
        target: &TargetIdentity,
        attempt_id: Uuid,
    ) -> RescueResult<(BurstHashes, SettlementReport)> {
        let mut ledger = self.pool.active();
        let relayer = self.relayer.address();
        let owner = target.address();

        let eligibility = self
            .verifier
            .verify(&*ledger, owner, target.expected_amount())
            .await
            .map_err(|e| self.fault(e))?;
        if !eligibility.allowed() {
            return Err(RescueError::Ineligible {
                allocation: eligibility.allocation,
                expected: eligibility.expected,
            });
        }
        let allocation = eligibility.allocation;
        tracing::debug!(%allocation, "Allocation verified");

        let ctx = ExtractContext { target, relayer, claim_amount: allocation };

        let (relayer_nonces, target_nonces, auth) = tokio::join!(
            self.nonces.allocate(&*ledger, relayer),
            self.nonces.allocate(&*ledger, owner),
            self.strategy.authorize(&*ledger, &ctx),
        );
        let mut relayer_nonces = relayer_nonces.map_err(|e| self.fault(e))?;
        let mut target_nonces = target_nonces.map_err(|e| self.fault(e))?;
        let auth = auth.map_err(|e| self.fault_rescue(e))?;

        let extract_signer = self.strategy.extract_signer();
        let extract_from = self.signer_address(extract_signer, target);
        let claim_call = self.settings.claim_call();
        let extract_draft_call = self.strategy.extract_call(&ctx, &auth, None)?;

        let fund_draft = TxDraft { from: relayer, to: owner, value: U256::ZERO, input: Bytes::new() };
        let claim_draft = TxDraft {
            from: owner,
            to: claim_call.to,
            value: claim_call.value,
            input: claim_call.input.clone(),
        };
        let extract_draft = TxDraft {
            from: extract_from,
            to: extract_draft_call.to,
            value: extract_draft_call.value,
            input: extract_draft_call.input,
        };

        let estimator = &self.settings.estimator;
        let (fund_fee, claim_fee, extract_fee) = tokio::join!(
            estimator.estimate(&*ledger, &fund_draft, self.settings.fund_gas_limit),
            estimator.estimate(&*ledger, &claim_draft, self.settings.claim_gas_limit),
            estimator.estimate(&*ledger, &extract_draft, self.strategy.fallback_gas_limit()),
        );
        let fund_fee = fund_fee.map_err(|e| self.fault(e))?;
        let claim_fee = claim_fee.map_err(|e| self.fault(e))?;
        let extract_fee = extract_fee.map_err(|e| self.fault(e))?;

        if degraded_by_endpoint(&[&fund_fee, &claim_fee, &extract_fee]) {
            ledger = self.pool.rotate();
        }

        let extract_call = self.strategy.extract_call(&ctx, &auth, Some(&extract_fee.quote))?;

        let mut plan = BurstPlan {
            fund: TxIntent {
                leg: Leg::Fund,
                signer: SignerRole::Relayer,
                from: relayer,
                call: Call { to: owner, value: U256::ZERO, input: Bytes::new() },
                nonce: relayer_nonces.next_nonce(),
                quote: fund_fee.quote,
            },
            claim: TxIntent {
                leg: Leg::Claim,
                signer: SignerRole::Target,
                from: owner,
                call: claim_call,
                nonce: target_nonces.next_nonce(),
                quote: claim_fee.quote,
            },
            extract: TxIntent {
                leg: Leg::Extract,
                signer: extract_signer,
                from: extract_from,
                call: extract_call,
                nonce: match extract_signer {
                    SignerRole::Relayer => relayer_nonces.next_nonce(),
                    SignerRole::Target => target_nonces.next_nonce(),
                },
                quote: extract_fee.quote,
            },
        };
        plan.fund.call.value = plan.target_gas_cost();

        tracing::info!(
            fund_nonce = plan.fund.nonce,
            claim_nonce = plan.claim.nonce,
            extract_nonce = plan.extract.nonce,
            funding = %plan.fund.call.value,
            extract_value = %plan.extract.call.value,
            "Burst planned"
        );

        let submitter = BurstSubmitter::new(&self.relayer, target.wallet());
        let burst = submitter.build(&plan)?;
        let dispatched = BurstSubmitter::dispatch(&*ledger, &burst).await;

        let failures = dispatched.failures();
        for (leg, err) in &failures {
            tracing::warn!(
                leg = leg.as_str(),
                endpoint = %ledger.endpoint(),
                error = %err,
                "Burst leg rejected"
            );
        }
        if failures.iter().any(|(_, e)| e.rotates_endpoint()) {
            self.pool.rotate();
        }
        let hashes = dispatched.into_result()?;

        tracing::info!(
            fund_tx = %hashes.fund,
            claim_tx = %hashes.claim,
            extract_tx = %hashes.extract,
            "Burst dispatched"
        );

        let settlement = self.settings.reconciler.reconcile(&self.pool, &hashes).await;
        tracing::info!(
            claim = ?settlement.claim,
            extract = ?settlement.extract,
            funding = ?settlement.funding,
            "Burst settled"
        );

        if settlement.is_rescued() {
            self.registry.mark_completed(
                owner,
                CompletionRecord {
                    attempt_id,
                    claim_tx: hashes.claim,
                    extract_tx: hashes.extract,
                    completed_at: unix_now(),
                },
            );
        }

        Ok((hashes, settlement))
    }
}

/// True when any primary-tier failure was an endpoint fault.
fn degraded_by_endpoint(estimates: &[&FeeEstimate]) -> bool {
    estimates
        .iter()
        .any(|e| e.degraded.as_ref().is_some_and(|reason| reason.rotates_endpoint()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
