//! End-to-end burst tests against a scripted ledger.

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;

use airdrop_rescue::blockchain::contracts::{IAirdrop, IPermitToken, IRescue};
use airdrop_rescue::blockchain::{LedgerError, PreciseEstimate, ReceiptStatus};
use airdrop_rescue::endpoints::EndpointPool;
use airdrop_rescue::rescue::eligibility::EligibilityVerifier;
use airdrop_rescue::rescue::fees::FeeEstimator;
use airdrop_rescue::rescue::permit::PermitDomain;
use airdrop_rescue::rescue::reconciler::SettlementReconciler;
use airdrop_rescue::rescue::{
    AbortReason, CompletionRegistry, FundingObservation, LegStatus, NativeExtraction,
    Orchestrator, OrchestratorSettings, PermitExtraction, RescueOutcome, TargetIdentity,
};

mod common;
use common::{relayer, target, MockLedger, SECOND_TARGET_KEY, TARGET_KEY};

const AIRDROP: Address = Address::repeat_byte(0xa1);
const TOKEN: Address = Address::repeat_byte(0x70);
const RESCUE: Address = Address::repeat_byte(0x51);
const CLAIM_SELECTOR: [u8; 4] = [0x4e, 0x71, 0xd9, 0x2d];
const CLAIM_GAS: u64 = 200_000;

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        airdrop: AIRDROP,
        claim_selector: FixedBytes(CLAIM_SELECTOR),
        fund_gas_limit: 21_000,
        claim_gas_limit: CLAIM_GAS,
        estimator: FeeEstimator::new(1.5, 1.2),
        reconciler: SettlementReconciler::new(Duration::from_millis(200), Duration::from_millis(10)),
        target_spacing: Duration::ZERO,
    }
}

fn pool(ledgers: &[&MockLedger]) -> Arc<EndpointPool<MockLedger>> {
    Arc::new(EndpointPool::new(ledgers.iter().map(|l| (*l).clone()).collect()).unwrap())
}

fn allocate(ledger: &MockLedger, target: &TargetIdentity, amount: u64) {
    let input = IAirdrop::calculateAllocationCall { account: target.address() }.abi_encode();
    ledger.respond(AIRDROP, input, U256::from(amount));
}

/// Native orchestrator whose extract leg costs `extract_gas` at 1 wei/gas.
fn native(pool: Arc<EndpointPool<MockLedger>>, extract_gas: u64) -> Orchestrator<MockLedger, NativeExtraction> {
    Orchestrator::new(
        pool,
        relayer(),
        NativeExtraction::new(Some(extract_gas)),
        settings(),
        CompletionRegistry::new(None),
    )
}

fn permit(pool: Arc<EndpointPool<MockLedger>>) -> Orchestrator<MockLedger, PermitExtraction> {
    let domain = PermitDomain {
        name: "Airdrop Token".to_string(),
        version: "1".to_string(),
        chain_id: common::CHAIN_ID,
        verifying_contract: TOKEN,
    };
    Orchestrator::new(
        pool,
        relayer(),
        PermitExtraction::new(TOKEN, RESCUE, domain, 3600, None),
        settings(),
        CompletionRegistry::new(None),
    )
}

fn settlement(outcome: &RescueOutcome) -> (LegStatus, LegStatus, FundingObservation) {
    match outcome {
        RescueOutcome::Settled { settlement, .. } => {
            (settlement.claim, settlement.extract, settlement.funding)
        }
        other => panic!("expected a settled burst, got {:?}", other),
    }
}

#[tokio::test]
async fn test_native_rescue_conserves_amount() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 1000);
    {
        let mut state = ledger.state();
        state.nonces.insert(relayer().address(), 7);
        state.nonces.insert(target.address(), 3);
    }

    let orchestrator = native(pool(&[&ledger]), 50);
    let report = orchestrator.rescue(&target).await;

    assert_eq!(settlement(&report.outcome), (LegStatus::Success, LegStatus::Success, FundingObservation::Confirmed));
    assert_eq!(report.outcome_label(), "rescued");

    let sent = ledger.sent();
    assert_eq!(sent.len(), 3);

    // Fund: relayer → target, first relayer nonce, covers both target legs.
    assert_eq!(sent[0].to, target.address());
    assert_eq!(sent[0].nonce, 7);
    assert_eq!(sent[0].value, U256::from(CLAIM_GAS + 50));

    // Claim: target → airdrop with the claim selector.
    assert_eq!(sent[1].to, AIRDROP);
    assert_eq!(sent[1].nonce, 3);
    assert_eq!(sent[1].input, Bytes::from(CLAIM_SELECTOR.to_vec()));

    // Extract: target → relayer, claim minus its own gas.
    assert_eq!(sent[2].to, relayer().address());
    assert_eq!(sent[2].nonce, 4);
    assert_eq!(sent[2].value, U256::from(950u64));

    let hashes = report.hashes().unwrap();
    assert_eq!(hashes.claim, sent[1].hash);
    assert!(orchestrator.registry().is_completed(&target.address()));
}

#[tokio::test]
async fn test_permit_rescue_nonce_pattern() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 1000);
    ledger.respond(
        TOKEN,
        IPermitToken::noncesCall { owner: target.address() }.abi_encode(),
        U256::ZERO,
    );
    {
        let mut state = ledger.state();
        state.nonces.insert(relayer().address(), 10);
        state.nonces.insert(target.address(), 0);
    }

    let report = permit(pool(&[&ledger])).rescue(&target).await;
    assert_eq!(settlement(&report.outcome).0, LegStatus::Success);

    let sent = ledger.sent();
    let nonces: Vec<u64> = sent.iter().map(|s| s.nonce).collect();
    assert_eq!(nonces, vec![10, 0, 11]);

    // Only the claim is paid by the target.
    assert_eq!(sent[0].value, U256::from(CLAIM_GAS));

    assert_eq!(sent[2].to, RESCUE);
    assert_eq!(sent[2].value, U256::ZERO);
    let call = IRescue::rescueWithPermitCall::abi_decode(&sent[2].input).unwrap();
    assert_eq!(call.owner, target.address());
    assert_eq!(call.recipient, relayer().address());
    assert_eq!(call.value, U256::from(1000u64));
}

#[tokio::test]
async fn test_ineligible_target_sends_nothing() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 500);

    let report = native(pool(&[&ledger]), 50).rescue(&target).await;

    assert_eq!(
        report.outcome,
        RescueOutcome::Aborted(AbortReason::Ineligible {
            allocation: U256::from(500u64),
            expected: U256::from(1000u64),
        })
    );
    assert!(report.hashes().is_none());
    assert!(ledger.sent().is_empty());
    assert!(!ledger.called("pending_nonce"));
    assert!(!ledger.called("estimate_precise"));
}

#[tokio::test]
async fn test_claim_not_covering_gas_aborts_before_sending() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 40);
    allocate(&ledger, &target, 40);

    let report = native(pool(&[&ledger]), 50).rescue(&target).await;

    assert!(matches!(
        report.outcome,
        RescueOutcome::Aborted(AbortReason::NothingToExtract { .. })
    ));
    assert!(!ledger.called("send_raw"));
}

#[tokio::test]
async fn test_precise_quotes_apply_multipliers() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 10_000_000_000);
    allocate(&ledger, &target, 10_000_000_000);
    ledger.state().precise = Some(PreciseEstimate {
        base_fee_per_gas: 100,
        priority_fee_per_gas: 10,
        gas_limit: 50_000,
    });

    let report = native(pool(&[&ledger]), 50).rescue(&target).await;
    assert_eq!(report.outcome_label(), "rescued");

    let sent = ledger.sent();
    for tx in &sent {
        assert_eq!(tx.max_priority_fee_per_gas, 12);
        assert_eq!(tx.max_fee_per_gas, 162);
        assert_eq!(tx.gas_limit, 50_000);
    }
    // Claim and extract both signed by the target.
    assert_eq!(sent[0].value, U256::from(2 * 50_000 * 162u64));
    assert_eq!(sent[2].value, U256::from(10_000_000_000u64 - 50_000 * 162));
    assert!(!ledger.called("fees_per_gas"));
}

#[tokio::test]
async fn test_fallback_quote_uses_fixed_gas_limits() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1_000_000);
    allocate(&ledger, &target, 1_000_000);

    native(pool(&[&ledger]), 21_000).rescue(&target).await;

    let sent = ledger.sent();
    assert_eq!(sent[0].gas_limit, 21_000);
    assert_eq!(sent[1].gas_limit, CLAIM_GAS);
    assert_eq!(sent[2].gas_limit, 21_000);
    assert!(sent.iter().all(|s| s.max_fee_per_gas == 1));
    assert_eq!(ledger.state().drafts.len(), 3);
}

#[tokio::test]
async fn test_extract_timeout_reported_independently() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 1000);
    ledger.state().receipts_by_to.insert(relayer().address(), None);

    let orchestrator = native(pool(&[&ledger]), 50);
    let report = orchestrator.rescue(&target).await;

    assert_eq!(settlement(&report.outcome).0, LegStatus::Success);
    assert_eq!(settlement(&report.outcome).1, LegStatus::TimedOut);
    assert_eq!(report.outcome_label(), "settled_partial");
    assert!(!orchestrator.registry().is_completed(&target.address()));
}

#[tokio::test]
async fn test_reverted_claim_and_unobserved_funding() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 1000);
    {
        let mut state = ledger.state();
        state.receipts_by_to.insert(AIRDROP, Some(ReceiptStatus::Reverted));
        state.receipts_by_to.insert(target.address(), None);
    }

    let report = native(pool(&[&ledger]), 50).rescue(&target).await;

    let (claim, extract, funding) = settlement(&report.outcome);
    assert_eq!(claim, LegStatus::Failure);
    assert_eq!(extract, LegStatus::Success);
    assert_eq!(funding, FundingObservation::Unobserved);
}

#[tokio::test]
async fn test_rejected_leg_is_submission_failure() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 1000);
    ledger
        .state()
        .send_failures
        .insert(AIRDROP, LedgerError::permanent("nonce too low"));

    let pool = pool(&[&ledger]);
    let report = native(pool.clone(), 50).rescue(&target).await;

    let sent = ledger.sent();
    // The other legs were already in flight and stay visible in the report.
    assert_eq!(sent.len(), 2);
    match report.outcome {
        RescueOutcome::Aborted(AbortReason::Submission { ref message, accepted }) => {
            assert!(message.starts_with("claim"));
            assert_eq!(accepted.fund, Some(sent[0].hash));
            assert_eq!(accepted.claim, None);
            assert_eq!(accepted.extract, Some(sent[1].hash));
        }
        ref other => panic!("expected a submission abort, got {:?}", other),
    }
    assert_eq!(pool.rotations(), 0);
}

#[tokio::test]
async fn test_receipt_fault_moves_settlement_to_next_endpoint() {
    let primary = MockLedger::new("rpc-a");
    let secondary = primary.same_chain("rpc-b");
    let target = target(TARGET_KEY, 1000);
    allocate(&primary, &target, 1000);
    primary.fail("receipt_status", LedgerError::transient("429"));

    let pool = pool(&[&primary, &secondary]);
    let report = native(pool.clone(), 50).rescue(&target).await;

    assert_eq!(settlement(&report.outcome), (LegStatus::Success, LegStatus::Success, FundingObservation::Confirmed));
    // Both legs failed on rpc-a concurrently; the pool moves once.
    assert_eq!(pool.rotations(), 1);
    assert_eq!(pool.active_index(), 1);
    assert_eq!(primary.sent().len(), 3);
    assert!(secondary.call_count("receipt_status") >= 3);
    assert!(!secondary.called("send_raw"));
}

#[tokio::test]
async fn test_verifier_reads_allocation_once() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 500);
    let verifier = EligibilityVerifier::new(AIRDROP);

    let short = verifier.verify(&ledger, target.address(), U256::from(1000u64)).await.unwrap();
    assert_eq!(short.allocation, U256::from(500u64));
    assert!(!short.allowed());
    assert_eq!(ledger.call_count("call"), 1);

    let enough = verifier.verify(&ledger, target.address(), U256::from(500u64)).await.unwrap();
    assert!(enough.allowed());

    // Unknown allocation source: the revert surfaces, no retry.
    let other = EligibilityVerifier::new(Address::repeat_byte(0xee));
    assert!(other.verify(&ledger, target.address(), U256::from(1u64)).await.is_err());
    assert_eq!(ledger.call_count("call"), 3);
}

#[tokio::test]
async fn test_transient_estimation_rotates_once() {
    let primary = MockLedger::new("rpc-a");
    let secondary = MockLedger::new("rpc-b");
    let target = target(TARGET_KEY, 1000);
    allocate(&primary, &target, 1000);
    primary.fail("estimate_precise", LedgerError::transient("429 Too Many Requests"));

    let pool = pool(&[&primary, &secondary]);
    let report = native(pool.clone(), 50).rescue(&target).await;

    assert_eq!(pool.rotations(), 1);
    assert_eq!(pool.active_index(), 1);
    // Submission and receipts went through the newly bound endpoint.
    assert!(primary.sent().is_empty());
    assert_eq!(secondary.sent().len(), 3);
    assert_eq!(report.outcome_label(), "rescued");
}

#[tokio::test]
async fn test_transport_error_aborts_and_rotates() {
    let primary = MockLedger::new("rpc-a");
    let secondary = MockLedger::new("rpc-b");
    let target = target(TARGET_KEY, 1000);
    primary.fail("call", LedgerError::timeout(10));

    let pool = pool(&[&primary, &secondary]);
    let report = native(pool.clone(), 50).rescue(&target).await;

    assert!(matches!(report.outcome, RescueOutcome::Aborted(AbortReason::Transport { .. })));
    assert_eq!(pool.active_index(), 1);
    assert!(!primary.called("send_raw"));
}

#[tokio::test]
async fn test_completed_target_is_skipped() {
    let ledger = MockLedger::new("rpc-a");
    let target = target(TARGET_KEY, 1000);
    allocate(&ledger, &target, 1000);

    let orchestrator = native(pool(&[&ledger]), 50);
    let first = orchestrator.rescue(&target).await;
    let second = orchestrator.rescue(&target).await;

    assert_eq!(first.outcome_label(), "rescued");
    assert_eq!(second.outcome, RescueOutcome::AlreadyRescued);
    assert_ne!(first.attempt_id, second.attempt_id);
    assert_eq!(ledger.sent().len(), 3);
}

#[tokio::test]
async fn test_cycle_continues_past_failed_target() {
    let ledger = MockLedger::new("rpc-a");
    let poor = target(TARGET_KEY, 1000);
    let rich = target(SECOND_TARGET_KEY, 1000);
    allocate(&ledger, &poor, 10);
    allocate(&ledger, &rich, 1000);

    let reports = native(pool(&[&ledger]), 50).run_cycle(&[poor.clone(), rich.clone()]).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].target, poor.address());
    assert_eq!(reports[0].outcome_label(), "ineligible");
    assert_eq!(reports[1].target, rich.address());
    assert_eq!(reports[1].outcome_label(), "rescued");
}
