//! Rescue data model: identities, quotes, intents, plans and reports.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::Serialize;
use uuid::Uuid;

use crate::blockchain::transaction::TxParams;
use crate::blockchain::Wallet;

/// A compromised identity whose allocation is being rescued.
#[derive(Debug, Clone)]
pub struct TargetIdentity {
    wallet: Wallet,
    expected_amount: U256,
}

impl TargetIdentity {
    pub fn new(wallet: Wallet, expected_amount: U256) -> Self {
        Self { wallet, expected_amount }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn expected_amount(&self) -> U256 {
        self.expected_amount
    }
}

/// Gas limit and EIP-1559 fee caps for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeQuote {
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeQuote {
    /// Worst-case gas spend: `gas_limit * max_fee_per_gas`.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.max_fee_per_gas)
    }
}

/// The three legs of a burst, in their fixed logical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Fund,
    Claim,
    Extract,
}

impl Leg {
    pub fn as_str(self) -> &'static str {
        match self {
            Leg::Fund => "fund",
            Leg::Claim => "claim",
            Leg::Extract => "extract",
        }
    }
}

/// Which identity signs a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    Relayer,
    Target,
}

/// Destination, value and calldata of a leg before fees and nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

/// A fully-specified transaction of a burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIntent {
    pub leg: Leg,
    pub signer: SignerRole,
    pub from: Address,
    pub call: Call,
    pub nonce: u64,
    pub quote: FeeQuote,
}

impl TxIntent {
    pub fn params(&self) -> TxParams {
        TxParams {
            to: self.call.to,
            value: self.call.value,
            input: self.call.input.clone(),
            nonce: self.nonce,
            gas_limit: self.quote.gas_limit,
            max_fee_per_gas: self.quote.max_fee_per_gas,
            max_priority_fee_per_gas: self.quote.max_priority_fee_per_gas,
        }
    }
}

/// Exactly three intents for one target: fund-gas, claim, extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstPlan {
    pub fund: TxIntent,
    pub claim: TxIntent,
    pub extract: TxIntent,
}

impl BurstPlan {
    /// Intents in burst order.
    pub fn intents(&self) -> [&TxIntent; 3] {
        [&self.fund, &self.claim, &self.extract]
    }

    /// Gas the target itself pays for in this burst.
    pub fn target_gas_cost(&self) -> U256 {
        self.intents()
            .into_iter()
            .filter(|i| i.signer == SignerRole::Target)
            .map(|i| i.quote.max_cost())
            .fold(U256::ZERO, |acc, c| acc + c)
    }
}

/// Transaction identifiers of a dispatched burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BurstHashes {
    pub fund: TxHash,
    pub claim: TxHash,
    pub extract: TxHash,
}

/// Legs an endpoint accepted before the burst was abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AcceptedLegs {
    pub fund: Option<TxHash>,
    pub claim: Option<TxHash>,
    pub extract: Option<TxHash>,
}

impl AcceptedLegs {
    pub fn is_empty(&self) -> bool {
        self.fund.is_none() && self.claim.is_none() && self.extract.is_none()
    }
}

/// Settlement of one critical leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegStatus {
    Success,
    Failure,
    TimedOut,
}

/// What was seen of the funding leg once the critical legs settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingObservation {
    Confirmed,
    Reverted,
    Unobserved,
}

/// Per-leg settlement of one burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub claim: LegStatus,
    pub extract: LegStatus,
    pub funding: FundingObservation,
}

impl SettlementReport {
    pub fn is_rescued(&self) -> bool {
        self.claim == LegStatus::Success && self.extract == LegStatus::Success
    }
}

/// Why an attempt stopped before settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// On-chain allocation below the expected amount.
    Ineligible { allocation: U256, expected: U256 },
    /// Claimed value does not cover the extraction gas.
    NothingToExtract { claim: U256, extraction_gas: U256 },
    /// Endpoint failure; the pool was rotated when the error was transient.
    Transport { message: String },
    /// Permit or transaction signing failed.
    Signing { message: String },
    /// A leg could not be constructed; nothing was sent.
    Construction { message: String },
    /// At least one leg was not accepted by the endpoint. The accepted ones
    /// are still in flight.
    Submission { message: String, accepted: AcceptedLegs },
}

/// Terminal state of one rescue attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RescueOutcome {
    /// Target was rescued in an earlier cycle.
    AlreadyRescued,
    Aborted(AbortReason),
    Settled { hashes: BurstHashes, settlement: SettlementReport },
}

/// Structured per-target report; always produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RescueReport {
    pub attempt_id: Uuid,
    pub target: Address,
    pub outcome: RescueOutcome,
}

impl RescueReport {
    pub fn outcome_label(&self) -> &'static str {
        match &self.outcome {
            RescueOutcome::AlreadyRescued => "already_rescued",
            RescueOutcome::Aborted(AbortReason::Ineligible { .. }) => "ineligible",
            RescueOutcome::Aborted(AbortReason::NothingToExtract { .. }) => "nothing_to_extract",
            RescueOutcome::Aborted(AbortReason::Transport { .. }) => "transport",
            RescueOutcome::Aborted(AbortReason::Signing { .. }) => "signing",
            RescueOutcome::Aborted(AbortReason::Construction { .. }) => "construction",
            RescueOutcome::Aborted(AbortReason::Submission { .. }) => "submission",
            RescueOutcome::Settled { settlement, .. } if settlement.is_rescued() => "rescued",
            RescueOutcome::Settled { .. } => "settled_partial",
        }
    }

    /// Transaction ids produced by this attempt, if any.
    pub fn hashes(&self) -> Option<&BurstHashes> {
        match &self.outcome {
            RescueOutcome::Settled { hashes, .. } => Some(hashes),
            _ => None,
        }
    }
}
