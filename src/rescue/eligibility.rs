//! Allocation check before any transaction is drafted.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::blockchain::contracts::{decode_uint, IAirdrop};
use crate::blockchain::{Ledger, LedgerResult};

/// Outcome of one allocation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub allocation: U256,
    pub expected: U256,
}

impl Eligibility {
    /// `false` when the allocation is strictly below the expected amount.
    pub fn allowed(&self) -> bool {
        is_eligible(self.allocation, self.expected)
    }
}

/// Reads `calculateAllocation(target)` from the airdrop contract.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityVerifier {
    airdrop: Address,
}

impl EligibilityVerifier {
    pub fn new(airdrop: Address) -> Self {
        Self { airdrop }
    }

    async fn allocation<L: Ledger>(&self, ledger: &L, target: Address) -> LedgerResult<U256> {
        let input = Bytes::from(IAirdrop::calculateAllocationCall { account: target }.abi_encode());
        let output = ledger.call(self.airdrop, input).await?;
        decode_uint(&output)
    }

    /// Check `target` against `expected`. One read, no retry; transport
    /// errors go back to the caller.
    pub async fn verify<L: Ledger>(
        &self,
        ledger: &L,
        target: Address,
        expected: U256,
    ) -> LedgerResult<Eligibility> {
        let allocation = self.allocation(ledger, target).await?;
        Ok(Eligibility { allocation, expected })
    }
}

pub fn is_eligible(allocation: U256, expected: U256) -> bool {
    allocation >= expected
}
