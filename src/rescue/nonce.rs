//! Per-signer nonce allocation within one burst.

use alloy::primitives::Address;

use crate::blockchain::{Ledger, LedgerResult};

/// Fetches the pending count once per burst and hands out consecutive nonces.
///
/// Fetch-then-use is not transactional; bursts run one target at a time so
/// nothing else consumes the same signer's nonces meanwhile.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonceAllocator;

impl NonceAllocator {
    /// Base nonce for `signer`: its pending transaction count.
    pub async fn allocate<L: Ledger>(&self, ledger: &L, signer: Address) -> LedgerResult<NonceSequence> {
        let base = ledger.pending_nonce(signer).await?;
        tracing::debug!(signer = %signer, base, "Allocated nonce base");
        Ok(NonceSequence::new(signer, base))
    }
}

/// `base, base+1, …` for one signer in one burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceSequence {
    signer: Address,
    base: u64,
    issued: u64,
}

impl NonceSequence {
    pub fn new(signer: Address, base: u64) -> Self {
        Self { signer, base, issued: 0 }
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Next unused nonce.
    pub fn next_nonce(&mut self) -> u64 {
        let nonce = self.base + self.issued;
        self.issued += 1;
        nonce
    }

    /// How many nonces were handed out.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}
