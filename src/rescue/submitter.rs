//! Burst signing and concurrent dispatch.

use alloy::primitives::TxHash;

use crate::blockchain::transaction::{sign_eip1559, SignedTx};
use crate::blockchain::{Ledger, LedgerError, LedgerResult, Wallet};
use crate::rescue::error::{RescueError, RescueResult};
use crate::rescue::types::{AcceptedLegs, BurstHashes, BurstPlan, Leg, SignerRole, TxIntent};

/// The three legs signed and ready to send.
#[derive(Debug, Clone)]
pub struct SignedBurst {
    pub fund: SignedTx,
    pub claim: SignedTx,
    pub extract: SignedTx,
}

/// Per-leg result of dispatch. Each send is independent of the others.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub fund: LedgerResult<TxHash>,
    pub claim: LedgerResult<TxHash>,
    pub extract: LedgerResult<TxHash>,
}

impl DispatchOutcome {
    /// All three hashes, or the first failure with its leg.
    pub fn into_hashes(self) -> Result<BurstHashes, (Leg, LedgerError)> {
        let fund = self.fund.map_err(|e| (Leg::Fund, e))?;
        let claim = self.claim.map_err(|e| (Leg::Claim, e))?;
        let extract = self.extract.map_err(|e| (Leg::Extract, e))?;
        Ok(BurstHashes { fund, claim, extract })
    }

    /// Hashes of the legs the endpoint accepted.
    pub fn accepted(&self) -> AcceptedLegs {
        AcceptedLegs {
            fund: self.fund.as_ref().ok().copied(),
            claim: self.claim.as_ref().ok().copied(),
            extract: self.extract.as_ref().ok().copied(),
        }
    }

    /// Hashes, or a submission error naming the first rejected leg and
    /// carrying the legs already in flight.
    pub fn into_result(self) -> RescueResult<BurstHashes> {
        let accepted = self.accepted();
        self.into_hashes().map_err(|(leg, err)| RescueError::Submission {
            message: format!("{} leg: {}", leg.as_str(), err),
            accepted,
        })
    }

    /// Failures in leg order.
    pub fn failures(&self) -> Vec<(Leg, &LedgerError)> {
        [(Leg::Fund, &self.fund), (Leg::Claim, &self.claim), (Leg::Extract, &self.extract)]
            .into_iter()
            .filter_map(|(leg, r)| r.as_ref().err().map(|e| (leg, e)))
            .collect()
    }
}

/// Signs with the relayer and target wallets, then sends all legs at once.
pub struct BurstSubmitter<'a> {
    relayer: &'a Wallet,
    target: &'a Wallet,
}

impl<'a> BurstSubmitter<'a> {
    pub fn new(relayer: &'a Wallet, target: &'a Wallet) -> Self {
        Self { relayer, target }
    }

    fn wallet_for(&self, intent: &TxIntent) -> RescueResult<&'a Wallet> {
        let wallet = match intent.signer {
            SignerRole::Relayer => self.relayer,
            SignerRole::Target => self.target,
        };
        if wallet.address() != intent.from {
            return Err(RescueError::Construction(format!(
                "{} leg expects signer {} but wallet is {}",
                intent.leg.as_str(),
                intent.from,
                wallet.address()
            )));
        }
        Ok(wallet)
    }

    fn sign(&self, intent: &TxIntent) -> RescueResult<SignedTx> {
        let wallet = self.wallet_for(intent)?;
        Ok(sign_eip1559(wallet, &intent.params())?)
    }

    /// Sign every leg. Any failure aborts before anything reaches the network.
    pub fn build(&self, plan: &BurstPlan) -> RescueResult<SignedBurst> {
        Ok(SignedBurst {
            fund: self.sign(&plan.fund)?,
            claim: self.sign(&plan.claim)?,
            extract: self.sign(&plan.extract)?,
        })
    }

    /// Send the three legs concurrently and collect each result.
    pub async fn dispatch<L: Ledger>(ledger: &L, burst: &SignedBurst) -> DispatchOutcome {
        let (fund, claim, extract) = tokio::join!(
            ledger.send_raw(burst.fund.raw.clone()),
            ledger.send_raw(burst.claim.raw.clone()),
            ledger.send_raw(burst.extract.raw.clone()),
        );
        DispatchOutcome { fund, claim, extract }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rescue::types::{Call, FeeQuote};
    use alloy::primitives::{Address, Bytes, U256};

    const RELAYER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TARGET_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn intent(leg: Leg, signer: SignerRole, from: Address, nonce: u64) -> TxIntent {
        TxIntent {
            leg,
            signer,
            from,
            call: Call { to: Address::repeat_byte(0x01), value: U256::ZERO, input: Bytes::new() },
            nonce,
            quote: FeeQuote { gas_limit: 21_000, max_fee_per_gas: 10, max_priority_fee_per_gas: 1 },
        }
    }

    #[test]
    fn test_build_signs_with_each_role() {
        let relayer = Wallet::from_private_key(RELAYER_KEY, 59144).unwrap();
        let target = Wallet::from_private_key(TARGET_KEY, 59144).unwrap();
        let plan = BurstPlan {
            fund: intent(Leg::Fund, SignerRole::Relayer, relayer.address(), 5),
            claim: intent(Leg::Claim, SignerRole::Target, target.address(), 0),
            extract: intent(Leg::Extract, SignerRole::Relayer, relayer.address(), 6),
        };
        let burst = BurstSubmitter::new(&relayer, &target).build(&plan).unwrap();
        assert_eq!(burst.fund.nonce, 5);
        assert_eq!(burst.claim.nonce, 0);
        assert_eq!(burst.extract.nonce, 6);
    }

    #[test]
    fn test_mismatched_signer_aborts_build() {
        let relayer = Wallet::from_private_key(RELAYER_KEY, 59144).unwrap();
        let target = Wallet::from_private_key(TARGET_KEY, 59144).unwrap();
        let plan = BurstPlan {
            fund: intent(Leg::Fund, SignerRole::Relayer, relayer.address(), 0),
            claim: intent(Leg::Claim, SignerRole::Target, relayer.address(), 0),
            extract: intent(Leg::Extract, SignerRole::Relayer, relayer.address(), 1),
        };
        let err = BurstSubmitter::new(&relayer, &target).build(&plan).unwrap_err();
        assert!(matches!(err, RescueError::Construction(_)));
    }

    #[test]
    fn test_dispatch_outcome_reports_first_failure() {
        let outcome = DispatchOutcome {
            fund: Ok(TxHash::repeat_byte(1)),
            claim: Err(LedgerError::permanent("nonce too low")),
            extract: Ok(TxHash::repeat_byte(3)),
        };
        assert_eq!(outcome.failures().len(), 1);
        let (leg, _) = outcome.into_hashes().unwrap_err();
        assert_eq!(leg, Leg::Claim);
    }

    #[test]
    fn test_transient_send_failure_is_submission() {
        let outcome = DispatchOutcome {
            fund: Err(LedgerError::transient("connection reset")),
            claim: Ok(TxHash::repeat_byte(2)),
            extract: Ok(TxHash::repeat_byte(3)),
        };
        match outcome.into_result() {
            Err(RescueError::Submission { message, accepted }) => {
                assert!(message.starts_with("fund"));
                assert_eq!(accepted.fund, None);
                assert_eq!(accepted.claim, Some(TxHash::repeat_byte(2)));
                assert_eq!(accepted.extract, Some(TxHash::repeat_byte(3)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
