//! Asset extraction strategies.
//!
//! The orchestrator is the same for every airdrop; only the extract leg
//! differs. A strategy decides who signs it, what it calls, and any off-chain
//! authorization it needs.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::blockchain::contracts::{decode_uint, IPermitToken, IRescue};
use crate::blockchain::Ledger;
use crate::rescue::error::{RescueError, RescueResult};
use crate::rescue::permit::{self, PermitDomain, PermitRequest, PermitSignature};
use crate::rescue::types::{Call, FeeQuote, SignerRole, TargetIdentity};

/// Fallback gas for a plain native transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Fallback gas for `rescueWithPermit`.
pub const PERMIT_RESCUE_GAS: u64 = 120_000;

/// What the extract leg is computed from.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub target: &'a TargetIdentity,
    pub relayer: Address,
    /// Amount the claim leg delivers to the target.
    pub claim_amount: U256,
}

/// Off-chain authorization gathered before drafting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    None,
    Permit { signature: PermitSignature, deadline: U256 },
}

/// Computes the extract leg's payload.
#[allow(async_fn_in_trait)]
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;

    /// Identity that signs the extract leg.
    fn extract_signer(&self) -> SignerRole;

    /// Gas limit for the extract leg when precise estimation fails.
    fn fallback_gas_limit(&self) -> u64;

    /// Gather metadata and produce any authorization the extract leg consumes.
    async fn authorize<L: Ledger>(
        &self,
        ledger: &L,
        ctx: &ExtractContext<'_>,
    ) -> RescueResult<Authorization>;

    /// Extract leg call. `quote` is `None` for the estimation draft.
    fn extract_call(
        &self,
        ctx: &ExtractContext<'_>,
        auth: &Authorization,
        quote: Option<&FeeQuote>,
    ) -> RescueResult<Call>;
}

/// Native coin: the target sends `claim - extraction gas` to the relayer.
#[derive(Debug, Clone, Copy)]
pub struct NativeExtraction {
    gas_limit: u64,
}

impl NativeExtraction {
    pub fn new(gas_limit: Option<u64>) -> Self {
        Self { gas_limit: gas_limit.unwrap_or(NATIVE_TRANSFER_GAS) }
    }
}

/// `claim - extraction_gas`; aborts when nothing would be left.
pub fn amount_to_extract(claim: U256, extraction_gas: U256) -> RescueResult<U256> {
    if claim <= extraction_gas {
        return Err(RescueError::NothingToExtract { claim, extraction_gas });
    }
    Ok(claim - extraction_gas)
}

impl ExtractionStrategy for NativeExtraction {
    fn name(&self) -> &'static str {
        "native"
    }

    fn extract_signer(&self) -> SignerRole {
        SignerRole::Target
    }

    fn fallback_gas_limit(&self) -> u64 {
        self.gas_limit
    }

    async fn authorize<L: Ledger>(
        &self,
        _ledger: &L,
        _ctx: &ExtractContext<'_>,
    ) -> RescueResult<Authorization> {
        Ok(Authorization::None)
    }

    fn extract_call(
        &self,
        ctx: &ExtractContext<'_>,
        _auth: &Authorization,
        quote: Option<&FeeQuote>,
    ) -> RescueResult<Call> {
        let value = match quote {
            Some(quote) => amount_to_extract(ctx.claim_amount, quote.max_cost())?,
            None => ctx.claim_amount,
        };
        Ok(Call { to: ctx.relayer, value, input: Bytes::new() })
    }
}

/// Permit token: the relayer calls the rescue contract with the target's permit.
#[derive(Debug, Clone)]
pub struct PermitExtraction {
    token: Address,
    rescue_contract: Address,
    domain: PermitDomain,
    deadline_secs: u64,
    gas_limit: u64,
}

impl PermitExtraction {
    pub fn new(
        token: Address,
        rescue_contract: Address,
        domain: PermitDomain,
        deadline_secs: u64,
        gas_limit: Option<u64>,
    ) -> Self {
        Self {
            token,
            rescue_contract,
            domain,
            deadline_secs,
            gas_limit: gas_limit.unwrap_or(PERMIT_RESCUE_GAS),
        }
    }

    /// Current permit nonce of `owner` on the token.
    pub async fn permit_nonce<L: Ledger>(&self, ledger: &L, owner: Address) -> RescueResult<U256> {
        let input = Bytes::from(IPermitToken::noncesCall { owner }.abi_encode());
        let output = ledger.call(self.token, input).await?;
        Ok(decode_uint(&output)?)
    }
}

impl ExtractionStrategy for PermitExtraction {
    fn name(&self) -> &'static str {
        "permit"
    }

    fn extract_signer(&self) -> SignerRole {
        SignerRole::Relayer
    }

    fn fallback_gas_limit(&self) -> u64 {
        self.gas_limit
    }

    async fn authorize<L: Ledger>(
        &self,
        ledger: &L,
        ctx: &ExtractContext<'_>,
    ) -> RescueResult<Authorization> {
        let owner = ctx.target.address();
        let nonce = self.permit_nonce(ledger, owner).await?;
        let deadline = permit::deadline_after(permit::unix_now(), self.deadline_secs);

        let request = PermitRequest {
            owner,
            spender: self.rescue_contract,
            value: ctx.claim_amount,
            nonce,
            deadline,
        };
        let signature = permit::sign(ctx.target.wallet(), &request, &self.domain)?;
        tracing::debug!(owner = %owner, %nonce, %deadline, "Permit signed");

        Ok(Authorization::Permit { signature, deadline })
    }

    fn extract_call(
        &self,
        ctx: &ExtractContext<'_>,
        auth: &Authorization,
        _quote: Option<&FeeQuote>,
    ) -> RescueResult<Call> {
        let Authorization::Permit { signature, deadline } = auth else {
            return Err(RescueError::Construction("permit extraction without a permit".into()));
        };
        let input = IRescue::rescueWithPermitCall {
            token: self.token,
            owner: ctx.target.address(),
            recipient: ctx.relayer,
            value: ctx.claim_amount,
            deadline: *deadline,
            v: signature.v,
            r: signature.r,
            s: signature.s,
        }
        .abi_encode();

        Ok(Call { to: self.rescue_contract, value: U256::ZERO, input: Bytes::from(input) })
    }
}
