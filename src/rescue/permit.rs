//! EIP-2612 permit signing.
//!
//! The target signs an off-chain permit letting the rescue contract move its
//! tokens. The signature is consumed by the extract leg.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::blockchain::contracts::Permit;
use crate::blockchain::Wallet;
use crate::rescue::error::{RescueError, RescueResult};

/// Length of a raw `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// EIP-712 domain of the permit token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl PermitDomain {
    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

/// Fields of the permit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitRequest {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

/// A permit signature split for an on-chain `permit(..., v, r, s)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

/// Permit deadline `ttl_secs` after `now_secs`.
pub fn deadline_after(now_secs: u64, ttl_secs: u64) -> U256 {
    U256::from(now_secs.saturating_add(ttl_secs))
}

/// Current UNIX time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// EIP-712 signing hash of `request` under `domain`.
pub fn signing_hash(request: &PermitRequest, domain: &PermitDomain) -> B256 {
    let permit = Permit {
        owner: request.owner,
        spender: request.spender,
        value: request.value,
        nonce: request.nonce,
        deadline: request.deadline,
    };
    permit.eip712_signing_hash(&domain.eip712())
}

/// Sign `request` with the owner's wallet.
pub fn sign(
    owner: &Wallet,
    request: &PermitRequest,
    domain: &PermitDomain,
) -> RescueResult<PermitSignature> {
    if owner.address() != request.owner {
        return Err(RescueError::Signing(format!(
            "permit owner {} is not the signing wallet {}",
            request.owner,
            owner.address()
        )));
    }
    let hash = signing_hash(request, domain);
    let signature = owner.sign_hash(&hash)?;
    split_signature(&signature.as_bytes())
}

/// Split a raw 65-byte signature into `r`, `s`, `v`.
pub fn split_signature(raw: &[u8]) -> RescueResult<PermitSignature> {
    if raw.len() != SIGNATURE_LEN {
        return Err(RescueError::Signing(format!(
            "expected {}-byte signature, got {}",
            SIGNATURE_LEN,
            raw.len()
        )));
    }
    Ok(PermitSignature {
        r: B256::from_slice(&raw[0..32]),
        s: B256::from_slice(&raw[32..64]),
        v: raw[64],
    })
}
