//! Transaction building and signing.
//!
//! # Responsibilities
//! - Turn fully-specified parameters into a signed EIP-1559 transaction
//! - Produce the EIP-2718 bytes and hash ready for broadcast
//!
//! Nothing here touches the network; broadcast lives in the ledger client.

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};

use crate::blockchain::types::WalletError;
use crate::blockchain::wallet::Wallet;

/// Every field an EIP-1559 transaction needs, already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxParams {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub hash: TxHash,
    pub raw: Bytes,
    pub nonce: u64,
}

/// Sign `params` with `wallet` for the wallet's chain.
pub fn sign_eip1559(wallet: &Wallet, params: &TxParams) -> Result<SignedTx, WalletError> {
    let mut tx = TxEip1559 {
        chain_id: wallet.chain_id(),
        nonce: params.nonce,
        gas_limit: params.gas_limit,
        max_fee_per_gas: params.max_fee_per_gas,
        max_priority_fee_per_gas: params.max_priority_fee_per_gas,
        to: TxKind::Call(params.to),
        value: params.value,
        input: params.input.clone(),
        ..Default::default()
    };

    let sig = wallet.sign_transaction(&mut tx)?;
    let envelope: TxEnvelope = tx.into_signed(sig).into();

    Ok(SignedTx {
        hash: *envelope.tx_hash(),
        raw: Bytes::from(envelope.encoded_2718()),
        nonce: params.nonce,
    })
}
