//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use thiserror::Error;

/// How a failed ledger call should be treated by the caller.
///
/// Decided once at the transport boundary; nothing above it inspects
/// error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rate limiting, connection resets, overloaded node.
    Transient,
    /// The endpoint answered and said no (revert, unknown method, bad params).
    Permanent,
    /// No answer within the per-call deadline.
    Timeout,
}

impl ErrorKind {
    /// True when the active endpoint should be rotated away from.
    pub fn rotates_endpoint(self) -> bool {
        matches!(self, ErrorKind::Transient | ErrorKind::Timeout)
    }
}

/// Error returned by every [`Ledger`](crate::blockchain::Ledger) call.
#[derive(Debug, Clone, Error)]
#[error("{kind:?} ledger error: {message}")]
pub struct LedgerError {
    pub kind: ErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Transient, message: message.into() }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Permanent, message: message.into() }
    }

    pub fn timeout(secs: u64) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: format!("RPC timeout after {} seconds", secs),
        }
    }

    pub fn rotates_endpoint(&self) -> bool {
        self.kind.rotates_endpoint()
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised while loading or using signing keys.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Invalid private key format.
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    /// Key material missing from the environment.
    #[error("Environment variable {0} not set")]
    MissingEnv(&'static str),

    /// Signer refused to produce a signature.
    #[error("Signing failed: {0}")]
    Signing(String),
}

/// A transaction draft handed to fee estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDraft {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

/// Answer of the chain-specific precise estimation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreciseEstimate {
    pub base_fee_per_gas: u128,
    pub priority_fee_per_gas: u128,
    pub gas_limit: u64,
}

/// Answer of the generic EIP-1559 fee query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeesPerGas {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Terminal status read from a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Succeeded,
    Reverted,
}

/// A decoded `Transfer(from, to, value)` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub block_number: u64,
    pub tx_hash: Option<TxHash>,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}
