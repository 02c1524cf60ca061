//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (relayer key) + targets file (target keys)
//!     → wallet.rs (key loading, signing)
//!     → transaction.rs (build + sign EIP-1559 transactions)
//!     → client.rs (Ledger trait, JSON-RPC implementation with deadlines)
//! ```
//!
//! # Security Constraints
//! - Private keys never logged or serialized
//! - All RPC calls have configurable timeouts
//! - Errors are classified (transient / permanent / timeout) at this boundary

pub mod client;
pub mod contracts;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{Ledger, RpcLedger};
pub use types::{
    ErrorKind, FeesPerGas, LedgerError, LedgerResult, PreciseEstimate, ReceiptStatus,
    TransferEvent, TxDraft, WalletError,
};
pub use wallet::Wallet;
