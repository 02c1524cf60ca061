//! Ledger client boundary.
//!
//! # Responsibilities
//! - Define the [`Ledger`] operations the rescue needs from a chain
//! - Implement them over a JSON-RPC endpoint ([`RpcLedger`])
//! - Enforce a deadline on every call
//! - Classify failures into [`ErrorKind`] right here, at the transport edge

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::eth::Filter;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolEvent;
use alloy::transports::{RpcError, TransportErrorKind};
use serde::Deserialize;
use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::contracts::Transfer;
use crate::blockchain::types::{
    FeesPerGas, LedgerError, LedgerResult, PreciseEstimate, ReceiptStatus, TransferEvent, TxDraft,
};

/// JSON-RPC method of the chain-specific precise fee estimation.
pub const PRECISE_ESTIMATE_METHOD: &str = "linea_estimateGas";

/// JSON-RPC error codes that signal an overloaded or throttling node.
const TRANSIENT_RPC_CODES: &[i64] = &[429, -32005, -32016];

/// Operations the rescue performs against a chain.
///
/// Every call is read-only except [`Ledger::send_raw`]. Implementations
/// classify their own failures; callers only look at [`LedgerError::kind`].
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Human-readable endpoint identity for logs.
    fn endpoint(&self) -> &str;

    async fn chain_id(&self) -> LedgerResult<u64>;

    async fn block_number(&self) -> LedgerResult<u64>;

    /// Native balance of `address`.
    async fn balance(&self, address: Address) -> LedgerResult<U256>;

    /// Pending transaction count of `address`.
    async fn pending_nonce(&self, address: Address) -> LedgerResult<u64>;

    /// Read-only contract call.
    async fn call(&self, to: Address, input: Bytes) -> LedgerResult<Bytes>;

    /// Chain-specific fee + gas estimation for a full draft.
    async fn estimate_precise(&self, draft: &TxDraft) -> LedgerResult<PreciseEstimate>;

    /// Generic EIP-1559 fee-per-gas estimation.
    async fn fees_per_gas(&self) -> LedgerResult<FeesPerGas>;

    /// Broadcast a signed, EIP-2718 encoded transaction.
    async fn send_raw(&self, raw: Bytes) -> LedgerResult<TxHash>;

    /// `None` while the transaction is not yet mined.
    async fn receipt_status(&self, hash: TxHash) -> LedgerResult<Option<ReceiptStatus>>;

    /// `Transfer` logs emitted by `token` towards `recipient` in `[from_block, to_block]`.
    async fn transfer_events(
        &self,
        token: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> LedgerResult<Vec<TransferEvent>>;
}

/// Ledger backed by one JSON-RPC HTTP endpoint.
#[derive(Clone)]
pub struct RpcLedger {
    provider: DynProvider,
    url: String,
    timeout_duration: Duration,
}

impl RpcLedger {
    /// Bind a client to `url`. No network traffic happens here.
    pub fn connect(url: &str, timeout_secs: u64) -> LedgerResult<Self> {
        let parsed: url::Url = url
            .parse()
            .map_err(|e| LedgerError::permanent(format!("Invalid RPC URL '{}': {}", url, e)))?;
        let provider = ProviderBuilder::new().connect_http(parsed).erased();

        Ok(Self {
            provider,
            url: url.to_string(),
            timeout_duration: Duration::from_secs(timeout_secs),
        })
    }

    async fn bounded<T, F>(&self, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(LedgerError::timeout(self.timeout_duration.as_secs())),
        }
    }
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("url", &self.url)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

/// Map an alloy transport error onto an [`ErrorKind`](crate::blockchain::ErrorKind).
pub fn classify(err: RpcError<TransportErrorKind>) -> LedgerError {
    match &err {
        RpcError::Transport(_) => LedgerError::transient(err.to_string()),
        RpcError::ErrorResp(payload) if TRANSIENT_RPC_CODES.contains(&payload.code) => {
            LedgerError::transient(err.to_string())
        }
        _ => LedgerError::permanent(err.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreciseEstimate {
    base_fee_per_gas: String,
    priority_fee_per_gas: String,
    gas_limit: String,
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> LedgerResult<u128> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Err(LedgerError::permanent(format!("empty hex quantity '{}'", raw)));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::permanent(format!("bad hex quantity '{}': {}", raw, e)))
}

fn parse_precise(raw: RawPreciseEstimate) -> LedgerResult<PreciseEstimate> {
    let gas_limit = parse_quantity(&raw.gas_limit)?;
    Ok(PreciseEstimate {
        base_fee_per_gas: parse_quantity(&raw.base_fee_per_gas)?,
        priority_fee_per_gas: parse_quantity(&raw.priority_fee_per_gas)?,
        gas_limit: u64::try_from(gas_limit)
            .map_err(|_| LedgerError::permanent(format!("gas limit {} overflows u64", gas_limit)))?,
    })
}

fn draft_request(draft: &TxDraft) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(draft.from)
        .with_to(draft.to)
        .with_value(draft.value)
        .with_input(draft.input.clone())
}

impl Ledger for RpcLedger {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> LedgerResult<u64> {
        self.bounded(async { self.provider.get_chain_id().await }).await
    }

    async fn block_number(&self) -> LedgerResult<u64> {
        self.bounded(async { self.provider.get_block_number().await }).await
    }

    async fn balance(&self, address: Address) -> LedgerResult<U256> {
        self.bounded(async { self.provider.get_balance(address).await }).await
    }

    async fn pending_nonce(&self, address: Address) -> LedgerResult<u64> {
        self.bounded(async { self.provider.get_transaction_count(address).pending().await })
            .await
    }

    async fn call(&self, to: Address, input: Bytes) -> LedgerResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        self.bounded(async { self.provider.call(request).await }).await
    }

    async fn estimate_precise(&self, draft: &TxDraft) -> LedgerResult<PreciseEstimate> {
        let request = draft_request(draft);
        let raw: RawPreciseEstimate = self
            .bounded(async {
                self.provider
                    .raw_request::<_, RawPreciseEstimate>(
                        Cow::Borrowed(PRECISE_ESTIMATE_METHOD),
                        (request,),
                    )
                    .await
            })
            .await?;
        parse_precise(raw)
    }

    async fn fees_per_gas(&self) -> LedgerResult<FeesPerGas> {
        let estimate = self
            .bounded(async { self.provider.estimate_eip1559_fees().await })
            .await?;
        Ok(FeesPerGas {
            max_fee_per_gas: estimate.max_fee_per_gas,
            max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
        })
    }

    async fn send_raw(&self, raw: Bytes) -> LedgerResult<TxHash> {
        let pending = self
            .bounded(async { self.provider.send_raw_transaction(&raw).await })
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn receipt_status(&self, hash: TxHash) -> LedgerResult<Option<ReceiptStatus>> {
        let receipt = self
            .bounded(async { self.provider.get_transaction_receipt(hash).await })
            .await?;
        Ok(receipt.map(|r| {
            if r.status() {
                ReceiptStatus::Succeeded
            } else {
                ReceiptStatus::Reverted
            }
        }))
    }

    async fn transfer_events(
        &self,
        token: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> LedgerResult<Vec<TransferEvent>> {
        let filter = Filter::new()
            .address(token)
            .from_block(from_block)
            .to_block(to_block)
            .event_signature(Transfer::SIGNATURE_HASH)
            .topic2(recipient.into_word());

        let logs = self.bounded(async { self.provider.get_logs(&filter).await }).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            match log.log_decode::<Transfer>() {
                Ok(decoded) => {
                    let transfer = &decoded.inner.data;
                    events.push(TransferEvent {
                        block_number: log.block_number.unwrap_or(to_block),
                        tx_hash: log.transaction_hash,
                        from: transfer.from,
                        to: transfer.to,
                        value: transfer.value,
                    });
                }
                Err(e) => {
                    tracing::warn!(endpoint = %self.url, error = %e, "Skipping undecodable Transfer log");
                }
            }
        }
        Ok(events)
    }
}
