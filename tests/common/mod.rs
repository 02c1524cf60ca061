//! Shared utilities for integration tests: a scripted in-memory ledger.

#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use airdrop_rescue::blockchain::{
    FeesPerGas, Ledger, LedgerError, LedgerResult, PreciseEstimate, ReceiptStatus, TransferEvent,
    TxDraft, Wallet,
};
use airdrop_rescue::rescue::TargetIdentity;

// Anvil's default accounts; publicly known, never hold real funds.
pub const RELAYER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TARGET_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const SECOND_TARGET_KEY: &str = "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

pub const CHAIN_ID: u64 = 59144;

pub fn relayer() -> Wallet {
    Wallet::from_private_key(RELAYER_KEY, CHAIN_ID).unwrap()
}

pub fn target(key: &str, expected: u64) -> TargetIdentity {
    TargetIdentity::new(Wallet::from_private_key(key, CHAIN_ID).unwrap(), U256::from(expected))
}

/// A transaction the mock accepted, decoded.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: TxHash,
    pub to: Address,
    pub nonce: u64,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Scripted chain state plus a record of everything asked of it.
#[derive(Debug)]
pub struct MockState {
    pub chain_id: u64,
    pub block_number: u64,
    pub balances: HashMap<Address, U256>,
    pub nonces: HashMap<Address, u64>,
    /// Keyed by `(to, calldata)`.
    pub call_responses: HashMap<(Address, Bytes), Bytes>,
    /// `None` makes the precise call fail as unsupported.
    pub precise: Option<PreciseEstimate>,
    pub fallback_fees: FeesPerGas,
    /// Receipt per destination of the sent tx. Missing means succeeded;
    /// `None` means never mined.
    pub receipts_by_to: HashMap<Address, Option<ReceiptStatus>>,
    pub events: Vec<TransferEvent>,
    /// Destination → error returned when a tx to it is sent.
    pub send_failures: HashMap<Address, LedgerError>,

    pub nonce_queries: Vec<Address>,
    pub drafts: Vec<TxDraft>,
    pub sent: Vec<SentTx>,
    pub log_ranges: Vec<(u64, u64)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            chain_id: CHAIN_ID,
            block_number: 100,
            balances: HashMap::new(),
            nonces: HashMap::new(),
            call_responses: HashMap::new(),
            precise: None,
            fallback_fees: FeesPerGas { max_fee_per_gas: 1, max_priority_fee_per_gas: 1 },
            receipts_by_to: HashMap::new(),
            events: Vec::new(),
            send_failures: HashMap::new(),
            nonce_queries: Vec::new(),
            drafts: Vec::new(),
            sent: Vec::new(),
            log_ranges: Vec::new(),
        }
    }
}

/// What one endpoint was asked, and what it refuses to answer.
#[derive(Debug, Default)]
pub struct EndpointLog {
    /// Method name → error returned on every call.
    pub failures: HashMap<&'static str, LedgerError>,
    pub calls: Vec<&'static str>,
}

/// In-memory [`Ledger`]. Clones share state, so a test keeps a handle after
/// moving one into a pool.
#[derive(Debug, Clone)]
pub struct MockLedger {
    name: String,
    state: Arc<Mutex<MockState>>,
    endpoint: Arc<Mutex<EndpointLog>>,
}

impl MockLedger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
            endpoint: Arc::new(Mutex::new(EndpointLog::default())),
        }
    }

    /// Another endpoint onto the same chain, with its own failures and call log.
    pub fn same_chain(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: self.state.clone(),
            endpoint: Arc::new(Mutex::new(EndpointLog::default())),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn respond(&self, to: Address, input: impl Into<Bytes>, output: U256) {
        self.state().call_responses.insert(
            (to, input.into()),
            Bytes::from(output.to_be_bytes::<32>().to_vec()),
        );
    }

    pub fn fail(&self, method: &'static str, err: LedgerError) {
        self.endpoint.lock().unwrap().failures.insert(method, err);
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state().sent.clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Calls of `method` made through this endpoint.
    pub fn call_count(&self, method: &str) -> usize {
        self.endpoint.lock().unwrap().calls.iter().filter(|m| **m == method).count()
    }

    fn enter(&self, method: &'static str) -> LedgerResult<MutexGuard<'_, MockState>> {
        {
            let mut endpoint = self.endpoint.lock().unwrap();
            endpoint.calls.push(method);
            if let Some(err) = endpoint.failures.get(method).cloned() {
                return Err(err);
            }
        }
        Ok(self.state())
    }
}

impl Ledger for MockLedger {
    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn chain_id(&self) -> LedgerResult<u64> {
        Ok(self.enter("chain_id")?.chain_id)
    }

    async fn block_number(&self) -> LedgerResult<u64> {
        Ok(self.enter("block_number")?.block_number)
    }

    async fn balance(&self, address: Address) -> LedgerResult<U256> {
        let state = self.enter("balance")?;
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn pending_nonce(&self, address: Address) -> LedgerResult<u64> {
        let mut state = self.enter("pending_nonce")?;
        state.nonce_queries.push(address);
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, to: Address, input: Bytes) -> LedgerResult<Bytes> {
        let state = self.enter("call")?;
        state
            .call_responses
            .get(&(to, input))
            .cloned()
            .ok_or_else(|| LedgerError::permanent("execution reverted"))
    }

    async fn estimate_precise(&self, draft: &TxDraft) -> LedgerResult<PreciseEstimate> {
        let mut state = self.enter("estimate_precise")?;
        state.drafts.push(draft.clone());
        state
            .precise
            .ok_or_else(|| LedgerError::permanent("the method linea_estimateGas does not exist"))
    }

    async fn fees_per_gas(&self) -> LedgerResult<FeesPerGas> {
        Ok(self.enter("fees_per_gas")?.fallback_fees)
    }

    async fn send_raw(&self, raw: Bytes) -> LedgerResult<TxHash> {
        let mut state = self.enter("send_raw")?;
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| LedgerError::permanent(format!("bad raw tx: {}", e)))?;
        let TxEnvelope::Eip1559(signed) = envelope else {
            return Err(LedgerError::permanent("expected an EIP-1559 transaction"));
        };
        let tx = signed.tx();
        let to = tx.to.to().copied().unwrap_or_default();
        if let Some(err) = state.send_failures.get(&to) {
            return Err(err.clone());
        }
        let hash = *signed.hash();
        state.sent.push(SentTx {
            hash,
            to,
            nonce: tx.nonce,
            value: tx.value,
            input: tx.input.clone(),
            gas_limit: tx.gas_limit,
            max_fee_per_gas: tx.max_fee_per_gas,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
        });
        Ok(hash)
    }

    async fn receipt_status(&self, hash: TxHash) -> LedgerResult<Option<ReceiptStatus>> {
        let state = self.enter("receipt_status")?;
        let Some(sent) = state.sent.iter().find(|s| s.hash == hash) else {
            return Ok(None);
        };
        Ok(match state.receipts_by_to.get(&sent.to) {
            Some(status) => *status,
            None => Some(ReceiptStatus::Succeeded),
        })
    }

    async fn transfer_events(
        &self,
        _token: Address,
        recipient: Address,
        from_block: u64,
        to_block: u64,
    ) -> LedgerResult<Vec<TransferEvent>> {
        let mut state = self.enter("transfer_events")?;
        state.log_ranges.push((from_block, to_block));
        Ok(state
            .events
            .iter()
            .filter(|e| e.to == recipient && e.block_number >= from_block && e.block_number <= to_block)
            .cloned()
            .collect())
    }
}
