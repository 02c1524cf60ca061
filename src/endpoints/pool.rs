//! Round-robin RPC endpoint pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::blockchain::{Ledger, LedgerError, LedgerResult, RpcLedger};
use crate::config::NetworkConfig;
use crate::observability::metrics;

/// Ordered endpoints plus the one currently bound.
///
/// Rotation is pure round-robin: `(current + 1) mod len`, no backoff and no
/// health scoring. Callers hold the returned `Arc` for the duration of one
/// operation; a rotation only affects operations started afterwards.
#[derive(Debug)]
pub struct EndpointPool<L> {
    clients: Vec<Arc<L>>,
    current: AtomicUsize,
    rotations: AtomicUsize,
}

impl<L: Ledger> EndpointPool<L> {
    /// Build a pool starting at index 0. An empty list is rejected.
    pub fn new(clients: Vec<L>) -> LedgerResult<Self> {
        if clients.is_empty() {
            return Err(LedgerError::permanent("endpoint pool needs at least one endpoint"));
        }
        Ok(Self {
            clients: clients.into_iter().map(Arc::new).collect(),
            current: AtomicUsize::new(0),
            rotations: AtomicUsize::new(0),
        })
    }

    /// The currently bound client.
    pub fn active(&self) -> Arc<L> {
        let index = self.current.load(Ordering::SeqCst);
        self.clients[index].clone()
    }

    pub fn active_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Number of rotations since creation.
    pub fn rotations(&self) -> usize {
        self.rotations.load(Ordering::SeqCst)
    }

    /// Advance to the next endpoint and return the newly bound client.
    pub fn rotate(&self) -> Arc<L> {
        let len = self.clients.len();
        let previous = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_default();
        self.rotated(previous)
    }

    /// Rotate away from `index`, unless another caller already moved off it.
    ///
    /// Concurrent operations that failed on the same endpoint rotate once, not
    /// once each.
    pub fn rotate_from(&self, index: usize) -> Option<Arc<L>> {
        let next = (index + 1) % self.clients.len();
        self.current
            .compare_exchange(index, next, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|previous| self.rotated(previous))
    }

    fn rotated(&self, previous: usize) -> Arc<L> {
        let next = (previous + 1) % self.clients.len();
        self.rotations.fetch_add(1, Ordering::SeqCst);

        let client = self.clients[next].clone();
        tracing::warn!(
            from = %self.clients[previous].endpoint(),
            to = %client.endpoint(),
            index = next,
            "Rotated RPC endpoint"
        );
        metrics::record_rotation(next);
        client
    }

    /// Rotate if `err` is an endpoint fault. Returns whether a rotation happened.
    pub fn note_failure(&self, err: &LedgerError) -> bool {
        if err.rotates_endpoint() {
            self.rotate();
            true
        } else {
            false
        }
    }

    /// [`note_failure`](Self::note_failure) for an error seen on the client at `index`.
    pub fn note_failure_at(&self, index: usize, err: &LedgerError) -> bool {
        err.rotates_endpoint() && self.rotate_from(index).is_some()
    }
}

impl EndpointPool<RpcLedger> {
    /// Bind one JSON-RPC client per configured endpoint.
    pub fn connect(config: &NetworkConfig) -> LedgerResult<Self> {
        let clients = config
            .endpoints
            .iter()
            .map(|url| RpcLedger::connect(url, config.rpc_timeout_secs))
            .collect::<LedgerResult<Vec<_>>>()?;
        tracing::info!(endpoints = clients.len(), "Endpoint pool initialized");
        Self::new(clients)
    }
}
