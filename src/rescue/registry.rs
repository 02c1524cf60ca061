//! Completed-target registry and persistence.

use alloy::primitives::{Address, TxHash};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Evidence that a target was rescued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub attempt_id: Uuid,
    pub claim_tx: TxHash,
    pub extract_tx: TxHash,
    /// Seconds since epoch.
    pub completed_at: u64,
}

/// Targets rescued so far. Later cycles skip them.
#[derive(Debug, Clone, Default)]
pub struct CompletionRegistry {
    inner: Arc<DashMap<Address, CompletionRecord>>,
    persistence_path: Option<PathBuf>,
}

impl CompletionRegistry {
    /// Empty registry; saved to `persistence_path` on every change when set.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from `path` if it exists, otherwise start empty bound to it.
    pub fn load_from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let registry = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<Address, CompletionRecord> = serde_json::from_reader(reader)?;
            for (address, record) in map {
                registry.inner.insert(address, record);
            }
            tracing::info!(
                path = %path.display(),
                completed = registry.inner.len(),
                "Loaded completed targets"
            );
        }
        Ok(registry)
    }

    /// Write the registry to its file. No-op when in-memory only.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            let map: HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect();
            serde_json::to_writer_pretty(writer, &map)?;
        }
        Ok(())
    }

    pub fn is_completed(&self, address: &Address) -> bool {
        self.inner.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<CompletionRecord> {
        self.inner.get(address).map(|r| r.value().clone())
    }

    /// Record `address` as rescued and persist. A failed save is logged, not raised.
    pub fn mark_completed(&self, address: Address, record: CompletionRecord) {
        self.inner.insert(address, record);
        if let Err(e) = self.save_to_file() {
            tracing::error!(address = %address, error = %e, "Failed to persist completed targets");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
