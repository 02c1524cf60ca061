//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the rescue.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RescueConfig {
    /// RPC endpoints and chain identity.
    pub network: NetworkConfig,

    /// Contract addresses and call shapes.
    pub contracts: ContractsConfig,

    /// Fee estimation tuning.
    pub fees: FeeConfig,

    /// Burst construction and settlement.
    pub burst: BurstConfig,

    /// What starts a rescue cycle.
    pub trigger: TriggerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Persistent state.
    pub state: StateConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Ordered JSON-RPC endpoint URLs; index 0 is bound first.
    pub endpoints: Vec<String>,

    /// Chain ID (59144 for Linea mainnet).
    pub chain_id: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://localhost:8545".to_string()],
            chain_id: 59144,
            rpc_timeout_secs: 10,
        }
    }
}

/// Contract addresses. Kept as strings here; parsed during validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Airdrop contract exposing `calculateAllocation` and the claim function.
    pub airdrop: String,

    /// 4-byte claim function selector, hex.
    pub claim_selector: String,

    /// Airdropped token (permit variant, event trigger).
    pub token: Option<String>,

    /// Contract that consumes the permit and pulls the tokens (permit variant).
    pub rescue: Option<String>,

    /// EIP-712 domain name of the token.
    pub permit_domain_name: String,

    /// EIP-712 domain version of the token.
    pub permit_domain_version: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            airdrop: String::new(),
            claim_selector: "0x4e71d92d".to_string(), // claim()
            token: None,
            rescue: None,
            permit_domain_name: String::new(),
            permit_domain_version: "1".to_string(),
        }
    }
}

/// Fee estimation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Multiplier applied to the estimated base fee.
    pub base_multiplier: f64,

    /// Multiplier applied to the estimated priority fee.
    pub priority_multiplier: f64,

    /// Gas limit used for the fund-gas leg when precise estimation fails.
    pub fund_gas_limit: u64,

    /// Gas limit used for the claim leg when precise estimation fails.
    pub claim_gas_limit: u64,

    /// Gas limit used for the extract leg when precise estimation fails.
    /// Defaults per variant when unset.
    pub extract_gas_limit: Option<u64>,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            base_multiplier: 1.5,
            priority_multiplier: 1.2,
            fund_gas_limit: 21_000,
            claim_gas_limit: 200_000,
            extract_gas_limit: None,
        }
    }
}

/// Which asset the airdrop pays out, and so how it is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstVariant {
    /// Native coin: the target forwards the claimed value to the relayer.
    Native,
    /// Permit token: the relayer pulls the tokens with the target's permit.
    Permit,
}

/// Burst configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BurstConfig {
    pub variant: BurstVariant,

    /// Bound on waiting for the claim and extract receipts, in seconds.
    pub settlement_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_ms: u64,

    /// Minimum spacing between two targets' attempts, in milliseconds.
    pub target_spacing_ms: u64,

    /// Permit validity window from signing time, in seconds.
    pub permit_deadline_secs: u64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            variant: BurstVariant::Native,
            settlement_timeout_secs: 90,
            receipt_poll_ms: 500,
            target_spacing_ms: 1_000,
            permit_deadline_secs: 3_600,
        }
    }
}

/// How a rescue cycle is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Run a cycle on every `Transfer` into the airdrop contract.
    Event,
    /// Run one cycle once the airdrop balance crosses a threshold.
    Poll,
}

/// Trigger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub mode: TriggerMode,

    /// Poll mode: airdrop balance (wei or token units) that fires the cycle.
    pub balance_threshold: String,

    /// Chain poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Event mode: blocks to wait before a log batch is considered.
    pub confirmation_blocks: u64,

    /// Event mode: blocks below the first safe head scanned at startup, so a
    /// transfer that landed before a restart still fires a cycle.
    pub lookback_blocks: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Poll,
            balance_threshold: "1".to_string(),
            poll_interval_ms: 1_000,
            confirmation_blocks: 0,
            lookback_blocks: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Persistent state configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StateConfig {
    /// JSON file recording targets already rescued. In-memory only when unset.
    pub completed_path: Option<String>,
}

/// One entry of the targets file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetEntry {
    /// Hex private key of the compromised identity.
    pub private_key: String,

    /// Expected allocation in the smallest unit, decimal string.
    pub expected_amount: String,
}

/// Targets file: the compromised identities plus an optional allocation map.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TargetsFile {
    pub targets: Vec<TargetEntry>,

    /// Address → expected amount overrides, decimal strings.
    pub allocations: std::collections::HashMap<String, String>,
}
