//! Configuration and target loading from disk.

use std::fs;
use std::path::Path;

use crate::blockchain::Wallet;
use crate::config::schema::{RescueConfig, TargetsFile};
use crate::config::validation::{parse_address, parse_amount, validate_config, ValidationError};
use crate::rescue::types::TargetIdentity;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Target { index: usize, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Target { index, reason } => write!(f, "Target #{}: {}", index, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RescueConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: RescueConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the targets file and derive one identity per entry.
pub fn load_targets(path: &Path, chain_id: u64) -> Result<Vec<TargetIdentity>, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let file: TargetsFile = toml::from_str(&content).map_err(ConfigError::Parse)?;
    resolve_targets(&file, chain_id)
}

/// Turn raw entries into identities, applying allocation-map overrides.
pub fn resolve_targets(file: &TargetsFile, chain_id: u64) -> Result<Vec<TargetIdentity>, ConfigError> {
    let mut overrides = std::collections::HashMap::new();
    for (address, amount) in &file.allocations {
        let address = parse_address("allocations", address)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let amount = parse_amount("allocations", amount)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        overrides.insert(address, amount);
    }

    let mut targets = Vec::with_capacity(file.targets.len());
    for (index, entry) in file.targets.iter().enumerate() {
        let wallet = Wallet::from_private_key(&entry.private_key, chain_id)
            .map_err(|e| ConfigError::Target { index, reason: e.to_string() })?;
        let expected = match overrides.get(&wallet.address()) {
            Some(amount) => *amount,
            None => parse_amount("targets.expected_amount", &entry.expected_amount)
                .map_err(|e| ConfigError::Target { index, reason: e.to_string() })?,
        };
        targets.push(TargetIdentity::new(wallet, expected));
    }

    tracing::info!(count = targets.len(), "Targets loaded");
    Ok(targets)
}
