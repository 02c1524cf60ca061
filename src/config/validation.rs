//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses, selectors and amounts parse
//! - Validate value ranges (timeouts > 0, multipliers >= 1)
//! - Check variant-specific requirements (permit needs token + rescue contract)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RescueConfig → Result<(), Vec<ValidationError>>
//! - Runs before any network traffic

use alloy::primitives::{Address, FixedBytes, U256};
use thiserror::Error;

use crate::config::schema::{BurstVariant, RescueConfig, TriggerMode};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("network.endpoints must not be empty")]
    NoEndpoints,

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: required for the {variant} variant")]
    MissingForVariant { field: &'static str, variant: &'static str },

    #[error("contracts.claim_selector: expected 4 hex bytes, got '{0}'")]
    InvalidSelector(String),

    #[error("{field}: invalid amount '{value}'")]
    InvalidAmount { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("{field} must be >= 1.0, got {value}")]
    MultiplierTooLow { field: &'static str, value: f64 },
}

pub fn parse_address(field: &'static str, value: &str) -> Result<Address, ValidationError> {
    value.trim().parse().map_err(|_| ValidationError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

pub fn parse_amount(field: &'static str, value: &str) -> Result<U256, ValidationError> {
    U256::from_str_radix(value.trim(), 10).map_err(|_| ValidationError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

pub fn parse_selector(value: &str) -> Result<FixedBytes<4>, ValidationError> {
    value
        .trim()
        .parse::<FixedBytes<4>>()
        .map_err(|_| ValidationError::InvalidSelector(value.to_string()))
}

/// Validate `config`, collecting every problem found.
pub fn validate_config(config: &RescueConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    for url in &config.network.endpoints {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: "network.endpoints",
                value: url.clone(),
            });
        }
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("network.rpc_timeout_secs"));
    }

    if let Err(e) = parse_address("contracts.airdrop", &config.contracts.airdrop) {
        errors.push(e);
    }
    if let Err(e) = parse_selector(&config.contracts.claim_selector) {
        errors.push(e);
    }

    let needs_token = config.burst.variant == BurstVariant::Permit
        || config.trigger.mode == TriggerMode::Event;
    match (&config.contracts.token, needs_token) {
        (Some(token), _) => {
            if let Err(e) = parse_address("contracts.token", token) {
                errors.push(e);
            }
        }
        (None, true) => errors.push(ValidationError::MissingForVariant {
            field: "contracts.token",
            variant: if config.burst.variant == BurstVariant::Permit { "permit" } else { "event trigger" },
        }),
        (None, false) => {}
    }

    if config.burst.variant == BurstVariant::Permit {
        match &config.contracts.rescue {
            Some(rescue) => {
                if let Err(e) = parse_address("contracts.rescue", rescue) {
                    errors.push(e);
                }
            }
            None => errors.push(ValidationError::MissingForVariant {
                field: "contracts.rescue",
                variant: "permit",
            }),
        }
        if config.contracts.permit_domain_name.is_empty() {
            errors.push(ValidationError::MissingForVariant {
                field: "contracts.permit_domain_name",
                variant: "permit",
            });
        }
        if config.burst.permit_deadline_secs == 0 {
            errors.push(ValidationError::ZeroValue("burst.permit_deadline_secs"));
        }
    }

    for (field, value) in [
        ("fees.base_multiplier", config.fees.base_multiplier),
        ("fees.priority_multiplier", config.fees.priority_multiplier),
    ] {
        if !(value >= 1.0) {
            errors.push(ValidationError::MultiplierTooLow { field, value });
        }
    }
    for (field, value) in [
        ("fees.fund_gas_limit", config.fees.fund_gas_limit),
        ("fees.claim_gas_limit", config.fees.claim_gas_limit),
        ("fees.extract_gas_limit", config.fees.extract_gas_limit.unwrap_or(1)),
        ("burst.settlement_timeout_secs", config.burst.settlement_timeout_secs),
        ("burst.receipt_poll_ms", config.burst.receipt_poll_ms),
        ("trigger.poll_interval_ms", config.trigger.poll_interval_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }

    if let Err(e) = parse_amount("trigger.balance_threshold", &config.trigger.balance_threshold) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
