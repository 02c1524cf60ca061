//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! rescue.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → RescueConfig (validated, immutable)
//!
//! targets.toml
//!     → loader.rs (derive wallets, apply allocation map)
//!     → Vec<TargetIdentity> (immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload mid-rescue
//! - All fields have defaults to allow minimal configs
//! - Secrets are not part of the config file

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    BurstConfig, BurstVariant, ContractsConfig, FeeConfig, NetworkConfig, ObservabilityConfig,
    RescueConfig, StateConfig, TriggerConfig, TriggerMode,
};
