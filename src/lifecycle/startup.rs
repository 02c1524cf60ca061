//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration and targets
//! - Initialize logging and metrics
//! - Bind the endpoint pool and check the chain id
//! - Select the extraction strategy and trigger monitor, then run it
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Chain-id mismatch only warns; the operator may be using a fork

use alloy::primitives::U256;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::{Ledger, LedgerError, Wallet, WalletError};
use crate::config::loader::{load_config, load_targets, ConfigError};
use crate::config::validation::{parse_address, parse_amount, ValidationError};
use crate::config::{BurstVariant, RescueConfig, TriggerMode};
use crate::endpoints::EndpointPool;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::monitor::{BalanceSource, EventTrigger, PollTrigger, RescueCycle};
use crate::observability::{logging, metrics};
use crate::rescue::permit::PermitDomain;
use crate::rescue::{
    CompletionRegistry, ExtractionStrategy, NativeExtraction, Orchestrator, OrchestratorSettings,
    PermitExtraction, TargetIdentity,
};

/// Fatal errors before the monitor starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("config: {0}")]
    Invalid(#[from] ValidationError),

    #[error("wallet: {0}")]
    Wallet(#[from] WalletError),

    #[error("endpoints: {0}")]
    Ledger(#[from] LedgerError),

    #[error("state file: {0}")]
    State(#[from] std::io::Error),

    #[error("targets file lists no targets")]
    NoTargets,
}

/// Paths handed over by the command line.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub config_path: PathBuf,
    pub targets_path: PathBuf,
}

/// Run the rescue until the trigger finishes or a shutdown signal arrives.
pub async fn start(options: StartupOptions) -> Result<(), StartupError> {
    let config = load_config(&options.config_path)?;
    logging::init(&config.observability);
    tracing::info!(
        config = %options.config_path.display(),
        variant = ?config.burst.variant,
        trigger = ?config.trigger.mode,
        endpoints = config.network.endpoints.len(),
        "airdrop-rescue starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let chain_id = config.network.chain_id;
    let relayer = Wallet::relayer_from_env(chain_id)?;
    let targets = load_targets(&options.targets_path, chain_id)?;
    if targets.is_empty() {
        return Err(StartupError::NoTargets);
    }

    let pool = Arc::new(EndpointPool::connect(&config.network)?);
    verify_chain_id(&pool, chain_id).await;

    let registry = match &config.state.completed_path {
        Some(path) => CompletionRegistry::load_from_file(path)?,
        None => CompletionRegistry::new(None),
    };
    let settings = OrchestratorSettings::from_config(&config)?;

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    match config.burst.variant {
        BurstVariant::Native => {
            let strategy = NativeExtraction::new(config.fees.extract_gas_limit);
            let orchestrator = Orchestrator::new(pool.clone(), relayer, strategy, settings, registry);
            run_trigger(&config, pool, &orchestrator, &targets, &shutdown).await?;
        }
        BurstVariant::Permit => {
            let strategy = permit_strategy(&config)?;
            let orchestrator = Orchestrator::new(pool.clone(), relayer, strategy, settings, registry);
            run_trigger(&config, pool, &orchestrator, &targets, &shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Permit strategy from the contracts section. Validation already ensured presence.
pub fn permit_strategy(config: &RescueConfig) -> Result<PermitExtraction, ValidationError> {
    let token = parse_address("contracts.token", config.contracts.token.as_deref().unwrap_or_default())?;
    let rescue = parse_address("contracts.rescue", config.contracts.rescue.as_deref().unwrap_or_default())?;
    let domain = PermitDomain {
        name: config.contracts.permit_domain_name.clone(),
        version: config.contracts.permit_domain_version.clone(),
        chain_id: config.network.chain_id,
        verifying_contract: token,
    };
    Ok(PermitExtraction::new(
        token,
        rescue,
        domain,
        config.burst.permit_deadline_secs,
        config.fees.extract_gas_limit,
    ))
}

async fn verify_chain_id<L: Ledger>(pool: &EndpointPool<L>, expected: u64) {
    let ledger = pool.active();
    match ledger.chain_id().await {
        Ok(actual) if actual == expected => {
            tracing::info!(chain_id = actual, endpoint = %ledger.endpoint(), "Chain id verified");
        }
        Ok(actual) => tracing::warn!(
            expected,
            actual,
            endpoint = %ledger.endpoint(),
            "Chain id mismatch"
        ),
        Err(e) => {
            tracing::warn!(endpoint = %ledger.endpoint(), error = %e, "Could not verify chain id");
            pool.note_failure(&e);
        }
    }
}

async fn run_trigger<L: Ledger, S: ExtractionStrategy>(
    config: &RescueConfig,
    pool: Arc<EndpointPool<L>>,
    orchestrator: &Orchestrator<L, S>,
    targets: &[TargetIdentity],
    shutdown: &Shutdown,
) -> Result<(), ValidationError> {
    let airdrop = parse_address("contracts.airdrop", &config.contracts.airdrop)?;
    let token = config
        .contracts
        .token
        .as_deref()
        .map(|t| parse_address("contracts.token", t))
        .transpose()?;
    let interval = Duration::from_millis(config.trigger.poll_interval_ms);
    let cycle = RescueCycle::new(orchestrator, targets);
    let mut rx = shutdown.subscribe();

    match config.trigger.mode {
        TriggerMode::Poll => {
            let threshold: U256 =
                parse_amount("trigger.balance_threshold", &config.trigger.balance_threshold)?;
            let source = token.map(BalanceSource::Token).unwrap_or(BalanceSource::Native);
            let mut trigger = PollTrigger::new(pool, airdrop, source, threshold, interval);
            if let Some(reports) = trigger.run(&cycle, &mut rx).await {
                let rescued = reports.iter().filter(|r| r.outcome_label() == "rescued").count();
                tracing::info!(reports = reports.len(), rescued, "Poll trigger done");
            }
        }
        TriggerMode::Event => {
            let token = token.ok_or(ValidationError::MissingForVariant {
                field: "contracts.token",
                variant: "event trigger",
            })?;
            let mut trigger = EventTrigger::new(
                pool,
                token,
                airdrop,
                config.trigger.confirmation_blocks,
                interval,
            )
            .with_lookback(config.trigger.lookback_blocks);
            trigger.run(&cycle, &mut rx).await;
        }
    }
    Ok(())
}
