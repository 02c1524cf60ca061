//! Airdrop rescue orchestrator.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                   AIRDROP RESCUE                     │
//!                  │                                                      │
//!   chain state    │  ┌──────────┐    ┌──────────────────────────────┐    │
//!   ───────────────┼─▶│ monitor  │───▶│     rescue::orchestrator     │    │
//!   (balance/logs) │  │poll/event│    │  per target, one at a time:  │    │
//!                  │  └──────────┘    │  eligibility → nonces/permit │    │
//!                  │                  │  → fees ×3 → plan → submit   │    │
//!                  │                  │  → reconcile → report        │    │
//!                  │                  └──────────────┬───────────────┘    │
//!                  │                                 │                    │
//!                  │                                 ▼                    │
//!   fund / claim / │                  ┌──────────────────────────────┐    │
//!   extract txs  ◀─┼──────────────────│ endpoints::pool (round-robin)│    │
//!                  │                  │  → blockchain::RpcLedger     │    │
//!                  │                  └──────────────────────────────┘    │
//!                  │                                                      │
//!                  │  config · observability · lifecycle (cross-cutting)  │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use airdrop_rescue::lifecycle::startup::{start, StartupOptions};

#[derive(Parser)]
#[command(name = "airdrop-rescue")]
#[command(about = "Rescue airdrop allocations from compromised addresses", long_about = None)]
struct Cli {
    /// Rescue configuration (TOML)
    #[arg(short, long, default_value = "rescue.toml")]
    config: PathBuf,

    /// Target identities and allocation map (TOML)
    #[arg(short, long, default_value = "targets.toml")]
    targets: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    start(StartupOptions {
        config_path: cli.config,
        targets_path: cli.targets,
    })
    .await?;
    Ok(())
}
