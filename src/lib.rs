//! Airdrop rescue: atomic multi-party transaction bursts that move allocations
//! out of compromised addresses before a sweeper can.

pub mod blockchain;
pub mod config;
pub mod endpoints;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod rescue;

pub use config::schema::RescueConfig;
pub use endpoints::EndpointPool;
pub use lifecycle::Shutdown;
pub use rescue::{Orchestrator, RescueReport};
