//! Errors that end a single target's attempt.

use alloy::primitives::U256;
use thiserror::Error;

use crate::blockchain::{LedgerError, WalletError};
use crate::rescue::types::{AbortReason, AcceptedLegs};

/// Why one attempt stopped. None of these abort the run.
#[derive(Debug, Error)]
pub enum RescueError {
    #[error("allocation {allocation} below expected {expected}")]
    Ineligible { allocation: U256, expected: U256 },

    #[error("claim {claim} does not cover extraction gas {extraction_gas}")]
    NothingToExtract { claim: U256, extraction_gas: U256 },

    #[error("transport: {0}")]
    Transport(#[from] LedgerError),

    #[error("signing: {0}")]
    Signing(String),

    #[error("construction: {0}")]
    Construction(String),

    #[error("submission: {message}")]
    Submission { message: String, accepted: AcceptedLegs },
}

impl From<WalletError> for RescueError {
    fn from(err: WalletError) -> Self {
        RescueError::Signing(err.to_string())
    }
}

/// Result type for a rescue attempt's steps.
pub type RescueResult<T> = Result<T, RescueError>;

impl From<RescueError> for AbortReason {
    fn from(err: RescueError) -> Self {
        match err {
            RescueError::Ineligible { allocation, expected } => {
                AbortReason::Ineligible { allocation, expected }
            }
            RescueError::NothingToExtract { claim, extraction_gas } => {
                AbortReason::NothingToExtract { claim, extraction_gas }
            }
            RescueError::Transport(e) => AbortReason::Transport { message: e.to_string() },
            RescueError::Signing(message) => AbortReason::Signing { message },
            RescueError::Construction(message) => AbortReason::Construction { message },
            RescueError::Submission { message, accepted } => {
                AbortReason::Submission { message, accepted }
            }
        }
    }
}
