//! Signing identities.
//!
//! # Security
//! - The relayer key is loaded ONLY from an environment variable
//! - Keys are never logged or serialized

use alloy::consensus::TxEip1559;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};

use crate::blockchain::types::WalletError;

/// Environment variable holding the relayer private key.
pub const RELAYER_KEY_ENV_VAR: &str = "RESCUE_RELAYER_PRIVATE_KEY";

/// A local signing identity bound to one chain.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// Accepts keys with or without the `0x` prefix.
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> Result<Self, WalletError> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| WalletError::InvalidKey(format!("{}", e)))?;

        Ok(Self { signer, chain_id })
    }

    /// Load the relayer wallet from `RESCUE_RELAYER_PRIVATE_KEY`.
    pub fn relayer_from_env(chain_id: u64) -> Result<Self, WalletError> {
        let private_key = std::env::var(RELAYER_KEY_ENV_VAR)
            .map_err(|_| WalletError::MissingEnv(RELAYER_KEY_ENV_VAR))?;

        let wallet = Self::from_private_key(&private_key, chain_id)?;
        tracing::info!(address = %wallet.address(), chain_id, "Relayer wallet initialized");
        Ok(wallet)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a 32-byte digest (e.g. an EIP-712 signing hash).
    pub fn sign_hash(&self, hash: &B256) -> Result<Signature, WalletError> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }

    /// Sign an EIP-1559 transaction in place.
    pub fn sign_transaction(&self, tx: &mut TxEip1559) -> Result<Signature, WalletError> {
        self.signer
            .sign_transaction_sync(tx)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
