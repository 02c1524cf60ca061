//! On-chain interfaces the rescue talks to.

use alloy::primitives::{Bytes, U256};
use alloy::sol;

use crate::blockchain::types::{LedgerError, LedgerResult};

sol! {
    /// Airdrop contract exposing the per-account allocation.
    interface IAirdrop {
        function calculateAllocation(address account) external view returns (uint256);
    }

    /// ERC-20 token with EIP-2612 permit support.
    interface IPermitToken {
        function nonces(address owner) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }

    /// Rescue contract consuming a permit and pulling the tokens in one call.
    interface IRescue {
        function rescueWithPermit(
            address token,
            address owner,
            address recipient,
            uint256 value,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }

    #[derive(Debug)]
    event Transfer(address indexed from, address indexed to, uint256 value);

    /// EIP-2612 permit message.
    #[derive(Debug)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}

/// Decode a single `uint256` return word.
pub fn decode_uint(data: &Bytes) -> LedgerResult<U256> {
    if data.len() < 32 {
        return Err(LedgerError::permanent(format!(
            "expected 32-byte return word, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..32]))
}
