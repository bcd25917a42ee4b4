use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// EVM chain id as reported by the connected wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bridge-protocol (CCTP) domain code. Not the same numbering as [`ChainId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(pub u32);

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract addresses for one chain of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDeployment {
    pub chain_id: ChainId,
    pub name: String,
    pub domain: Domain,
    /// Stable token (USDC) on this chain.
    pub token: Address,
    /// Bridge contract exposing the lock/burn-with-hook entrypoint.
    pub bridge: Address,
    /// Contract exposing `receiveMessage(message, attestation)`.
    pub message_transmitter: Address,
}

/// Left-pads a 20-byte address into the fixed-width 32-byte form the bridge expects.
pub fn address_to_bytes32(address: Address) -> B256 {
    address.into_word()
}
