use alloy_primitives::{Address, Bytes, B256};
use serde::Serialize;
use sha3::{Digest, Keccak256};

/// An event emitted by a contract.
///
/// `topics[0]` is the keccak hash of the event signature; further topics hold
/// indexed parameters and `data` holds the ABI-encoded unindexed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl Log {
    pub fn topic0(&self) -> Option<B256> {
        self.topics.first().copied()
    }
}

/// Hashes an event signature such as `"ContractRemoved(string)"` into its
/// topic.
pub fn event_topic(signature: &str) -> B256 {
    B256::from_slice(&Keccak256::digest(signature.as_bytes()))
}
