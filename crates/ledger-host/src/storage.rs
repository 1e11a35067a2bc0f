//! Namespaced contract storage.
//!
//! Every contract field lives under a `(region, key)` pair instead of a
//! numbered slot, so two capabilities composed into one contract (or a proxy
//! and the implementation it delegates to) can never overlap unless they name
//! the same region. Values are 32-byte words; an absent key reads as zero and
//! writing zero deletes the key.

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{Address, B256};

/// A namespaced storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey {
    region: &'static str,
    key: Vec<u8>,
}

impl StorageKey {
    pub fn new(region: &'static str, key: impl Into<Vec<u8>>) -> Self {
        Self {
            region,
            key: key.into(),
        }
    }

    pub fn region(&self) -> &'static str {
        self.region
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

/// Storage of every account known to the host.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    accounts: HashMap<Address, BTreeMap<StorageKey, B256>>,
}

impl Storage {
    pub fn load(&self, address: Address, key: &StorageKey) -> B256 {
        self.accounts
            .get(&address)
            .and_then(|slots| slots.get(key))
            .copied()
            .unwrap_or(B256::ZERO)
    }

    /// Writes `value` and returns the word it replaced.
    pub fn store(&mut self, address: Address, key: StorageKey, value: B256) -> B256 {
        if !value.is_zero() {
            return self
                .accounts
                .entry(address)
                .or_default()
                .insert(key, value)
                .unwrap_or(B256::ZERO);
        }

        let Some(slots) = self.accounts.get_mut(&address) else {
            return B256::ZERO;
        };
        let previous = slots.remove(&key).unwrap_or(B256::ZERO);
        if slots.is_empty() {
            self.accounts.remove(&address);
        }
        previous
    }

    pub fn load_address(&self, address: Address, key: &StorageKey) -> Address {
        Address::from_word(self.load(address, key))
    }

    pub fn store_address(&mut self, address: Address, key: StorageKey, value: Address) {
        self.store(address, key, value.into_word());
    }

    pub fn load_bool(&self, address: Address, key: &StorageKey) -> bool {
        !self.load(address, key).is_zero()
    }

    pub fn store_bool(&mut self, address: Address, key: StorageKey, value: bool) {
        let word = if value {
            B256::with_last_byte(1)
        } else {
            B256::ZERO
        };
        self.store(address, key, word);
    }

    /// Number of non-zero entries `address` holds in `region`.
    pub fn region_len(&self, address: Address, region: &str) -> usize {
        self.accounts
            .get(&address)
            .map(|slots| slots.keys().filter(|k| k.region == region).count())
            .unwrap_or(0)
    }
}
