//! Externally owned principals.
//!
//! The host never verifies signatures, but principals are still derived from
//! real secp256k1 keys so addresses match what a wallet would produce for the
//! same key. Only the address is kept; key material is scrubbed as soon as the
//! address is known.

use alloy_primitives::Address;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::address::pubkey_to_address;
use crate::error::LedgerError;

/// Domain separator for deterministic development keys.
const DEV_KEY_DOMAIN: &[u8] = b"ledger-host.dev-account";

/// A principal derived from a secp256k1 secret key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    address: Address,
}

impl Account {
    /// Builds an account from a raw 32-byte private key.
    pub fn from_private_key(private_key: &[u8; 32]) -> Result<Self, LedgerError> {
        let secret = SecretKey::from_bytes(private_key.into())
            .map_err(|e| LedgerError::InvalidPrivateKey(e.to_string()))?;

        let uncompressed = secret.public_key().to_encoded_point(false);
        let mut key_65 = [0u8; 65];
        key_65.copy_from_slice(uncompressed.as_bytes());

        Ok(Self {
            address: pubkey_to_address(&key_65)?,
        })
    }

    /// Deterministic development account number `index`.
    ///
    /// The same index always yields the same key, so tests and manifests can
    /// name principals without shipping key material.
    pub fn dev(index: u32) -> Self {
        let mut digest = Keccak256::new()
            .chain_update(DEV_KEY_DOMAIN)
            .chain_update(index.to_be_bytes())
            .finalize();

        loop {
            let mut key = [0u8; 32];
            key.copy_from_slice(&digest);
            let account = Self::from_private_key(&key);
            key.zeroize();

            match account {
                Ok(account) => return account,
                // Zero or >= the curve order: rehash.
                Err(_) => digest = Keccak256::digest(digest),
            }
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}
