use alloy_primitives::Address;
use alloy_rlp::{Encodable, RlpEncodable};
use sha3::{Digest, Keccak256};

use crate::error::LedgerError;

/// RLP payload hashed to derive a CREATE address: `rlp([deployer, nonce])`.
#[derive(RlpEncodable)]
struct CreateSeed {
    deployer: [u8; 20],
    nonce: u64,
}

/// Derives the address of a contract created by `deployer` at `nonce`.
///
/// This is the CREATE rule: the last 20 bytes of
/// `keccak256(rlp([deployer, nonce]))`.
pub fn contract_address(deployer: Address, nonce: u64) -> Address {
    let mut raw = [0u8; 20];
    raw.copy_from_slice(deployer.as_slice());

    let seed = CreateSeed {
        deployer: raw,
        nonce,
    };
    let mut rlp_buf = Vec::with_capacity(seed.length());
    seed.encode(&mut rlp_buf);

    let hash = Keccak256::digest(&rlp_buf);
    Address::from_slice(&hash[12..])
}

/// Derives the address of an uncompressed secp256k1 public key (65 bytes,
/// starting with 0x04).
///
/// The derivation takes the Keccak-256 hash of the 64-byte public key (without
/// the 0x04 prefix) and uses the last 20 bytes as the address.
pub fn pubkey_to_address(uncompressed_pubkey: &[u8; 65]) -> Result<Address, LedgerError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(LedgerError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// Parses a 0x-prefixed address string.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase and
/// all-uppercase input is accepted as is.
pub fn parse_address(address: &str) -> Result<Address, LedgerError> {
    if !validate_address(address)? {
        return Err(LedgerError::InvalidAddress(format!(
            "EIP-55 checksum mismatch for {address}"
        )));
    }

    let bytes = hex::decode(&address[2..])
        .map_err(|e| LedgerError::InvalidAddress(format!("invalid hex: {e}")))?;
    Ok(Address::from_slice(&bytes))
}

/// Validates an address string.
///
/// Checks that the address has the correct format (0x + 40 hex characters).
/// If the address contains mixed case, the EIP-55 checksum is verified.
pub fn validate_address(address: &str) -> Result<bool, LedgerError> {
    let hex_part = hex_part(address)?;

    // All-lowercase or all-uppercase carries no checksum.
    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    let checksummed = checksum_address(&format!("0x{}", hex_part.to_lowercase()))?;
    Ok(checksummed == address)
}

/// Applies EIP-55 mixed-case checksum encoding to an address string.
pub fn checksum_address(address: &str) -> Result<String, LedgerError> {
    let hex_part = hex_part(address)?.to_lowercase();

    // EIP-55: hash the lowercase hex address (without 0x).
    let hash = Keccak256::digest(hex_part.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in hex_part.chars().enumerate() {
        // High nibble for even positions, low nibble for odd ones.
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

/// Strips the 0x prefix and checks length and alphabet.
fn hex_part(address: &str) -> Result<&str, LedgerError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| LedgerError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(LedgerError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LedgerError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    Ok(hex_part)
}
