//! Solidity ABI encoding for contract calls, return values and event data.
//!
//! Covers the types the registry contracts exchange: `address`, `bool`,
//! `uint256`, `bytes32`, `bytes` and `string`. Dynamic values use the standard
//! head/tail layout: the head holds a 32-byte offset into the tail, and the
//! tail holds a 32-byte length followed by the data right-padded to a word.

use alloy_primitives::{Address, B256, U256};
use sha3::{Digest, Keccak256};

use crate::error::Revert;

const WORD: usize = 32;

/// A single ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// A 20-byte address, left-padded to 32 bytes.
    Address(Address),
    Bool(bool),
    /// A 256-bit unsigned integer, big-endian.
    Uint256(U256),
    Bytes32(B256),
    /// Dynamic bytes, encoded in the tail.
    Bytes(Vec<u8>),
    /// Dynamic UTF-8 string, encoded in the tail.
    String(String),
}

/// Computes the 4-byte function selector of a canonical signature such as
/// `"addContract(string,address)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Encodes a function call: `selector || encode(params)`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiValue]) -> Vec<u8> {
    let body = encode(params);
    let mut data = Vec::with_capacity(4 + body.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&body);
    data
}

/// Encodes `params` as an ABI tuple.
pub fn encode(params: &[AbiValue]) -> Vec<u8> {
    let head_len = params.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for param in params {
        match param {
            AbiValue::Address(address) => head.extend_from_slice(address.into_word().as_slice()),
            AbiValue::Bool(value) => head.extend_from_slice(&usize_word(usize::from(*value))),
            AbiValue::Uint256(value) => head.extend_from_slice(&value.to_be_bytes::<32>()),
            AbiValue::Bytes32(value) => head.extend_from_slice(value.as_slice()),
            AbiValue::Bytes(bytes) => push_dynamic(&mut head, &mut tail, head_len, bytes),
            AbiValue::String(s) => push_dynamic(&mut head, &mut tail, head_len, s.as_bytes()),
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Splits calldata into its selector and argument block.
pub fn split_selector(input: &[u8]) -> Result<([u8; 4], &[u8]), Revert> {
    if input.len() < 4 {
        return Err(Revert::Abi(format!(
            "calldata of {} bytes has no function selector",
            input.len()
        )));
    }

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[..4]);
    Ok((selector, &input[4..]))
}

/// Decodes a return value consisting of a single address.
pub fn decode_address(data: &[u8]) -> Result<Address, Revert> {
    Decoder::new(data).address()
}

/// Decodes a return value consisting of a single bool.
pub fn decode_bool(data: &[u8]) -> Result<bool, Revert> {
    Decoder::new(data).bool()
}

/// Sequential decoder over an ABI tuple.
///
/// Each accessor consumes one head word; dynamic accessors follow the offset
/// into the tail. Offsets are relative to the start of the tuple.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn address(&mut self) -> Result<Address, Revert> {
        let word = self.next_word()?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(Revert::Abi("address word has non-zero upper bytes".into()));
        }
        Ok(Address::from_slice(&word[12..]))
    }

    pub fn bool(&mut self) -> Result<bool, Revert> {
        match word_to_usize(self.next_word()?)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Revert::Abi(format!("{other} is not a valid bool"))),
        }
    }

    pub fn uint256(&mut self) -> Result<U256, Revert> {
        Ok(U256::from_be_slice(self.next_word()?))
    }

    pub fn bytes32(&mut self) -> Result<B256, Revert> {
        Ok(B256::from_slice(self.next_word()?))
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, Revert> {
        let offset = word_to_usize(self.next_word()?)?;
        let len = word_to_usize(self.word_at(offset)?)?;

        // `word_at` succeeded, so `offset + WORD` is in bounds.
        let start = offset + WORD;
        let end = start
            .checked_add(len)
            .ok_or_else(|| Revert::Abi(format!("length {len} overflows")))?;

        self.data.get(start..end).map(<[u8]>::to_vec).ok_or_else(|| {
            Revert::Abi(format!(
                "dynamic value of {len} bytes at offset {offset} runs past the end of the input"
            ))
        })
    }

    pub fn string(&mut self) -> Result<String, Revert> {
        String::from_utf8(self.bytes()?)
            .map_err(|e| Revert::Abi(format!("string is not valid utf-8: {e}")))
    }

    fn next_word(&mut self) -> Result<&'a [u8], Revert> {
        let word = self.word_at(self.position)?;
        self.position += WORD;
        Ok(word)
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8], Revert> {
        let data = self.data;
        offset
            .checked_add(WORD)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| {
                Revert::Abi(format!(
                    "need 32 bytes at offset {offset}, input is {} bytes",
                    data.len()
                ))
            })
    }
}

fn push_dynamic(head: &mut Vec<u8>, tail: &mut Vec<u8>, head_len: usize, bytes: &[u8]) {
    head.extend_from_slice(&usize_word(head_len + tail.len()));

    tail.extend_from_slice(&usize_word(bytes.len()));
    tail.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    tail.resize(tail.len() + padding, 0);
}

fn usize_word(value: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn word_to_usize(word: &[u8]) -> Result<usize, Revert> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(Revert::Abi("offset or length does not fit in 64 bits".into()));
    }

    let mut be = [0u8; 8];
    be.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(be))
        .map_err(|_| Revert::Abi("offset or length does not fit in usize".into()))
}
