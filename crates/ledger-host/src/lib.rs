//! A minimal in-process ledger for running EVM-style contracts.
//!
//! This crate provides:
//! - An execution host with per-frame atomic rollback, delegate calls and
//!   CREATE-style deployment
//! - Namespaced contract storage
//! - Solidity ABI encoding and decoding for calls, return values and events
//! - Address utilities (EIP-55 checksums, CREATE addresses) and key-backed
//!   principals
//! - Ownable access control and an ERC-1967 transparent upgradeable proxy

pub mod abi;
pub mod account;
pub mod address;
pub mod error;
pub mod host;
pub mod log;
pub mod ownable;
pub mod proxy;
pub mod storage;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use error::Revert;
pub use host::{CallContext, Contract, Host, HostConfig, Receipt};
