//! Fixture contracts shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use contracts_registry::interface::encode_get_contract;
use contracts_registry::{Dependant, Managed, RegistryHandle};
use ledger_host::abi::{self, AbiValue, Decoder};
use ledger_host::account::Account;
use ledger_host::storage::StorageKey;
use ledger_host::{Address, CallContext, Contract, Host, Revert, B256, U256};

/// Registry owner.
pub fn owner() -> Address {
    Account::dev(0).address()
}

/// Deploys fixture contracts; holds no registry rights.
pub fn deployer() -> Address {
    Account::dev(1).address()
}

pub fn stranger() -> Address {
    Account::dev(2).address()
}

const VAULT: &str = "vault";

/// Plain contract with no dependencies.
pub struct Token;

impl Contract for Token {
    fn call(&self, _ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let (selector, _) = abi::split_selector(input)?;
        if selector == abi::selector("symbol()") {
            return Ok(abi::encode(&[AbiValue::String("TKN".into())]));
        }
        Err(Revert::UnknownSelector(selector))
    }
}

/// First vault version. Pulls `Token` from the registry on injection and
/// reads an optional uint256 fee from the injection data.
pub struct VaultV1;

/// Second vault version. Same dependencies, adds `initializeV2`.
pub struct VaultV2;

fn load_u256(ctx: &CallContext<'_>, field: &'static str) -> U256 {
    U256::from_be_bytes(ctx.load(&StorageKey::new(VAULT, field)).0)
}

fn store_u256(ctx: &mut CallContext<'_>, field: &'static str, value: U256) {
    ctx.store(StorageKey::new(VAULT, field), B256::from(value.to_be_bytes::<32>()));
}

fn pull_dependencies(
    ctx: &mut CallContext<'_>,
    registry: Address,
    data: &[u8],
) -> Result<(), Revert> {
    let output = ctx.call(registry, &encode_get_contract("Token"))?;
    let token = abi::decode_address(&output)?;
    ctx.store_address(StorageKey::new(VAULT, "token"), token);

    if !data.is_empty() {
        let fee = Decoder::new(data).uint256()?;
        store_u256(ctx, "fee", fee);
    }
    Ok(())
}

fn vault_call(
    ctx: &mut CallContext<'_>,
    version: u64,
    selector: [u8; 4],
    args: &[u8],
) -> Result<Vec<u8>, Revert> {
    if selector == abi::selector("version()") {
        return Ok(abi::encode(&[AbiValue::Uint256(U256::from(version))]));
    }
    if selector == abi::selector("token()") {
        let token = ctx.load_address(&StorageKey::new(VAULT, "token"));
        return Ok(abi::encode(&[AbiValue::Address(token)]));
    }
    if selector == abi::selector("limit()") {
        return Ok(abi::encode(&[AbiValue::Uint256(load_u256(ctx, "limit"))]));
    }
    if selector == abi::selector("fee()") {
        return Ok(abi::encode(&[AbiValue::Uint256(load_u256(ctx, "fee"))]));
    }
    if selector == abi::selector("initialize(uint256)") {
        if ctx.load_bool(&StorageKey::new(VAULT, "initialized")) {
            return Err(Revert::InvalidState("already initialized".into()));
        }
        ctx.store_bool(StorageKey::new(VAULT, "initialized"), true);
        store_u256(ctx, "limit", Decoder::new(args).uint256()?);
        return Ok(Vec::new());
    }
    Err(Revert::UnknownSelector(selector))
}

impl Dependant for VaultV1 {
    fn set_dependencies(
        &self,
        ctx: &mut CallContext<'_>,
        registry: Address,
        data: &[u8],
    ) -> Result<(), Revert> {
        pull_dependencies(ctx, registry, data)
    }

    fn call(
        &self,
        ctx: &mut CallContext<'_>,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        vault_call(ctx, 1, selector, args)
    }
}

impl Dependant for VaultV2 {
    fn set_dependencies(
        &self,
        ctx: &mut CallContext<'_>,
        registry: Address,
        data: &[u8],
    ) -> Result<(), Revert> {
        pull_dependencies(ctx, registry, data)
    }

    fn call(
        &self,
        ctx: &mut CallContext<'_>,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        if selector == abi::selector("initializeV2(uint256)") {
            if ctx.load_bool(&StorageKey::new(VAULT, "initialized_v2")) {
                return Err(Revert::InvalidState("already initialized".into()));
            }
            ctx.store_bool(StorageKey::new(VAULT, "initialized_v2"), true);
            store_u256(ctx, "limit", Decoder::new(args).uint256()?);
            return Ok(Vec::new());
        }
        vault_call(ctx, 2, selector, args)
    }
}

pub fn initialize(limit: u64) -> Vec<u8> {
    abi::encode_function_call(
        abi::selector("initialize(uint256)"),
        &[AbiValue::Uint256(U256::from(limit))],
    )
}

pub fn initialize_v2(limit: u64) -> Vec<u8> {
    abi::encode_function_call(
        abi::selector("initializeV2(uint256)"),
        &[AbiValue::Uint256(U256::from(limit))],
    )
}

pub fn fee_data(fee: u64) -> Vec<u8> {
    abi::encode(&[AbiValue::Uint256(U256::from(fee))])
}

/// Reads a uint256 getter through a view from the zero address.
pub fn read_u256(host: &mut Host, target: Address, signature: &str) -> U256 {
    let output = host
        .view(Address::ZERO, target, &abi::selector(signature))
        .unwrap();
    Decoder::new(&output).uint256().unwrap()
}

pub fn read_address(host: &mut Host, target: Address, signature: &str) -> Address {
    let output = host
        .view(Address::ZERO, target, &abi::selector(signature))
        .unwrap();
    abi::decode_address(&output).unwrap()
}

pub fn hex_address(address: Address) -> String {
    format!("0x{}", hex::encode(address))
}

pub struct Fixture {
    pub host: Host,
    pub registry: RegistryHandle,
    pub token: Address,
    pub vault_v1: Address,
    pub vault_v2: Address,
}

/// A registry owned by [`owner`] plus deployed, unregistered `Token` and
/// vault implementations.
pub fn fixture() -> Fixture {
    let mut host = Host::new();
    let registry = RegistryHandle::deploy(&mut host, owner()).unwrap();
    let token = host.deploy(deployer(), Arc::new(Token), &[]).unwrap();
    let vault_v1 = host
        .deploy(deployer(), Arc::new(Managed(VaultV1)), &[])
        .unwrap();
    let vault_v2 = host
        .deploy(deployer(), Arc::new(Managed(VaultV2)), &[])
        .unwrap();

    Fixture {
        host,
        registry,
        token,
        vault_v1,
        vault_v2,
    }
}
