//! The contracts registry: a name → address book that also deploys and
//! upgrades transparent proxies and pushes dependencies into dependants.
//!
//! All mutating entrypoints are restricted to the registry owner. Proxies are
//! administered by a [`ProxyUpgrader`] the registry creates in its
//! constructor, so the registry itself can still call through its proxies.

use std::sync::Arc;

use ledger_host::abi::{self, AbiValue, Decoder};
use ledger_host::proxy::{self, TransparentProxy};
use ledger_host::storage::StorageKey;
use ledger_host::{ownable, Address, CallContext, Contract, Revert};
use tracing::info;

use crate::events::RegistryEvent;
use crate::interface::*;
use crate::proxy_upgrader::ProxyUpgrader;

const CONTRACTS_REGION: &str = "contracts_registry.contracts";
const IS_PROXY_REGION: &str = "contracts_registry.is_proxy";
const REGISTRY_REGION: &str = "contracts_registry";

fn contract_key(name: &str) -> StorageKey {
    StorageKey::new(CONTRACTS_REGION, name.as_bytes())
}

fn is_proxy_key(address: Address) -> StorageKey {
    StorageKey::new(IS_PROXY_REGION, address.as_slice())
}

fn upgrader_key() -> StorageKey {
    StorageKey::new(REGISTRY_REGION, "proxy_upgrader")
}

/// Registry code. The deployer becomes the owner.
pub struct ContractsRegistry;

impl Contract for ContractsRegistry {
    fn construct(&self, ctx: &mut CallContext<'_>, _args: &[u8]) -> Result<(), Revert> {
        let deployer = ctx.caller();
        ownable::initialize(ctx, deployer)?;

        let upgrader = ctx.create(Arc::new(ProxyUpgrader), &[])?;
        ctx.store_address(upgrader_key(), upgrader);

        info!(registry = %ctx.address(), owner = %deployer, %upgrader, "registry deployed");
        Ok(())
    }

    fn call(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let (selector, args) = abi::split_selector(input)?;
        if let Some(result) = ownable::dispatch(ctx, selector, args) {
            return result;
        }

        let mut args = Decoder::new(args);
        match selector {
            GET_CONTRACT_SELECTOR => {
                let address = get_contract(ctx, &args.string()?)?;
                Ok(abi::encode(&[AbiValue::Address(address)]))
            }
            HAS_CONTRACT_SELECTOR => {
                let present = !lookup(ctx, &args.string()?).is_zero();
                Ok(abi::encode(&[AbiValue::Bool(present)]))
            }
            GET_PROXY_UPGRADER_SELECTOR => {
                Ok(abi::encode(&[AbiValue::Address(proxy_upgrader(ctx))]))
            }
            GET_IMPLEMENTATION_SELECTOR => {
                let name = args.string()?;
                let address = get_contract(ctx, &name)?;
                require_proxy(ctx, &name, address)?;

                let implementation = implementation_of(ctx, address)?;
                Ok(abi::encode(&[AbiValue::Address(implementation)]))
            }
            INJECT_DEPENDENCIES_SELECTOR => {
                let name = args.string()?;
                inject_dependencies(ctx, &name, &[])
            }
            INJECT_DEPENDENCIES_WITH_DATA_SELECTOR => {
                let name = args.string()?;
                let data = args.bytes()?;
                inject_dependencies(ctx, &name, &data)
            }
            UPGRADE_CONTRACT_SELECTOR => {
                let name = args.string()?;
                let implementation = args.address()?;
                upgrade_contract(ctx, &name, implementation, &[])
            }
            UPGRADE_CONTRACT_AND_CALL_SELECTOR => {
                let name = args.string()?;
                let implementation = args.address()?;
                let data = args.bytes()?;
                upgrade_contract(ctx, &name, implementation, &data)
            }
            ADD_CONTRACT_SELECTOR => {
                let name = args.string()?;
                let address = args.address()?;
                add_contract(ctx, name, address)
            }
            ADD_PROXY_CONTRACT_SELECTOR => {
                let name = args.string()?;
                let implementation = args.address()?;
                add_proxy_contract(ctx, name, implementation, &[])
            }
            ADD_PROXY_CONTRACT_AND_CALL_SELECTOR => {
                let name = args.string()?;
                let implementation = args.address()?;
                let data = args.bytes()?;
                add_proxy_contract(ctx, name, implementation, &data)
            }
            JUST_ADD_PROXY_CONTRACT_SELECTOR => {
                let name = args.string()?;
                let address = args.address()?;
                just_add_proxy_contract(ctx, name, address)
            }
            REMOVE_CONTRACT_SELECTOR => {
                let name = args.string()?;
                remove_contract(ctx, name)
            }
            _ => Err(Revert::UnknownSelector(selector)),
        }
    }
}

fn lookup(ctx: &CallContext<'_>, name: &str) -> Address {
    ctx.load_address(&contract_key(name))
}

fn get_contract(ctx: &CallContext<'_>, name: &str) -> Result<Address, Revert> {
    let address = lookup(ctx, name);
    if address.is_zero() {
        return Err(Revert::NotFound(format!("no contract registered as {name:?}")));
    }
    Ok(address)
}

fn is_proxy(ctx: &CallContext<'_>, address: Address) -> bool {
    ctx.load_bool(&is_proxy_key(address))
}

fn require_proxy(ctx: &CallContext<'_>, name: &str, address: Address) -> Result<(), Revert> {
    if !is_proxy(ctx, address) {
        return Err(Revert::InvalidState(format!(
            "{name:?} at {address} is not a proxy"
        )));
    }
    Ok(())
}

fn require_nonzero(address: Address) -> Result<(), Revert> {
    if address.is_zero() {
        return Err(Revert::InvalidArgument("zero address".into()));
    }
    Ok(())
}

fn proxy_upgrader(ctx: &CallContext<'_>) -> Address {
    ctx.load_address(&upgrader_key())
}

fn implementation_of(ctx: &mut CallContext<'_>, proxy: Address) -> Result<Address, Revert> {
    let upgrader = proxy_upgrader(ctx);
    let output = ctx.call(upgrader, &encode_upgrader_get_implementation(proxy))?;
    abi::decode_address(&output)
}

fn emit(ctx: &mut CallContext<'_>, event: RegistryEvent) {
    ctx.emit(event.topics(), event.data());
}

fn inject_dependencies(
    ctx: &mut CallContext<'_>,
    name: &str,
    data: &[u8],
) -> Result<Vec<u8>, Revert> {
    ownable::only_owner(ctx)?;

    let target = get_contract(ctx, name)?;
    let registry = ctx.address();
    ctx.call(target, &encode_set_dependencies(registry, data))?;

    info!(%registry, name = %name, %target, "dependencies injected");
    Ok(Vec::new())
}

fn upgrade_contract(
    ctx: &mut CallContext<'_>,
    name: &str,
    implementation: Address,
    data: &[u8],
) -> Result<Vec<u8>, Revert> {
    ownable::only_owner(ctx)?;

    let proxy = get_contract(ctx, name)?;
    require_proxy(ctx, name, proxy)?;

    let upgrader = proxy_upgrader(ctx);
    ctx.call(upgrader, &encode_upgrader_upgrade(proxy, implementation, data))?;

    info!(registry = %ctx.address(), name = %name, %proxy, %implementation, "proxy contract upgraded");
    emit(
        ctx,
        RegistryEvent::ProxyContractUpgraded {
            name: name.to_string(),
            new_implementation: implementation,
        },
    );
    Ok(Vec::new())
}

fn add_contract(
    ctx: &mut CallContext<'_>,
    name: String,
    address: Address,
) -> Result<Vec<u8>, Revert> {
    ownable::only_owner(ctx)?;
    require_nonzero(address)?;

    ctx.store_address(contract_key(&name), address);

    info!(registry = %ctx.address(), name = %name, %address, "contract added");
    emit(
        ctx,
        RegistryEvent::ContractAdded {
            name,
            contract_address: address,
        },
    );
    Ok(Vec::new())
}

fn add_proxy_contract(
    ctx: &mut CallContext<'_>,
    name: String,
    implementation: Address,
    data: &[u8],
) -> Result<Vec<u8>, Revert> {
    ownable::only_owner(ctx)?;
    require_nonzero(implementation)?;

    let upgrader = proxy_upgrader(ctx);
    let proxy = ctx.create(
        Arc::new(TransparentProxy),
        &proxy::constructor_args(implementation, upgrader, data),
    )?;

    ctx.store_address(contract_key(&name), proxy);
    ctx.store_bool(is_proxy_key(proxy), true);

    info!(registry = %ctx.address(), name = %name, %proxy, %implementation, "proxy contract added");
    emit(
        ctx,
        RegistryEvent::ProxyContractAdded {
            name,
            contract_address: proxy,
            implementation,
        },
    );
    Ok(Vec::new())
}

fn just_add_proxy_contract(
    ctx: &mut CallContext<'_>,
    name: String,
    proxy: Address,
) -> Result<Vec<u8>, Revert> {
    ownable::only_owner(ctx)?;
    require_nonzero(proxy)?;

    ctx.store_address(contract_key(&name), proxy);
    ctx.store_bool(is_proxy_key(proxy), true);

    let implementation = implementation_of(ctx, proxy)?;

    info!(registry = %ctx.address(), name = %name, %proxy, %implementation, "existing proxy added");
    emit(
        ctx,
        RegistryEvent::ProxyContractAdded {
            name,
            contract_address: proxy,
            implementation,
        },
    );
    Ok(Vec::new())
}

fn remove_contract(ctx: &mut CallContext<'_>, name: String) -> Result<Vec<u8>, Revert> {
    ownable::only_owner(ctx)?;

    let address = get_contract(ctx, &name)?;
    ctx.store_address(contract_key(&name), Address::ZERO);
    ctx.store_bool(is_proxy_key(address), false);

    info!(registry = %ctx.address(), name = %name, %address, "contract removed");
    emit(ctx, RegistryEvent::ContractRemoved { name });
    Ok(Vec::new())
}
