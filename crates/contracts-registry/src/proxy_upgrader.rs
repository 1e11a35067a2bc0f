//! Holds admin rights over every proxy the registry deploys.
//!
//! The registry creates one upgrader in its constructor and becomes its
//! owner. Ownership is fixed: the upgrader exposes no way to transfer it.

use ledger_host::abi::{self, AbiValue, Decoder};
use ledger_host::{ownable, proxy, Address, CallContext, Contract, Revert};
use tracing::debug;

use crate::interface::{UPGRADER_GET_IMPLEMENTATION_SELECTOR, UPGRADER_UPGRADE_SELECTOR};

pub struct ProxyUpgrader;

impl Contract for ProxyUpgrader {
    fn construct(&self, ctx: &mut CallContext<'_>, _args: &[u8]) -> Result<(), Revert> {
        let creator = ctx.caller();
        ownable::initialize(ctx, creator)
    }

    fn call(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let (selector, args) = abi::split_selector(input)?;
        let mut args = Decoder::new(args);

        match selector {
            ownable::OWNER_SELECTOR => Ok(abi::encode(&[AbiValue::Address(ownable::owner(ctx))])),
            UPGRADER_UPGRADE_SELECTOR => {
                ownable::only_owner(ctx)?;

                let target = args.address()?;
                let implementation = args.address()?;
                let data = args.bytes()?;
                upgrade(ctx, target, implementation, &data)?;
                Ok(Vec::new())
            }
            UPGRADER_GET_IMPLEMENTATION_SELECTOR => {
                ownable::only_owner(ctx)?;

                let target = args.address()?;
                let implementation = implementation_of(ctx, target)?;
                Ok(abi::encode(&[AbiValue::Address(implementation)]))
            }
            _ => Err(Revert::UnknownSelector(selector)),
        }
    }
}

fn upgrade(
    ctx: &mut CallContext<'_>,
    target: Address,
    implementation: Address,
    data: &[u8],
) -> Result<(), Revert> {
    let call = if data.is_empty() {
        proxy::encode_upgrade_to(implementation)
    } else {
        proxy::encode_upgrade_to_and_call(implementation, data)
    };
    ctx.call(target, &call)?;

    debug!(proxy = %target, %implementation, with_call = !data.is_empty(), "proxy upgraded");
    Ok(())
}

fn implementation_of(ctx: &mut CallContext<'_>, target: Address) -> Result<Address, Revert> {
    let output = ctx
        .call(target, &proxy::IMPLEMENTATION_SELECTOR)
        .map_err(|err| Revert::ExternalCall(format!("{target} is not a proxy: {err}")))?;

    abi::decode_address(&output)
        .map_err(|err| Revert::ExternalCall(format!("{target} is not a proxy: {err}")))
}
