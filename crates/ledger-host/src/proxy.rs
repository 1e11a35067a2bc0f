//! Transparent upgradeable proxy, following [ERC-1967] storage conventions.
//!
//! Every call from a non-admin is delegated to the current implementation, so
//! the implementation's code runs against the proxy's storage. Calls from the
//! admin never reach the implementation; the admin can only query and swap it.
//!
//! [ERC-1967]: https://eips.ethereum.org/EIPS/eip-1967

use alloy_primitives::Address;

use crate::abi::{self, AbiValue, Decoder};
use crate::error::Revert;
use crate::host::{CallContext, Contract};
use crate::log::event_topic;
use crate::storage::StorageKey;

/// Function selector for `implementation()`: `0x5c60da1b`.
pub const IMPLEMENTATION_SELECTOR: [u8; 4] = [0x5c, 0x60, 0xda, 0x1b];

/// Function selector for `admin()`: `0xf851a440`.
pub const ADMIN_SELECTOR: [u8; 4] = [0xf8, 0x51, 0xa4, 0x40];

/// Function selector for `upgradeTo(address)`: `0x3659cfe6`.
pub const UPGRADE_TO_SELECTOR: [u8; 4] = [0x36, 0x59, 0xcf, 0xe6];

/// Function selector for `upgradeToAndCall(address,bytes)`: `0x4f1ef286`.
pub const UPGRADE_TO_AND_CALL_SELECTOR: [u8; 4] = [0x4f, 0x1e, 0xf2, 0x86];

/// Function selector for `changeAdmin(address)`: `0x8f283970`.
pub const CHANGE_ADMIN_SELECTOR: [u8; 4] = [0x8f, 0x28, 0x39, 0x70];

pub const UPGRADED_EVENT: &str = "Upgraded(address)";
pub const ADMIN_CHANGED_EVENT: &str = "AdminChanged(address,address)";

const REGION: &str = "eip1967.proxy";

fn implementation_key() -> StorageKey {
    StorageKey::new(REGION, "implementation")
}

fn admin_key() -> StorageKey {
    StorageKey::new(REGION, "admin")
}

/// Encodes the constructor arguments `(logic, admin, data)`.
///
/// A non-empty `data` is delegate-called on `logic` during deployment.
pub fn constructor_args(logic: Address, admin: Address, data: &[u8]) -> Vec<u8> {
    abi::encode(&[
        AbiValue::Address(logic),
        AbiValue::Address(admin),
        AbiValue::Bytes(data.to_vec()),
    ])
}

/// Encodes `upgradeTo(address)`.
pub fn encode_upgrade_to(implementation: Address) -> Vec<u8> {
    abi::encode_function_call(UPGRADE_TO_SELECTOR, &[AbiValue::Address(implementation)])
}

/// Encodes `upgradeToAndCall(address,bytes)`.
pub fn encode_upgrade_to_and_call(implementation: Address, data: &[u8]) -> Vec<u8> {
    abi::encode_function_call(
        UPGRADE_TO_AND_CALL_SELECTOR,
        &[AbiValue::Address(implementation), AbiValue::Bytes(data.to_vec())],
    )
}

/// Encodes `changeAdmin(address)`.
pub fn encode_change_admin(new_admin: Address) -> Vec<u8> {
    abi::encode_function_call(CHANGE_ADMIN_SELECTOR, &[AbiValue::Address(new_admin)])
}

/// Proxy code. Deploy it with [`constructor_args`].
pub struct TransparentProxy;

impl Contract for TransparentProxy {
    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let mut args = Decoder::new(args);
        let logic = args.address()?;
        let admin = args.address()?;
        let data = args.bytes()?;

        upgrade_to_and_call(ctx, logic, &data)?;
        change_admin(ctx, admin)
    }

    fn call(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        if ctx.caller() == ctx.load_address(&admin_key()) {
            return admin_call(ctx, input);
        }

        let implementation = ctx.load_address(&implementation_key());
        ctx.delegate_call(implementation, input)
    }
}

fn admin_call(ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
    let (selector, args) = abi::split_selector(input)?;
    let mut args = Decoder::new(args);

    match selector {
        IMPLEMENTATION_SELECTOR => Ok(abi::encode(&[AbiValue::Address(
            ctx.load_address(&implementation_key()),
        )])),
        ADMIN_SELECTOR => Ok(abi::encode(&[AbiValue::Address(
            ctx.load_address(&admin_key()),
        )])),
        UPGRADE_TO_SELECTOR => {
            let implementation = args.address()?;
            upgrade_to_and_call(ctx, implementation, &[])?;
            Ok(Vec::new())
        }
        UPGRADE_TO_AND_CALL_SELECTOR => {
            let implementation = args.address()?;
            let data = args.bytes()?;
            upgrade_to_and_call(ctx, implementation, &data)?;
            Ok(Vec::new())
        }
        CHANGE_ADMIN_SELECTOR => {
            let new_admin = args.address()?;
            change_admin(ctx, new_admin)?;
            Ok(Vec::new())
        }
        _ => Err(Revert::Unauthorized(
            "admin cannot fallback to proxy target".into(),
        )),
    }
}

fn upgrade_to_and_call(
    ctx: &mut CallContext<'_>,
    implementation: Address,
    data: &[u8],
) -> Result<(), Revert> {
    if !ctx.has_code(implementation) {
        return Err(Revert::InvalidArgument(format!(
            "new implementation {implementation} is not a contract"
        )));
    }

    ctx.store_address(implementation_key(), implementation);
    ctx.emit(
        vec![event_topic(UPGRADED_EVENT), implementation.into_word()],
        Vec::new(),
    );

    if !data.is_empty() {
        ctx.delegate_call(implementation, data)?;
    }
    Ok(())
}

fn change_admin(ctx: &mut CallContext<'_>, new_admin: Address) -> Result<(), Revert> {
    if new_admin.is_zero() {
        return Err(Revert::InvalidArgument("new admin is the zero address".into()));
    }

    let previous = ctx.load_address(&admin_key());
    ctx.store_address(admin_key(), new_admin);
    ctx.emit(
        vec![event_topic(ADMIN_CHANGED_EVENT)],
        abi::encode(&[AbiValue::Address(previous), AbiValue::Address(new_admin)]),
    );
    Ok(())
}
