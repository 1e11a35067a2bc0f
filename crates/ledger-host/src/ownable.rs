//! Single-owner access control.
//!
//! A contract opts in by calling [`initialize`] from its constructor, guarding
//! privileged entrypoints with [`only_owner`] and routing calls through
//! [`dispatch`] to expose `owner()`, `transferOwnership(address)` and
//! `renounceOwnership()`.

use alloy_primitives::Address;

use crate::abi::{self, AbiValue, Decoder};
use crate::error::Revert;
use crate::host::CallContext;
use crate::log::event_topic;
use crate::storage::StorageKey;

/// Function selector for `owner()`: `0x8da5cb5b`.
pub const OWNER_SELECTOR: [u8; 4] = [0x8d, 0xa5, 0xcb, 0x5b];

/// Function selector for `transferOwnership(address)`: `0xf2fde38b`.
pub const TRANSFER_OWNERSHIP_SELECTOR: [u8; 4] = [0xf2, 0xfd, 0xe3, 0x8b];

/// Function selector for `renounceOwnership()`: `0x715018a6`.
pub const RENOUNCE_OWNERSHIP_SELECTOR: [u8; 4] = [0x71, 0x50, 0x18, 0xa6];

pub const OWNERSHIP_TRANSFERRED_EVENT: &str = "OwnershipTransferred(address,address)";

const REGION: &str = "ownable";

fn owner_key() -> StorageKey {
    StorageKey::new(REGION, "owner")
}

pub fn owner(ctx: &CallContext<'_>) -> Address {
    ctx.load_address(&owner_key())
}

/// Sets the first owner. Fails if an owner is already set.
pub fn initialize(ctx: &mut CallContext<'_>, initial_owner: Address) -> Result<(), Revert> {
    if !owner(ctx).is_zero() {
        return Err(Revert::InvalidState("owner already initialized".into()));
    }
    if initial_owner.is_zero() {
        return Err(Revert::InvalidArgument("owner is the zero address".into()));
    }

    set_owner(ctx, initial_owner);
    Ok(())
}

pub fn only_owner(ctx: &CallContext<'_>) -> Result<(), Revert> {
    let owner = owner(ctx);
    if owner.is_zero() || ctx.caller() != owner {
        return Err(Revert::Unauthorized(format!(
            "caller {} is not the owner",
            ctx.caller()
        )));
    }
    Ok(())
}

/// Handles the ownership entrypoints. Returns `None` for any other selector.
pub fn dispatch(
    ctx: &mut CallContext<'_>,
    selector: [u8; 4],
    args: &[u8],
) -> Option<Result<Vec<u8>, Revert>> {
    let result = match selector {
        OWNER_SELECTOR => Ok(abi::encode(&[AbiValue::Address(owner(ctx))])),
        TRANSFER_OWNERSHIP_SELECTOR => transfer_ownership(ctx, args),
        RENOUNCE_OWNERSHIP_SELECTOR => only_owner(ctx).map(|()| {
            set_owner(ctx, Address::ZERO);
            Vec::new()
        }),
        _ => return None,
    };
    Some(result)
}

fn transfer_ownership(ctx: &mut CallContext<'_>, args: &[u8]) -> Result<Vec<u8>, Revert> {
    only_owner(ctx)?;

    let new_owner = Decoder::new(args).address()?;
    if new_owner.is_zero() {
        return Err(Revert::InvalidArgument("new owner is the zero address".into()));
    }

    set_owner(ctx, new_owner);
    Ok(Vec::new())
}

fn set_owner(ctx: &mut CallContext<'_>, new_owner: Address) {
    let previous = owner(ctx);
    ctx.store_address(owner_key(), new_owner);
    ctx.emit(
        vec![
            event_topic(OWNERSHIP_TRANSFERRED_EVENT),
            previous.into_word(),
            new_owner.into_word(),
        ],
        Vec::new(),
    );
}
