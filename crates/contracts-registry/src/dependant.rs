//! The dependant capability: a contract that accepts dependency injection
//! from a registry.
//!
//! A dependant keeps one piece of bookkeeping, the injector: the principal
//! allowed to push dependencies into it. The injector lives in its own storage
//! region, so composing the capability into a contract never touches the
//! contract's other fields (or those of a proxy in front of it).
//!
//! Binding is first-caller-wins. While the injector is zero anyone may call
//! `setDependencies` or `setInjector`; the first successful call binds the
//! injector, and from then on only the bound principal may call either. A
//! deployment that leaves a dependant unbound is open to whoever reaches it
//! first, so bind it in the same transaction that deploys it.

use ledger_host::abi::{self, AbiValue, Decoder};
use ledger_host::storage::StorageKey;
use ledger_host::{Address, CallContext, Contract, Revert};
use tracing::debug;

use crate::interface::{GET_INJECTOR_SELECTOR, SET_DEPENDENCIES_SELECTOR, SET_INJECTOR_SELECTOR};

const INJECTOR_REGION: &str = "eip6224.dependant.slot";

fn injector_key() -> StorageKey {
    StorageKey::new(INJECTOR_REGION, "injector")
}

/// Business logic of a contract that can receive injected dependencies.
///
/// Wrap an implementation in [`Managed`] to get a deployable [`Contract`]
/// that also serves `setDependencies`, `setInjector` and `getInjector`.
pub trait Dependant: Send + Sync + 'static {
    /// Pulls whatever this contract needs out of `registry` and stores it.
    ///
    /// Must be repeatable: it runs again after every upgrade or registry
    /// migration, so keep one-time initialization out of it. The injector
    /// check has already passed when this is called.
    fn set_dependencies(
        &self,
        ctx: &mut CallContext<'_>,
        registry: Address,
        data: &[u8],
    ) -> Result<(), Revert>;

    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let _ = (ctx, args);
        Ok(())
    }

    /// Handles every selector other than the dependant entrypoints.
    fn call(
        &self,
        ctx: &mut CallContext<'_>,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<u8>, Revert> {
        let _ = (ctx, args);
        Err(Revert::UnknownSelector(selector))
    }
}

/// A [`Dependant`] composed with the injector bookkeeping.
pub struct Managed<T>(pub T);

impl<T: Dependant> Contract for Managed<T> {
    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        self.0.construct(ctx, args)
    }

    fn call(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let (selector, args) = abi::split_selector(input)?;
        let mut decoder = Decoder::new(args);

        match selector {
            SET_DEPENDENCIES_SELECTOR => {
                let registry = decoder.address()?;
                let data = decoder.bytes()?;

                check_injector(ctx)?;
                self.0.set_dependencies(ctx, registry, &data)?;

                let caller = ctx.caller();
                set_injector(ctx, caller);
                debug!(dependant = %ctx.address(), %registry, "dependencies set");
                Ok(Vec::new())
            }
            SET_INJECTOR_SELECTOR => {
                let new_injector = decoder.address()?;

                check_injector(ctx)?;
                set_injector(ctx, new_injector);
                Ok(Vec::new())
            }
            GET_INJECTOR_SELECTOR => Ok(abi::encode(&[AbiValue::Address(injector(ctx))])),
            _ => self.0.call(ctx, selector, args),
        }
    }
}

/// The stored injector; zero while unbound.
pub fn injector(ctx: &CallContext<'_>) -> Address {
    ctx.load_address(&injector_key())
}

/// Permits the call if no injector is bound or the caller is the injector.
pub fn check_injector(ctx: &CallContext<'_>) -> Result<(), Revert> {
    let injector = injector(ctx);
    if injector.is_zero() || injector == ctx.caller() {
        return Ok(());
    }

    Err(Revert::Unauthorized(format!(
        "caller {} is not the injector",
        ctx.caller()
    )))
}

fn set_injector(ctx: &mut CallContext<'_>, injector: Address) {
    ctx.store_address(injector_key(), injector);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_host::Host;

    use super::*;
    use crate::interface::{encode_get_injector, encode_set_dependencies, encode_set_injector};

    const PROBE: &str = "probe";

    /// Records the registry it was given and refuses data equal to `0xff`.
    struct Probe;

    impl Dependant for Probe {
        fn set_dependencies(
            &self,
            ctx: &mut CallContext<'_>,
            registry: Address,
            data: &[u8],
        ) -> Result<(), Revert> {
            if data == [0xff] {
                return Err(Revert::InvalidArgument("probe rejects 0xff".into()));
            }
            ctx.store_address(StorageKey::new(PROBE, "registry"), registry);
            Ok(())
        }

        fn call(
            &self,
            ctx: &mut CallContext<'_>,
            selector: [u8; 4],
            _args: &[u8],
        ) -> Result<Vec<u8>, Revert> {
            if selector == abi::selector("registry()") {
                let registry = ctx.load_address(&StorageKey::new(PROBE, "registry"));
                return Ok(abi::encode(&[AbiValue::Address(registry)]));
            }
            Err(Revert::UnknownSelector(selector))
        }
    }

    fn principal(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn deploy_probe(host: &mut Host) -> Address {
        host.deploy(principal(0xde), Arc::new(Managed(Probe)), &[])
            .unwrap()
    }

    fn injector_of(host: &mut Host, dependant: Address) -> Address {
        let output = host
            .view(Address::ZERO, dependant, &encode_get_injector())
            .unwrap();
        abi::decode_address(&output).unwrap()
    }

    #[test]
    fn fresh_dependant_has_no_injector() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);

        assert!(injector_of(&mut host, probe).is_zero());
    }

    #[test]
    fn first_set_dependencies_binds_caller() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);
        let registry = principal(0x01);

        host.transact(registry, probe, &encode_set_dependencies(registry, &[]))
            .unwrap();

        assert_eq!(injector_of(&mut host, probe), registry);
        let output = host
            .view(Address::ZERO, probe, &abi::selector("registry()"))
            .unwrap();
        assert_eq!(abi::decode_address(&output).unwrap(), registry);
    }

    #[test]
    fn bound_injector_locks_out_others() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);
        let registry = principal(0x01);
        let intruder = principal(0x66);

        host.transact(registry, probe, &encode_set_dependencies(registry, &[]))
            .unwrap();

        let err = host
            .transact(intruder, probe, &encode_set_dependencies(intruder, &[]))
            .unwrap_err();
        assert!(matches!(err, Revert::Unauthorized(_)));

        let err = host
            .transact(intruder, probe, &encode_set_injector(intruder))
            .unwrap_err();
        assert!(matches!(err, Revert::Unauthorized(_)));
        assert_eq!(injector_of(&mut host, probe), registry);
    }

    #[test]
    fn first_set_injector_binds_and_rotates() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);
        let first = principal(0x01);
        let second = principal(0x02);

        // Unbound: anyone may call, and the argument is stored.
        host.transact(first, probe, &encode_set_injector(first))
            .unwrap();
        assert_eq!(injector_of(&mut host, probe), first);

        host.transact(first, probe, &encode_set_injector(second))
            .unwrap();
        assert_eq!(injector_of(&mut host, probe), second);

        assert!(host
            .transact(first, probe, &encode_set_injector(first))
            .is_err());
    }

    #[test]
    fn set_injector_to_zero_unbinds() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);
        let first = principal(0x01);

        host.transact(first, probe, &encode_set_injector(first))
            .unwrap();
        host.transact(first, probe, &encode_set_injector(Address::ZERO))
            .unwrap();

        assert!(injector_of(&mut host, probe).is_zero());
        assert!(host
            .transact(principal(0x02), probe, &encode_set_injector(principal(0x02)))
            .is_ok());
    }

    #[test]
    fn failing_hook_does_not_bind_injector() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);

        let err = host
            .transact(principal(0x01), probe, &encode_set_dependencies(principal(0x01), &[0xff]))
            .unwrap_err();

        assert!(matches!(err, Revert::InvalidArgument(_)));
        assert!(injector_of(&mut host, probe).is_zero());
    }

    #[test]
    fn other_selectors_reach_business_logic() {
        let mut host = Host::new();
        let probe = deploy_probe(&mut host);

        let err = host
            .transact(principal(0x01), probe, &abi::selector("missing()"))
            .unwrap_err();
        assert_eq!(err, Revert::UnknownSelector(abi::selector("missing()")));
    }
}
