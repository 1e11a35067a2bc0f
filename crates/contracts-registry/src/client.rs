//! Typed handles for driving a registry and its dependants from outside the
//! ledger.
//!
//! A handle is only an address; every method takes the [`Host`] explicitly.
//! Reads run as views from the zero address and never change state.

use std::sync::Arc;

use ledger_host::abi::{self, AbiValue};
use ledger_host::{ownable, Address, Host, Receipt, Revert};

use crate::interface::*;
use crate::registry::ContractsRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryHandle {
    address: Address,
}

impl RegistryHandle {
    /// Deploys a new registry owned by `owner`.
    pub fn deploy(host: &mut Host, owner: Address) -> Result<Self, Revert> {
        let address = host.deploy(owner, Arc::new(ContractsRegistry), &[])?;
        Ok(Self { address })
    }

    pub fn at(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn get_contract(&self, host: &mut Host, name: &str) -> Result<Address, Revert> {
        let output = self.view(host, &encode_get_contract(name))?;
        abi::decode_address(&output)
    }

    pub fn has_contract(&self, host: &mut Host, name: &str) -> Result<bool, Revert> {
        let output = self.view(host, &encode_has_contract(name))?;
        abi::decode_bool(&output)
    }

    pub fn proxy_upgrader(&self, host: &mut Host) -> Result<Address, Revert> {
        let output = self.view(host, &encode_get_proxy_upgrader())?;
        abi::decode_address(&output)
    }

    pub fn get_implementation(&self, host: &mut Host, name: &str) -> Result<Address, Revert> {
        let output = self.view(host, &encode_get_implementation(name))?;
        abi::decode_address(&output)
    }

    pub fn owner(&self, host: &mut Host) -> Result<Address, Revert> {
        let output = self.view(host, &ownable::OWNER_SELECTOR)?;
        abi::decode_address(&output)
    }

    pub fn add_contract(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        address: Address,
    ) -> Result<Receipt, Revert> {
        host.transact(from, self.address, &encode_add_contract(name, address))
    }

    pub fn add_proxy_contract(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        implementation: Address,
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_add_proxy_contract(name, implementation),
        )
    }

    /// Deploys a proxy over `implementation` and runs `data` against it
    /// during deployment.
    pub fn add_proxy_contract_and_call(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        implementation: Address,
        data: &[u8],
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_add_proxy_contract_and_call(name, implementation, data),
        )
    }

    pub fn just_add_proxy_contract(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        proxy: Address,
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_just_add_proxy_contract(name, proxy),
        )
    }

    pub fn upgrade_contract(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        implementation: Address,
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_upgrade_contract(name, implementation),
        )
    }

    pub fn upgrade_contract_and_call(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        implementation: Address,
        data: &[u8],
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_upgrade_contract_and_call(name, implementation, data),
        )
    }

    pub fn remove_contract(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
    ) -> Result<Receipt, Revert> {
        host.transact(from, self.address, &encode_remove_contract(name))
    }

    pub fn inject_dependencies(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
    ) -> Result<Receipt, Revert> {
        host.transact(from, self.address, &encode_inject_dependencies(name))
    }

    pub fn inject_dependencies_with_data(
        &self,
        host: &mut Host,
        from: Address,
        name: &str,
        data: &[u8],
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_inject_dependencies_with_data(name, data),
        )
    }

    pub fn transfer_ownership(
        &self,
        host: &mut Host,
        from: Address,
        new_owner: Address,
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &abi::encode_function_call(
                ownable::TRANSFER_OWNERSHIP_SELECTOR,
                &[AbiValue::Address(new_owner)],
            ),
        )
    }

    fn view(&self, host: &mut Host, input: &[u8]) -> Result<Vec<u8>, Revert> {
        host.view(Address::ZERO, self.address, input)
    }
}

/// Handle to any contract that serves the dependant entrypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependantHandle {
    address: Address,
}

impl DependantHandle {
    pub fn at(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn injector(&self, host: &mut Host) -> Result<Address, Revert> {
        let output = host.view(Address::ZERO, self.address, &encode_get_injector())?;
        abi::decode_address(&output)
    }

    pub fn set_dependencies(
        &self,
        host: &mut Host,
        from: Address,
        registry: Address,
        data: &[u8],
    ) -> Result<Receipt, Revert> {
        host.transact(
            from,
            self.address,
            &encode_set_dependencies(registry, data),
        )
    }

    pub fn set_injector(
        &self,
        host: &mut Host,
        from: Address,
        injector: Address,
    ) -> Result<Receipt, Revert> {
        host.transact(from, self.address, &encode_set_injector(injector))
    }
}
