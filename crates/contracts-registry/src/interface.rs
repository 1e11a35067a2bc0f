//! ABI surface of the registry, the dependant capability and the proxy
//! upgrader: selectors, event signatures and calldata encoders.

use ledger_host::abi::{encode_function_call, AbiValue};
use ledger_host::Address;

/// Function selector for `getContract(string)`: `0x35817773`.
pub const GET_CONTRACT_SELECTOR: [u8; 4] = [0x35, 0x81, 0x77, 0x73];

/// Function selector for `hasContract(string)`: `0x8c223601`.
pub const HAS_CONTRACT_SELECTOR: [u8; 4] = [0x8c, 0x22, 0x36, 0x01];

/// Function selector for `getProxyUpgrader()`: `0xd10611fc`.
pub const GET_PROXY_UPGRADER_SELECTOR: [u8; 4] = [0xd1, 0x06, 0x11, 0xfc];

/// Function selector for `getImplementation(string)`: `0x6b683896`.
pub const GET_IMPLEMENTATION_SELECTOR: [u8; 4] = [0x6b, 0x68, 0x38, 0x96];

/// Function selector for `injectDependencies(string)`: `0x1adad8cf`.
pub const INJECT_DEPENDENCIES_SELECTOR: [u8; 4] = [0x1a, 0xda, 0xd8, 0xcf];

/// Function selector for `injectDependenciesWithData(string,bytes)`: `0xbe96dc3e`.
pub const INJECT_DEPENDENCIES_WITH_DATA_SELECTOR: [u8; 4] = [0xbe, 0x96, 0xdc, 0x3e];

/// Function selector for `upgradeContract(string,address)`: `0x1271bd53`.
pub const UPGRADE_CONTRACT_SELECTOR: [u8; 4] = [0x12, 0x71, 0xbd, 0x53];

/// Function selector for `upgradeContractAndCall(string,address,bytes)`: `0x6bbe8694`.
pub const UPGRADE_CONTRACT_AND_CALL_SELECTOR: [u8; 4] = [0x6b, 0xbe, 0x86, 0x94];

/// Function selector for `addContract(string,address)`: `0xbf5b6016`.
pub const ADD_CONTRACT_SELECTOR: [u8; 4] = [0xbf, 0x5b, 0x60, 0x16];

/// Function selector for `addProxyContract(string,address)`: `0xe0e084f8`.
pub const ADD_PROXY_CONTRACT_SELECTOR: [u8; 4] = [0xe0, 0xe0, 0x84, 0xf8];

/// Function selector for `addProxyContractAndCall(string,address,bytes)`: `0x423c072b`.
pub const ADD_PROXY_CONTRACT_AND_CALL_SELECTOR: [u8; 4] = [0x42, 0x3c, 0x07, 0x2b];

/// Function selector for `justAddProxyContract(string,address)`: `0x51dad82c`.
pub const JUST_ADD_PROXY_CONTRACT_SELECTOR: [u8; 4] = [0x51, 0xda, 0xd8, 0x2c];

/// Function selector for `removeContract(string)`: `0x97623b58`.
pub const REMOVE_CONTRACT_SELECTOR: [u8; 4] = [0x97, 0x62, 0x3b, 0x58];

/// Function selector for `setDependencies(address,bytes)`: `0x69130451`.
pub const SET_DEPENDENCIES_SELECTOR: [u8; 4] = [0x69, 0x13, 0x04, 0x51];

/// Function selector for `setInjector(address)`: `0x8cb941cc`.
pub const SET_INJECTOR_SELECTOR: [u8; 4] = [0x8c, 0xb9, 0x41, 0xcc];

/// Function selector for `getInjector()`: `0x3e3b5b19`.
pub const GET_INJECTOR_SELECTOR: [u8; 4] = [0x3e, 0x3b, 0x5b, 0x19];

/// Function selector for `upgrade(address,address,bytes)`: `0xa745e3df`.
pub const UPGRADER_UPGRADE_SELECTOR: [u8; 4] = [0xa7, 0x45, 0xe3, 0xdf];

/// Function selector for `getImplementation(address)`: `0x15ac72ca`.
pub const UPGRADER_GET_IMPLEMENTATION_SELECTOR: [u8; 4] = [0x15, 0xac, 0x72, 0xca];

pub const CONTRACT_ADDED_EVENT: &str = "ContractAdded(string,address)";
pub const PROXY_CONTRACT_ADDED_EVENT: &str = "ProxyContractAdded(string,address,address)";
pub const PROXY_CONTRACT_UPGRADED_EVENT: &str = "ProxyContractUpgraded(string,address)";
pub const CONTRACT_REMOVED_EVENT: &str = "ContractRemoved(string)";

fn name_call(selector: [u8; 4], name: &str) -> Vec<u8> {
    encode_function_call(selector, &[AbiValue::String(name.into())])
}

fn name_address_call(selector: [u8; 4], name: &str, address: Address) -> Vec<u8> {
    encode_function_call(
        selector,
        &[AbiValue::String(name.into()), AbiValue::Address(address)],
    )
}

fn name_address_data_call(selector: [u8; 4], name: &str, address: Address, data: &[u8]) -> Vec<u8> {
    encode_function_call(
        selector,
        &[
            AbiValue::String(name.into()),
            AbiValue::Address(address),
            AbiValue::Bytes(data.to_vec()),
        ],
    )
}

pub fn encode_get_contract(name: &str) -> Vec<u8> {
    name_call(GET_CONTRACT_SELECTOR, name)
}

pub fn encode_has_contract(name: &str) -> Vec<u8> {
    name_call(HAS_CONTRACT_SELECTOR, name)
}

pub fn encode_get_proxy_upgrader() -> Vec<u8> {
    GET_PROXY_UPGRADER_SELECTOR.to_vec()
}

pub fn encode_get_implementation(name: &str) -> Vec<u8> {
    name_call(GET_IMPLEMENTATION_SELECTOR, name)
}

pub fn encode_inject_dependencies(name: &str) -> Vec<u8> {
    name_call(INJECT_DEPENDENCIES_SELECTOR, name)
}

pub fn encode_inject_dependencies_with_data(name: &str, data: &[u8]) -> Vec<u8> {
    encode_function_call(
        INJECT_DEPENDENCIES_WITH_DATA_SELECTOR,
        &[AbiValue::String(name.into()), AbiValue::Bytes(data.to_vec())],
    )
}

pub fn encode_upgrade_contract(name: &str, new_implementation: Address) -> Vec<u8> {
    name_address_call(UPGRADE_CONTRACT_SELECTOR, name, new_implementation)
}

pub fn encode_upgrade_contract_and_call(
    name: &str,
    new_implementation: Address,
    data: &[u8],
) -> Vec<u8> {
    name_address_data_call(UPGRADE_CONTRACT_AND_CALL_SELECTOR, name, new_implementation, data)
}

pub fn encode_add_contract(name: &str, contract_address: Address) -> Vec<u8> {
    name_address_call(ADD_CONTRACT_SELECTOR, name, contract_address)
}

pub fn encode_add_proxy_contract(name: &str, implementation: Address) -> Vec<u8> {
    name_address_call(ADD_PROXY_CONTRACT_SELECTOR, name, implementation)
}

pub fn encode_add_proxy_contract_and_call(
    name: &str,
    implementation: Address,
    data: &[u8],
) -> Vec<u8> {
    name_address_data_call(ADD_PROXY_CONTRACT_AND_CALL_SELECTOR, name, implementation, data)
}

pub fn encode_just_add_proxy_contract(name: &str, proxy: Address) -> Vec<u8> {
    name_address_call(JUST_ADD_PROXY_CONTRACT_SELECTOR, name, proxy)
}

pub fn encode_remove_contract(name: &str) -> Vec<u8> {
    name_call(REMOVE_CONTRACT_SELECTOR, name)
}

pub fn encode_set_dependencies(registry: Address, data: &[u8]) -> Vec<u8> {
    encode_function_call(
        SET_DEPENDENCIES_SELECTOR,
        &[AbiValue::Address(registry), AbiValue::Bytes(data.to_vec())],
    )
}

pub fn encode_set_injector(injector: Address) -> Vec<u8> {
    encode_function_call(SET_INJECTOR_SELECTOR, &[AbiValue::Address(injector)])
}

pub fn encode_get_injector() -> Vec<u8> {
    GET_INJECTOR_SELECTOR.to_vec()
}

pub fn encode_upgrader_upgrade(proxy: Address, implementation: Address, data: &[u8]) -> Vec<u8> {
    encode_function_call(
        UPGRADER_UPGRADE_SELECTOR,
        &[
            AbiValue::Address(proxy),
            AbiValue::Address(implementation),
            AbiValue::Bytes(data.to_vec()),
        ],
    )
}

pub fn encode_upgrader_get_implementation(proxy: Address) -> Vec<u8> {
    encode_function_call(
        UPGRADER_GET_IMPLEMENTATION_SELECTOR,
        &[AbiValue::Address(proxy)],
    )
}
